// Copyright 2022 Google LLC

// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

use thiserror::Error;

/// Errors from the HTTP range protocol (the downward collaborator).
#[derive(Error, Debug)]
pub enum RangeFetchError {
    #[error("HEAD request failed")]
    Head(#[source] reqwest::Error),
    #[error("server response to HEAD did not include Content-Length")]
    NoContentLength,
    #[error("ranged GET request failed")]
    Get(#[source] reqwest::Error),
    #[error("server returned status {status} for range request")]
    Status { status: reqwest::StatusCode },
    #[error("range response body was {actual} bytes, expected {expected}")]
    ShortBody { expected: u64, actual: u64 },
    #[error("I/O error while streaming range response into backing buffer")]
    Io(#[source] std::io::Error),
}

/// Errors from the [`crate::LazyRemoteZipStream`] (the upward collaborator).
#[derive(Error, Debug)]
pub enum ZipStreamError {
    #[error("remote resource unavailable")]
    ResourceUnavailable(#[source] RangeFetchError),
    #[error("failed to fetch a required byte range")]
    FetchFailed(#[source] RangeFetchError),
    #[error("resource never validated as a ZIP file after being fetched in full")]
    NotAZip,
    #[error("operation attempted on a closed stream")]
    Closed,
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<ZipStreamError> for std::io::Error {
    fn from(err: ZipStreamError) -> Self {
        match err {
            ZipStreamError::Io(io_err) => io_err,
            ZipStreamError::Closed => {
                std::io::Error::new(std::io::ErrorKind::Other, "stream is closed")
            }
            other => std::io::Error::new(std::io::ErrorKind::Other, other.to_string()),
        }
    }
}
