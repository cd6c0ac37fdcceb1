// Copyright 2022 Google LLC

// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The downward HTTP range protocol: discover a resource's length via
//! `HEAD`, then fetch byte ranges via `GET` with a `Range` header.
//!
//! Compression negotiation is suppressed (`Accept-Encoding: identity`)
//! because a compressed body would invalidate byte offsets, and range
//! responses are requested with `Cache-Control: no-cache` since
//! range-aware intermediaries can't be trusted to respect byte boundaries.

use std::io::Read;

use reqwest::blocking::Client;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT_ENCODING, CACHE_CONTROL, CONTENT_LENGTH, RANGE};

use crate::error::RangeFetchError;

fn identity_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
    headers
}

pub struct RangeClient {
    client: Client,
    url: String,
}

impl RangeClient {
    /// Issue the discovery `HEAD` request. Returns the resource's exact
    /// byte length.
    pub fn discover(client: Client, url: String) -> Result<(Self, u64), RangeFetchError> {
        let response = client
            .head(&url)
            .headers(identity_headers())
            .send()
            .map_err(RangeFetchError::Head)?;
        if !response.status().is_success() {
            return Err(RangeFetchError::Status {
                status: response.status(),
            });
        }
        let length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
            .ok_or(RangeFetchError::NoContentLength)?;
        Ok((Self { client, url }, length))
    }

    /// Fetch the inclusive byte range `[start, end]` and stream its body
    /// into `sink`. `sink` is called zero or more times with consecutive
    /// chunks of the response body; it is the caller's job to write them at
    /// the right offset in the backing buffer.
    pub fn fetch_range(
        &self,
        start: u64,
        end: u64,
        mut sink: impl FnMut(&[u8]) -> std::io::Result<()>,
    ) -> Result<(), RangeFetchError> {
        let expected = end - start + 1;
        log::debug!("Fetching range 0x{:x}-0x{:x}", start, end);
        let mut headers = identity_headers();
        headers.insert(
            RANGE,
            HeaderValue::from_str(&format!("bytes={start}-{end}"))
                .expect("range header value is always valid ASCII"),
        );
        headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

        let response = self
            .client
            .get(&self.url)
            .headers(headers)
            .send()
            .map_err(RangeFetchError::Get)?;
        if !response.status().is_success() {
            log::warn!(
                "Range request for 0x{:x}-0x{:x} failed with status {}",
                start,
                end,
                response.status()
            );
            return Err(RangeFetchError::Status {
                status: response.status(),
            });
        }

        let mut reader = response;
        let mut total = 0u64;
        let mut chunk = [0u8; 64 * 1024];
        loop {
            let n = reader.read(&mut chunk).map_err(RangeFetchError::Io)?;
            if n == 0 {
                break;
            }
            sink(&chunk[..n]).map_err(RangeFetchError::Io)?;
            total += n as u64;
        }

        if total != expected {
            log::warn!(
                "Range request for 0x{:x}-0x{:x} returned {} bytes, expected {}",
                start,
                end,
                total,
                expected
            );
            return Err(RangeFetchError::ShortBody {
                expected,
                actual: total,
            });
        }
        log::debug!("Range 0x{:x}-0x{:x} fetched, {} bytes", start, end, total);
        Ok(())
    }
}
