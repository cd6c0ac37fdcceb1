// Copyright 2022 Google LLC

// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! Construction-time tunables for [`crate::LazyRemoteZipStream`].
//!
//! These live on [`StreamOptions`] rather than as module-level constants,
//! so that callers talking to unusual servers (small chunk sizes for
//! latency-sensitive links, a pre-configured `reqwest::blocking::Client`
//! with custom TLS or proxy settings) don't have to fork the crate.

use reqwest::blocking::Client;

/// Minimum number of bytes fetched per HTTP range request, and the minimum
/// window size used by [`crate::LazyRemoteZipStream::read`].
pub const DEFAULT_CHUNK_SIZE: u64 = 8192;

/// Construction-time options for a [`crate::LazyRemoteZipStream`].
#[derive(Clone)]
pub struct StreamOptions {
    /// Minimum number of bytes fetched per HTTP range request. Larger values
    /// mean fewer, bigger requests at the cost of fetching more unneeded
    /// data on small reads.
    pub chunk_size: u64,
    /// The HTTP client used for both the discovery `HEAD` and every ranged
    /// `GET`. Defaults to a fresh client with redirects followed and
    /// compression negotiation disabled (a compressed body would invalidate
    /// byte offsets).
    pub client: Client,
}

impl StreamOptions {
    /// Options using [`DEFAULT_CHUNK_SIZE`] and a freshly-built client.
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the chunk size.
    pub fn with_chunk_size(mut self, chunk_size: u64) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    /// Override the HTTP client, e.g. to reuse connection pooling across
    /// several streams or to configure TLS/proxy settings.
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }
}

impl Default for StreamOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            client: Client::builder()
                .build()
                .expect("default reqwest client configuration is always valid"),
        }
    }
}
