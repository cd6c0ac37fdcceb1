// Copyright 2022 Google LLC

// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A seekable, read-only stream over a remote ZIP file.
//!
//! [`LazyRemoteZipStream`] fetches only the byte ranges a ZIP
//! central-directory reader actually asks for, by issuing HTTP range
//! requests against a URL instead of downloading the whole resource. A
//! standard ZIP reader (e.g. the [`zip`] crate) can treat it exactly like a
//! local file.
//!
//! ```no_run
//! use lazy_remote_zip::{LazyRemoteZipStream, StreamOptions};
//!
//! # fn main() -> anyhow::Result<()> {
//! let mut stream = LazyRemoteZipStream::open(
//!     "https://example.com/some_package.whl",
//!     StreamOptions::default(),
//! )?;
//! let mut archive = zip::ZipArchive::new(&mut stream)?;
//! for i in 0..archive.len() {
//!     println!("{}", archive.by_index(i)?.name());
//! }
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
mod remote_zip;

pub use config::StreamOptions;
pub use error::{RangeFetchError, ZipStreamError};
pub use remote_zip::{FetchStatistics, LazyRemoteZipStream};
