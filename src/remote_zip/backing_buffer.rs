// Copyright 2022 Google LLC

// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! A local, writable, seekable byte region the same length as the remote
//! resource. Contents of never-fetched ranges are undefined; it is the
//! stream's interval index that tracks which ranges are meaningful.
//!
//! Backed by a temp file rather than an in-memory `Vec<u8>`, since the
//! resources this crate targets (wheel files) can run into the hundreds of
//! megabytes.

use std::io::{Read, Seek, SeekFrom, Write};

use tempfile::NamedTempFile;

pub struct BackingBuffer {
    file: NamedTempFile,
    length: u64,
}

impl BackingBuffer {
    /// Create a buffer of exactly `length` bytes. Contents are unspecified
    /// until written.
    pub fn new(length: u64) -> std::io::Result<Self> {
        let file = NamedTempFile::new()?;
        file.as_file().set_len(length)?;
        Ok(Self { file, length })
    }

    pub fn len(&self) -> u64 {
        self.length
    }

    pub fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        self.file.as_file_mut().seek(pos)
    }

    pub fn tell(&mut self) -> std::io::Result<u64> {
        self.file.as_file_mut().stream_position()
    }

    pub fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        self.file.as_file_mut().read(buf)
    }

    /// Write `buf` at the current position, as used while streaming a
    /// ranged GET response into the buffer.
    pub fn write_at_cursor(&mut self, buf: &[u8]) -> std::io::Result<()> {
        self.file.as_file_mut().write_all(buf)
    }
}
