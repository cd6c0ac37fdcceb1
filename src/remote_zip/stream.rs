// Copyright 2022 Google LLC

// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The [`LazyRemoteZipStream`] itself: the upward `Read`/`Seek` contract, and
//! the bootstrap that locates a valid central directory without knowing its
//! offset in advance.

use std::io::{Read, Seek, SeekFrom};

use crate::config::StreamOptions;
use crate::error::ZipStreamError;

use super::backing_buffer::BackingBuffer;
use super::http_range_client::RangeClient;
use super::interval_index::IntervalIndex;

/// Counters describing how much work a [`LazyRemoteZipStream`] has actually
/// done against the network, useful for confirming the laziness property:
/// that a handful of small reads costs a handful of small requests, not a
/// full download.
#[derive(Debug, Clone, Default)]
pub struct FetchStatistics {
    /// Number of ranged GET requests issued.
    pub requests_issued: u64,
    /// Total bytes fetched over the wire across all requests.
    pub bytes_fetched: u64,
    /// Total bytes served out of the interval index without a network
    /// round-trip, across all `ensure_range` calls.
    pub bytes_served_from_cache: u64,
}

/// A seekable, read-only byte stream backed by an HTTP resource that
/// supports byte-range requests. Materializes only the byte ranges its
/// caller (typically a ZIP central-directory reader) actually asks for.
///
/// Single-owner: this type is `Send` but not `Sync`, and does not implement
/// `Clone`. Parallelism across many remote ZIPs is achieved by opening many
/// instances, one per URL, rather than by sharing one.
pub struct LazyRemoteZipStream {
    buffer: Option<BackingBuffer>,
    index: IntervalIndex,
    client: RangeClient,
    length: u64,
    chunk_size: u64,
    stats: FetchStatistics,
}

impl LazyRemoteZipStream {
    /// Open a lazy stream against `url`. Issues a `HEAD` to discover the
    /// resource's length, then bootstraps by locating a valid ZIP central
    /// directory (see module docs on [`LazyRemoteZipStream::bootstrap`]).
    pub fn open(url: impl Into<String>, options: StreamOptions) -> Result<Self, ZipStreamError> {
        let url = url.into();
        log::info!("Opening lazy remote zip stream for {}", url);
        let (client, length) = RangeClient::discover(options.client, url)
            .map_err(ZipStreamError::ResourceUnavailable)?;
        log::info!("create_reader: resource length is 0x{:x}", length);
        let buffer = BackingBuffer::new(length)?;
        let mut stream = Self {
            buffer: Some(buffer),
            index: IntervalIndex::new(),
            client,
            length,
            chunk_size: options.chunk_size,
            stats: FetchStatistics::default(),
        };
        stream.bootstrap()?;
        Ok(stream)
    }

    /// The resource's total byte length, fixed at construction.
    pub fn length(&self) -> u64 {
        self.length
    }

    /// The current cursor position, in `[0, length()]`.
    pub fn tell(&mut self) -> Result<u64, ZipStreamError> {
        Ok(self.buffer_mut()?.tell()?)
    }

    /// Release the backing buffer. Further operations are errors.
    pub fn close(&mut self) {
        self.buffer = None;
    }

    /// Fetch statistics accumulated so far.
    pub fn stats(&self) -> FetchStatistics {
        self.stats.clone()
    }

    /// Read the entire remainder of the stream from the current cursor,
    /// fetching it in a single request rather than the windowed chunks a
    /// bounded [`std::io::Read::read`] call would use. This is the
    /// "unbounded read" case of the stream contract.
    pub fn read_remainder(&mut self) -> Result<Vec<u8>, ZipStreamError> {
        let start = self.tell()?;
        if start >= self.length {
            return Ok(Vec::new());
        }
        let want = self.length - start;
        self.ensure_range(start, self.length - 1)?;
        let buffer = self.buffer_mut()?;
        buffer.seek(SeekFrom::Start(start))?;
        let mut out = vec![0u8; want as usize];
        let mut filled = 0usize;
        while filled < out.len() {
            let n = buffer.read(&mut out[filled..])?;
            if n == 0 {
                break;
            }
            filled += n;
        }
        out.truncate(filled);
        Ok(out)
    }

    fn buffer_mut(&mut self) -> Result<&mut BackingBuffer, ZipStreamError> {
        self.buffer.as_mut().ok_or(ZipStreamError::Closed)
    }

    /// Implements the read window policy of the stream contract: the window
    /// extends *backward* from the clamped stop point, because callers (ZIP
    /// readers scanning for a central directory) tend to issue
    /// slightly-increasing reads near the end of the file, and extending
    /// backward turns that into fewer, larger, cache-friendlier requests.
    /// This policy must not be changed to a forward-extending window.
    fn read_window(&mut self, want: u64) -> Result<usize, ZipStreamError> {
        let start = self.buffer_mut()?.tell()?;
        if start >= self.length {
            return Ok(0);
        }
        let w = want.max(self.chunk_size);
        let stop = start.saturating_add(w).min(self.length);
        let fetch_start = stop.saturating_sub(w);
        self.ensure_range(fetch_start, stop - 1)?;
        let buffer = self.buffer_mut()?;
        buffer.seek(SeekFrom::Start(start))?;
        Ok((stop - start).min(want) as usize)
    }

    /// Ensure `[start, end]` (inclusive) is present in the backing buffer,
    /// fetching only the gaps not already covered. The buffer's cursor is
    /// restored to its pre-call position once all gaps have been fetched
    /// (or as soon as one fails), so fetching is transparent to callers.
    fn ensure_range(&mut self, start: u64, end: u64) -> Result<(), ZipStreamError> {
        if self.index.covers(start, end) {
            self.stats.bytes_served_from_cache += end - start + 1;
            return Ok(());
        }
        let gaps = self.index.gaps(start, end);
        let gap_bytes: u64 = gaps.iter().map(|&(s, e)| e - s + 1).sum();

        let saved_pos = self.buffer_mut()?.tell()?;
        let result = self.fetch_gaps(&gaps);
        // Restore the cursor regardless of whether the fetch succeeded:
        // fetching must be transparent to the caller either way.
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.seek(SeekFrom::Start(saved_pos))?;
        }
        result?;

        // Only merge into the index once every gap succeeded: a partial
        // failure must leave the index exactly as it was, so a later retry
        // re-attempts the whole range.
        self.index.merge(start, end);
        self.stats.bytes_served_from_cache += (end - start + 1) - gap_bytes;
        Ok(())
    }

    fn fetch_gaps(&mut self, gaps: &[(u64, u64)]) -> Result<(), ZipStreamError> {
        let Self {
            buffer,
            client,
            stats,
            ..
        } = self;
        let buffer = buffer.as_mut().ok_or(ZipStreamError::Closed)?;
        for &(gap_start, gap_end) in gaps {
            buffer.seek(SeekFrom::Start(gap_start))?;
            client
                .fetch_range(gap_start, gap_end, |chunk| buffer.write_at_cursor(chunk))
                .map_err(ZipStreamError::FetchFailed)?;
            stats.requests_issued += 1;
            stats.bytes_fetched += gap_end - gap_start + 1;
        }
        Ok(())
    }

    /// Locate the ZIP central directory by iteratively extending a fetched
    /// trailing suffix and attempting to parse it, as described in the
    /// stream's bootstrap contract. Always attempts at least one fetch of
    /// the entire resource before giving up, even when the resource is
    /// smaller than one chunk.
    fn bootstrap(&mut self) -> Result<(), ZipStreamError> {
        if self.length == 0 {
            return Err(ZipStreamError::NotAZip);
        }
        let end = self.length - 1;

        let mut starts = Vec::new();
        let mut s = 0u64;
        while s < end {
            starts.push(s);
            s += self.chunk_size;
        }
        if starts.is_empty() {
            starts.push(0);
        }

        for &fetch_start in starts.iter().rev() {
            log::info!(
                "Bootstrap: extending fetched suffix to 0x{:x}-0x{:x}",
                fetch_start,
                end
            );
            self.ensure_range(fetch_start, end)?;
            if self.try_parse_zip() {
                log::info!("Bootstrap: central directory located");
                return Ok(());
            }
            log::debug!("Bootstrap: central directory not yet found, extending suffix further");
        }
        Err(ZipStreamError::NotAZip)
    }

    /// Attempt to construct a `zip::ZipArchive` against ourselves. Restores
    /// the cursor before returning either way.
    fn try_parse_zip(&mut self) -> bool {
        let saved = match self.tell() {
            Ok(pos) => pos,
            Err(_) => return false,
        };
        // The ZipArchive must be dropped before we can seek `self` again, so
        // collapse it to a bool within this one expression rather than
        // binding it to a name that would keep the borrow alive.
        let ok = zip::ZipArchive::new(&mut *self).is_ok();
        let _ = Seek::seek(self, SeekFrom::Start(saved));
        ok
    }
}

impl Read for LazyRemoteZipStream {
    fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        let to_read = self.read_window(buf.len() as u64)?;
        if to_read == 0 {
            return Ok(0);
        }
        let buffer = self.buffer_mut()?;
        Ok(buffer.read(&mut buf[..to_read])?)
    }
}

impl Seek for LazyRemoteZipStream {
    fn seek(&mut self, pos: SeekFrom) -> std::io::Result<u64> {
        let length = self.length;
        let buffer = self.buffer_mut()?;
        let current = buffer.tell()?;
        let new_pos = match pos {
            SeekFrom::Start(p) => p,
            SeekFrom::End(delta) => {
                if delta >= 0 {
                    length.checked_add(delta as u64)
                } else {
                    length.checked_sub(delta.unsigned_abs())
                }
                .ok_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, "seek before byte 0")
                })?
            }
            SeekFrom::Current(delta) => {
                if delta >= 0 {
                    current.checked_add(delta as u64)
                } else {
                    current.checked_sub(delta.unsigned_abs())
                }
                .ok_or_else(|| {
                    std::io::Error::new(std::io::ErrorKind::InvalidInput, "seek before byte 0")
                })?
            }
        };
        buffer.seek(SeekFrom::Start(new_pos))
    }
}
