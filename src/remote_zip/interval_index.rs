// Copyright 2022 Google LLC

// Licensed under the Apache License, Version 2.0 <LICENSE-APACHE or
// https://www.apache.org/licenses/LICENSE-2.0> or the MIT license
// <LICENSE-MIT or https://opensource.org/licenses/MIT>, at your
// option. This file may not be copied, modified, or distributed
// except according to those terms.

//! The canonical, disjoint-and-non-adjacent set of byte ranges we've already
//! downloaded from the remote resource.
//!
//! Represented as two parallel sorted `Vec<u64>`s, `starts` and `ends`,
//! where `(starts[i], ends[i])` is the closed interval `[starts[i],
//! ends[i]]`, rather than reaching for an interval-tree crate: the only
//! operations needed are the two binary searches below plus a range splice,
//! which a sorted `Vec` does well.

/// A closed, inclusive byte range `[start, end]`.
pub type ByteRange = (u64, u64);

#[derive(Debug, Default)]
pub struct IntervalIndex {
    starts: Vec<u64>,
    ends: Vec<u64>,
}

impl IntervalIndex {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    pub fn len(&self) -> usize {
        self.starts.len()
    }

    /// The intervals currently in the index, for inspection/testing.
    pub fn intervals(&self) -> Vec<ByteRange> {
        self.starts
            .iter()
            .copied()
            .zip(self.ends.iter().copied())
            .collect()
    }

    /// Smallest index `i` such that `ends[i] >= x`, or `ends.len()` if none.
    fn floor_right(&self, x: u64) -> usize {
        self.ends.partition_point(|&e| e < x)
    }

    /// Smallest index `i` such that `starts[i] > y`, or `starts.len()` if none.
    fn ceil_left(&self, y: u64) -> usize {
        self.starts.partition_point(|&s| s <= y)
    }

    /// Returns `[left, right)`: the half-open index range of intervals that
    /// overlap or touch the closed request `[start, end]`.
    fn overlap_range(&self, start: u64, end: u64) -> (usize, usize) {
        (self.floor_right(start), self.ceil_left(end))
    }

    /// Given a request `[start, end]` not yet (fully) covered, returns the
    /// gap sub-ranges that still need to be fetched, in ascending order.
    /// Does not mutate the index; call [`IntervalIndex::merge`] after the
    /// gaps have actually been fetched.
    pub fn gaps(&self, start: u64, end: u64) -> Vec<ByteRange> {
        let (left, right) = self.overlap_range(start, end);
        let mut gaps = Vec::new();
        let mut i = match self.starts.get(left) {
            Some(&s) => start.min(s),
            None => start,
        };
        let final_end = match self.ends.get(right.saturating_sub(1)) {
            Some(&e) if right > left => end.max(e),
            _ => end,
        };
        for idx in left..right {
            let s = self.starts[idx];
            let e = self.ends[idx];
            if s > i {
                gaps.push((i, s - 1));
            }
            i = e + 1;
        }
        if i <= final_end {
            gaps.push((i, final_end));
        }
        gaps
    }

    /// Records that `[start, end]` is now fully downloaded, merging it with
    /// any intervals it touches or overlaps. Must be called with the same
    /// `(start, end)` that was passed to [`IntervalIndex::gaps`] immediately
    /// before, once every gap it reported has actually been fetched.
    pub fn merge(&mut self, start: u64, end: u64) {
        let (left, right) = self.overlap_range(start, end);
        let new_start = match self.starts.get(left) {
            Some(&s) => start.min(s),
            None => start,
        };
        let new_end = match self.ends.get(right.saturating_sub(1)) {
            Some(&e) if right > left => end.max(e),
            _ => end,
        };
        log::info!(
            "Inserting into interval index, range is 0x{:x}-0x{:x}",
            new_start,
            new_end
        );
        self.starts.splice(left..right, std::iter::once(new_start));
        self.ends.splice(left..right, std::iter::once(new_end));
    }

    /// Whether `[start, end]` is already entirely covered by one interval.
    pub fn covers(&self, start: u64, end: u64) -> bool {
        let i = self.floor_right(start);
        matches!((self.starts.get(i), self.ends.get(i)), (Some(&s), Some(&e)) if s <= start && end <= e)
    }

    /// Check the canonical-form invariants (used by tests and debug asserts):
    /// same length, `starts[i] <= ends[i]`, and intervals strictly disjoint
    /// and non-adjacent.
    #[cfg(test)]
    pub fn check_invariants(&self) {
        assert_eq!(self.starts.len(), self.ends.len());
        for i in 0..self.starts.len() {
            assert!(self.starts[i] <= self.ends[i]);
            if i + 1 < self.starts.len() {
                assert!(self.ends[i] + 1 < self.starts[i + 1]);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_into_empty() {
        let mut idx = IntervalIndex::new();
        assert_eq!(idx.gaps(10, 20), vec![(10, 20)]);
        idx.merge(10, 20);
        idx.check_invariants();
        assert_eq!(idx.intervals(), vec![(10, 20)]);
    }

    #[test]
    fn merge_adjacent_collapses() {
        let mut idx = IntervalIndex::new();
        idx.merge(0, 9);
        idx.merge(10, 19);
        idx.check_invariants();
        // adjacent (9 and 10 are consecutive) so they must collapse into one
        assert_eq!(idx.intervals(), vec![(0, 19)]);
    }

    #[test]
    fn merge_disjoint_stays_separate() {
        let mut idx = IntervalIndex::new();
        idx.merge(0, 9);
        idx.merge(11, 19);
        idx.check_invariants();
        assert_eq!(idx.intervals(), vec![(0, 9), (11, 19)]);
    }

    #[test]
    fn gaps_between_two_cached_intervals() {
        // Index = [(0, 99), (500, 599)]; request (50, 550) should only need
        // the gap between the two already-cached intervals.
        let mut idx = IntervalIndex::new();
        idx.merge(0, 99);
        idx.merge(500, 599);
        assert_eq!(idx.gaps(50, 550), vec![(100, 499)]);
        idx.merge(50, 550);
        idx.check_invariants();
        assert_eq!(idx.intervals(), vec![(0, 599)]);
    }

    #[test]
    fn idempotent_rerequest_yields_no_gaps() {
        let mut idx = IntervalIndex::new();
        idx.merge(0, 8191);
        assert_eq!(idx.gaps(100, 199), Vec::<ByteRange>::new());
        assert!(idx.covers(100, 199));
    }

    #[test]
    fn gaps_straddling_three_intervals() {
        let mut idx = IntervalIndex::new();
        idx.merge(0, 9);
        idx.merge(20, 29);
        idx.merge(40, 49);
        // Request spans all three plus the two gaps between them, and a
        // bit past the last one.
        assert_eq!(idx.gaps(5, 45), vec![(10, 19), (30, 39)]);
        idx.merge(5, 45);
        idx.check_invariants();
        assert_eq!(idx.intervals(), vec![(0, 49)]);
    }
}
