use serde::{Deserialize, Serialize};
use std::fmt;

/// Byte range in a source text, stored as start offset + length.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct Span {
    pub start: usize,
    pub len: usize,
}

impl Span {
    pub const fn new(start: usize, len: usize) -> Self {
        Self { start, len }
    }

    /// Build a span from a half-open `[start, end)` range.
    ///
    /// An inverted range collapses to an empty span at `start`.
    pub const fn from_range(start: usize, end: usize) -> Self {
        Self {
            start,
            len: end.saturating_sub(start),
        }
    }

    /// Zero-width span at `offset` (an insertion point).
    pub const fn at(offset: usize) -> Self {
        Self {
            start: offset,
            len: 0,
        }
    }

    pub const fn end(self) -> usize {
        self.start + self.len
    }

    pub const fn is_empty(self) -> bool {
        self.len == 0
    }

    /// True when `other` lies entirely within `self` (boundaries included).
    pub const fn contains(self, other: Span) -> bool {
        self.start <= other.start && other.end() <= self.end()
    }

    /// True when the two ranges share at least one byte. Empty spans never overlap.
    pub const fn overlaps(self, other: Span) -> bool {
        self.start < other.end() && other.start < self.end()
    }

    /// True when `inner` is nested inside `self` in a way that makes the two edits
    /// incompatible: contained, and not an empty insertion sitting on one of our edges.
    pub const fn encloses(self, inner: Span) -> bool {
        if !self.contains(inner) {
            return false;
        }
        if inner.is_empty() {
            return inner.start != self.start && inner.start != self.end();
        }
        true
    }

    pub fn as_range(self) -> std::ops::Range<usize> {
        self.start..self.end()
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end())
    }
}
