//! Closed byte-offset intervals and their algebra.
//!
//! A [`Chunk`] names the inclusive range `[lo, hi]` of arena offsets. It never
//! points into memory itself; the arena owner resolves it against its buffer.

use std::fmt;

/// Error raised when a byte range cannot be formed or does not fit an arena.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RangeError {
    /// The lower bound lies above the upper bound.
    #[error("invalid chunk bounds: lo {lo} > hi {hi}")]
    InvalidBounds {
        /// Requested lower bound.
        lo: usize,
        /// Requested upper bound.
        hi: usize,
    },

    /// A chunk must cover at least one byte.
    #[error("chunk length must be at least one byte")]
    ZeroLength,

    /// `offset + len - 1` does not fit in `usize`.
    #[error("chunk at offset {offset} with length {len} overflows the address space")]
    Overflow {
        /// Requested start offset.
        offset: usize,
        /// Requested length.
        len: usize,
    },

    /// An arena must hold at least one byte.
    #[error("capacity must be at least one byte")]
    ZeroCapacity,

    /// The chunk reaches outside `[0, capacity-1]`.
    #[error("chunk {chunk} out of range for capacity {capacity}")]
    OutOfRange {
        /// The offending chunk.
        chunk: Chunk,
        /// Capacity of the arena it was checked against.
        capacity: usize,
    },
}

/// Immutable closed interval `[lo, hi]` of byte offsets.
///
/// Ordering is by `lo`, then `hi`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Chunk {
    lo: usize,
    hi: usize,
}

impl Chunk {
    /// Create the chunk `[lo, hi]`.
    pub fn new(lo: usize, hi: usize) -> Result<Self, RangeError> {
        if lo > hi {
            return Err(RangeError::InvalidBounds { lo, hi });
        }
        Ok(Self { lo, hi })
    }

    /// Create the chunk covering `len` bytes starting at `offset`.
    pub fn with_len(offset: usize, len: usize) -> Result<Self, RangeError> {
        if len == 0 {
            return Err(RangeError::ZeroLength);
        }
        let hi = offset
            .checked_add(len - 1)
            .ok_or(RangeError::Overflow { offset, len })?;
        Ok(Self { lo: offset, hi })
    }

    /// Bounds are validated by every caller in this crate.
    pub(crate) const fn from_bounds(lo: usize, hi: usize) -> Self {
        debug_assert!(lo <= hi);
        Self { lo, hi }
    }

    /// Lowest offset covered.
    #[must_use]
    pub const fn lo(&self) -> usize {
        self.lo
    }

    /// Highest offset covered.
    #[must_use]
    pub const fn hi(&self) -> usize {
        self.hi
    }

    /// Number of bytes covered.
    #[must_use]
    pub const fn size(&self) -> usize {
        self.hi - self.lo + 1
    }

    /// Whether `offset` lies inside this chunk.
    #[must_use]
    pub const fn contains(&self, offset: usize) -> bool {
        self.lo <= offset && offset <= self.hi
    }

    /// Whether either endpoint of `other` lies inside this chunk.
    ///
    /// This only looks at `other`'s endpoints, so `a.intersects(b)` is false
    /// when `b` strictly covers `a`. Overlap tests must check both directions.
    #[must_use]
    pub const fn intersects(&self, other: &Chunk) -> bool {
        self.contains(other.lo) || self.contains(other.hi)
    }

    /// Whether `other` touches this chunk without intersecting it.
    #[must_use]
    pub fn is_neighbor(&self, other: &Chunk) -> bool {
        let touches_right = self.hi.checked_add(1) == Some(other.lo);
        let touches_left = other.hi.checked_add(1) == Some(self.lo);
        !self.intersects(other) && (touches_right || touches_left)
    }

    /// Whether this chunk lies strictly left of `other`, with no contact.
    #[must_use]
    pub const fn is_left_of(&self, other: &Chunk) -> bool {
        self.hi < other.lo
    }

    /// Whether this chunk lies strictly right of `other`, with no contact.
    #[must_use]
    pub const fn is_right_of(&self, other: &Chunk) -> bool {
        self.lo > other.hi
    }

    /// Whether the two chunks overlap or touch, checked from both sides.
    #[must_use]
    pub fn is_mergeable(&self, other: &Chunk) -> bool {
        self.is_neighbor(other) || self.intersects(other) || other.intersects(self)
    }

    /// Smallest chunk covering both bounds.
    ///
    /// Only meaningful for overlapping or adjacent chunks; joining distant
    /// chunks silently swallows the gap between them.
    #[must_use]
    pub fn join(&self, other: &Chunk) -> Chunk {
        Chunk::from_bounds(self.lo.min(other.lo), self.hi.max(other.hi))
    }

    /// Append `self \ other` to `out`: zero, one or two chunks.
    pub fn subtract(&self, other: &Chunk, out: &mut Vec<Chunk>) {
        if !(self.intersects(other) || other.intersects(self)) {
            out.push(*self);
            return;
        }

        if self.lo >= other.lo && self.hi <= other.hi {
            // fully covered
        } else if self.lo < other.lo && self.hi > other.hi {
            out.push(Chunk::from_bounds(self.lo, other.lo - 1));
            out.push(Chunk::from_bounds(other.hi + 1, self.hi));
        } else if other.lo <= self.lo {
            out.push(Chunk::from_bounds(other.hi + 1, self.hi));
        } else {
            out.push(Chunk::from_bounds(self.lo, other.lo - 1));
        }
    }
}

impl fmt::Display for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}..{}]", self.lo, self.hi)
    }
}
