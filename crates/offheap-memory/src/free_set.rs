//! Free-space tracking for a fixed-size arena.
//!
//! `FreeSet` keeps the unallocated byte ranges of `[0, capacity-1]` as a sorted
//! list of chunks that never overlap and never touch. Releasing a range merges
//! it into its neighbours, claiming a range splits whatever it overlaps.

use std::fmt;

use crate::chunk::{Chunk, RangeError};

/// Coalescing set of free chunks within `[0, capacity-1]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FreeSet {
    full: Chunk,
    chunks: Vec<Chunk>,
}

impl FreeSet {
    /// Create a set whose single free chunk spans the whole arena.
    pub fn new(capacity: usize) -> Result<Self, RangeError> {
        if capacity == 0 {
            return Err(RangeError::ZeroCapacity);
        }
        let full = Chunk::from_bounds(0, capacity - 1);
        Ok(Self {
            full,
            chunks: vec![full],
        })
    }

    /// Arena size this set was created for.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.full.size()
    }

    /// The chunk `[0, capacity-1]`.
    #[must_use]
    pub fn full_range(&self) -> Chunk {
        self.full
    }

    /// Number of disjoint free chunks.
    #[must_use]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether no free space is left.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    /// Free chunks in ascending-offset order.
    #[must_use]
    pub fn chunks(&self) -> &[Chunk] {
        &self.chunks
    }

    /// Iterate free chunks in ascending-offset order.
    pub fn iter(&self) -> std::slice::Iter<'_, Chunk> {
        self.chunks.iter()
    }

    /// Total number of free bytes.
    #[must_use]
    pub fn total_free(&self) -> usize {
        self.chunks.iter().map(Chunk::size).sum()
    }

    /// The largest free chunk, if any. Ties resolve to the lowest offset.
    #[must_use]
    pub fn largest(&self) -> Option<Chunk> {
        self.chunks
            .iter()
            .copied()
            .reduce(|best, c| if c.size() > best.size() { c } else { best })
    }

    /// First chunk, in ascending-offset order, holding at least `len` bytes.
    #[must_use]
    pub fn first_fit(&self, len: usize) -> Option<Chunk> {
        self.chunks.iter().copied().find(|c| c.size() >= len)
    }

    /// Reset to the single full-capacity chunk.
    pub fn clear(&mut self) {
        self.chunks.clear();
        self.chunks.push(self.full);
    }

    /// Release `chunk`, merging it with every free chunk it overlaps or touches.
    pub fn add(&mut self, chunk: Chunk) -> Result<(), RangeError> {
        self.check_range(chunk)?;

        if self.chunks.is_empty() {
            self.chunks.push(chunk);
            return Ok(());
        }

        let mut joined = false;
        let mut merged = Vec::with_capacity(self.chunks.len() + 1);
        for free in &self.chunks {
            if free.is_mergeable(&chunk) {
                merged.push(free.join(&chunk));
                joined = true;
            } else {
                merged.push(*free);
            }
        }
        if !joined {
            merged.push(chunk);
        }

        // A released chunk bridging a gap leaves its left and right neighbours
        // as two overlapping joins; those must collapse into one.
        merged.sort_unstable();
        self.chunks = coalesce(merged);
        Ok(())
    }

    /// Claim `chunk`, cutting it out of every free chunk. Idempotent.
    pub fn remove(&mut self, chunk: Chunk) -> Result<(), RangeError> {
        self.check_range(chunk)?;

        let mut remaining = Vec::with_capacity(self.chunks.len() + 1);
        for free in &self.chunks {
            free.subtract(&chunk, &mut remaining);
        }
        self.chunks = remaining;
        Ok(())
    }

    /// Rebuild as the complement of `used` within `[0, capacity-1]`.
    pub fn reset_excluding<'a, I>(&mut self, used: I)
    where
        I: IntoIterator<Item = &'a Chunk>,
    {
        self.clear();
        let mut remaining = Vec::new();
        for taken in used {
            remaining.clear();
            for free in &self.chunks {
                free.subtract(taken, &mut remaining);
            }
            std::mem::swap(&mut self.chunks, &mut remaining);
        }
    }

    fn check_range(&self, chunk: Chunk) -> Result<(), RangeError> {
        if chunk.lo() < self.full.lo() || chunk.hi() > self.full.hi() {
            return Err(RangeError::OutOfRange {
                chunk,
                capacity: self.capacity(),
            });
        }
        Ok(())
    }
}

/// Merge overlapping or touching chunks of a sorted list until none remain.
///
/// Sorted by `lo`, any chunk that cannot merge into the accumulated tail cannot
/// merge into anything before it either, so one sweep reaches the fixpoint.
fn coalesce(sorted: Vec<Chunk>) -> Vec<Chunk> {
    let mut out: Vec<Chunk> = Vec::with_capacity(sorted.len());
    for chunk in sorted {
        match out.last_mut() {
            Some(last) if last.is_mergeable(&chunk) => *last = last.join(&chunk),
            _ => out.push(chunk),
        }
    }
    out
}

impl<'a> IntoIterator for &'a FreeSet {
    type Item = &'a Chunk;
    type IntoIter = std::slice::Iter<'a, Chunk>;

    fn into_iter(self) -> Self::IntoIter {
        self.chunks.iter()
    }
}

impl fmt::Display for FreeSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, chunk) in self.chunks.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{chunk}")?;
        }
        write!(f, "]")
    }
}
