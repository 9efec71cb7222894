//! # offheap-memory
//!
//! Memory bookkeeping for the `offheap` arena cache.
//!
//! Provides the closed byte-range [`Chunk`] with its interval algebra, the
//! coalescing [`FreeSet`] that tracks unallocated space inside a fixed-size
//! arena, and lock-free allocation statistics.
#![warn(missing_docs)]

pub mod chunk;
pub mod free_set;
pub mod stats;

pub use chunk::{Chunk, RangeError};
pub use free_set::FreeSet;
pub use stats::{ArenaStats, AtomicArenaStats};
