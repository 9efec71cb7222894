//! # offheap-core
//!
//! A byte-value map whose values live in one preallocated arena.
//!
//! Allocation is first-fit over the arena's free ranges. When no free range
//! is large enough the arena is compacted in place and the allocation is
//! retried once. [`SharedArenaMap`] adds a readers-writer lock and
//! [`TypedMap`] stores typed values through a [`ByteConverter`].

pub mod arena_map;
pub mod capacity;
pub mod compaction;
pub mod constants;
pub mod error;
pub mod map;
pub mod shared;
pub mod typed;

// Re-exports
pub use arena_map::ArenaMap;
pub use capacity::parse_capacity;
pub use compaction::CompactionOutcome;
pub use constants::{exit_codes, DEFAULT_CAPACITY};
pub use error::{CacheError, Result};
pub use map::CompactableMap;
pub use offheap_memory::{ArenaStats, Chunk, FreeSet, RangeError};
pub use shared::{ArenaReadGuard, ArenaWriteGuard, SharedArenaMap};
pub use typed::{ByteConverter, JsonConverter, TypedMap, Utf8Converter};
