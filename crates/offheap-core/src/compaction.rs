//! In-place defragmentation of an [`ArenaMap`].
//!
//! Live chunks sitting between two free chunks slide left by the total size of
//! every free chunk below them, then the free set is rebuilt as the complement
//! of the relocated entries. Keys keep their values; only offsets change.

use std::hash::Hash;

use offheap_memory::Chunk;
use serde::Serialize;
use tracing::{debug, info};

use crate::arena_map::ArenaMap;
use crate::error::{CacheError, Result};

/// What a call to [`ArenaMap::compact`] did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CompactionOutcome {
    /// Whether a pass ran at all (it is skipped with at most one free chunk).
    pub performed: bool,
    /// Entries whose chunk moved.
    pub moved: usize,
    /// Bytes copied while moving them.
    pub relocated_bytes: usize,
    /// Free chunks before the pass.
    pub free_chunks_before: usize,
    /// Free chunks after the pass.
    pub free_chunks_after: usize,
}

impl CompactionOutcome {
    fn skipped(free_chunks: usize) -> Self {
        Self {
            free_chunks_before: free_chunks,
            free_chunks_after: free_chunks,
            ..Self::default()
        }
    }
}

impl<K: Eq + Hash> ArenaMap<K> {
    /// Defragment the arena, packing live data towards offset zero.
    ///
    /// Does nothing while the free space is already a single chunk (or none).
    pub fn compact(&mut self) -> Result<CompactionOutcome> {
        let free_before = self.free.len();
        if free_before <= 1 {
            return Ok(CompactionOutcome::skipped(free_before));
        }
        debug!(free_chunks = free_before, entries = self.entries.len(), "compacting arena");

        let gaps: Vec<Chunk> = self.free.chunks().to_vec();
        let buffer = &mut self.buffer;
        let mut live: Vec<&mut Chunk> = self.entries.values_mut().collect();
        live.sort_unstable_by_key(|chunk| **chunk);

        let mut moved = 0;
        let mut relocated_bytes = 0;
        let mut shift = 0;
        let mut cursor = 0;
        for (i, gap) in gaps.iter().enumerate() {
            shift += gap.size();
            let Some(next_gap) = gaps.get(i + 1) else {
                break;
            };

            while let Some(slot) = live.get_mut(cursor) {
                let chunk = **slot;
                if !chunk.is_right_of(gap) {
                    // already below the first gap, stays put
                    cursor += 1;
                    continue;
                }
                if !chunk.is_left_of(next_gap) {
                    break;
                }

                let lo = chunk.lo().checked_sub(shift).ok_or_else(|| {
                    CacheError::InvalidArgument(format!("cannot shift {chunk} left by {shift}"))
                })?;
                let target = Chunk::with_len(lo, chunk.size())?;
                buffer.copy_within(chunk.lo()..=chunk.hi(), target.lo());
                **slot = target;

                moved += 1;
                relocated_bytes += chunk.size();
                cursor += 1;
            }
        }

        self.free.reset_excluding(self.entries.values());
        let outcome = CompactionOutcome {
            performed: true,
            moved,
            relocated_bytes,
            free_chunks_before: free_before,
            free_chunks_after: self.free.len(),
        };
        self.stats.record_compaction(relocated_bytes as u64);
        info!(
            moved,
            relocated_bytes,
            free_chunks_before = outcome.free_chunks_before,
            free_chunks_after = outcome.free_chunks_after,
            "arena compacted"
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(lo: usize, hi: usize) -> Chunk {
        Chunk::new(lo, hi).unwrap()
    }

    fn fill(map: &mut ArenaMap<String>, keys: &[&str], len: usize) {
        for (i, key) in keys.iter().enumerate() {
            let value: Vec<u8> = (0..len).map(|b| (i * 16 + b) as u8).collect();
            map.put((*key).to_string(), &value).unwrap();
        }
    }

    #[test]
    fn single_free_chunk_is_noop() {
        let mut map = ArenaMap::<String>::new(20).unwrap();
        fill(&mut map, &["a", "b"], 5);
        let outcome = map.compact().unwrap();
        assert!(!outcome.performed);
        assert_eq!(outcome.free_chunks_before, 1);
        assert_eq!(map.stats().compactions, 0);
    }

    #[test]
    fn full_arena_is_noop() {
        let mut map = ArenaMap::<String>::new(10).unwrap();
        fill(&mut map, &["a", "b"], 5);
        let outcome = map.compact().unwrap();
        assert!(!outcome.performed);
        assert_eq!(outcome.free_chunks_before, 0);
    }

    #[test]
    fn manual_compact_consolidates_gaps() {
        let mut map = ArenaMap::<String>::new(20).unwrap();
        fill(&mut map, &["test1", "test2", "test3", "test4"], 5);
        let test1 = map.get("test1").unwrap();
        let test3 = map.get("test3").unwrap();
        map.remove("test2").unwrap();
        map.remove("test4").unwrap();

        let outcome = map.compact().unwrap();
        assert!(outcome.performed);
        assert_eq!(outcome.moved, 1);
        assert_eq!(outcome.relocated_bytes, 5);
        assert_eq!(outcome.free_chunks_before, 2);
        assert_eq!(outcome.free_chunks_after, 1);
        assert_eq!(map.free_chunks().chunks(), &[chunk(10, 19)]);
        assert_eq!(map.get("test1"), Some(test1));
        assert_eq!(map.get("test3"), Some(test3));

        map.put("test5".to_string(), &[5u8; 10]).unwrap();
        assert_eq!(map.chunk_of("test5"), Some(chunk(10, 19)));
    }

    #[test]
    fn leading_gap_shifts_everything_down() {
        let mut map = ArenaMap::<String>::new(30).unwrap();
        fill(&mut map, &["a", "b", "c", "d", "e"], 5);
        let b = map.get("b").unwrap();
        let c = map.get("c").unwrap();
        let e = map.get("e").unwrap();
        map.remove("a").unwrap();
        map.remove("d").unwrap();
        // free: [0..4], [15..19], [25..29]

        let outcome = map.compact().unwrap();
        assert_eq!(outcome.moved, 3);
        assert_eq!(map.chunk_of("b"), Some(chunk(0, 4)));
        assert_eq!(map.chunk_of("c"), Some(chunk(5, 9)));
        assert_eq!(map.chunk_of("e"), Some(chunk(10, 14)));
        assert_eq!(map.free_chunks().chunks(), &[chunk(15, 29)]);
        assert_eq!(map.get("b"), Some(b));
        assert_eq!(map.get("c"), Some(c));
        assert_eq!(map.get("e"), Some(e));
    }

    #[test]
    fn entries_after_last_gap_stay_put() {
        let mut map = ArenaMap::<String>::new(25).unwrap();
        fill(&mut map, &["a", "b", "c", "d", "e"], 5);
        let e = map.get("e").unwrap();
        map.remove("b").unwrap();
        map.remove("d").unwrap();
        // free: [5..9], [15..19]; e sits in [20..24] behind the last gap

        map.compact().unwrap();
        assert_eq!(map.chunk_of("a"), Some(chunk(0, 4)));
        assert_eq!(map.chunk_of("c"), Some(chunk(5, 9)));
        assert_eq!(map.chunk_of("e"), Some(chunk(20, 24)));
        assert_eq!(map.free_chunks().chunks(), &[chunk(10, 19)]);
        assert_eq!(map.get("e"), Some(e));
    }

    #[test]
    fn overlapping_move_preserves_bytes() {
        let mut map = ArenaMap::<String>::new(40).unwrap();
        map.put("gap".to_string(), &[0xAA; 2]).unwrap();
        let long: Vec<u8> = (0..30).collect();
        map.put("long".to_string(), &long).unwrap();
        map.put("tail".to_string(), &[0xBB; 3]).unwrap();
        map.remove("gap").unwrap();
        map.remove("tail").unwrap();
        // free: [0..1], [32..39]; "long" moves 2 bytes left onto itself

        map.compact().unwrap();
        assert_eq!(map.chunk_of("long"), Some(chunk(0, 29)));
        assert_eq!(map.get("long"), Some(long));
        assert_eq!(map.free_chunks().chunks(), &[chunk(30, 39)]);
    }

    #[test]
    fn compaction_is_counted() {
        let mut map = ArenaMap::<String>::new(20).unwrap();
        fill(&mut map, &["a", "b", "c", "d"], 5);
        map.remove("a").unwrap();
        map.remove("c").unwrap();
        map.compact().unwrap();
        let stats = map.stats();
        assert_eq!(stats.compactions, 1);
        assert_eq!(stats.relocated_bytes, 5);
    }
}
