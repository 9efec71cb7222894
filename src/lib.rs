//! Shared helpers for the workspace integration tests under `tests/`.

use offheap_core::{ArenaMap, Chunk};

/// `len` bytes starting at `seed` and counting up, wrapping at 256.
#[must_use]
#[allow(clippy::cast_possible_truncation)]
pub fn pattern(seed: u8, len: usize) -> Vec<u8> {
    (0..len).map(|i| seed.wrapping_add(i as u8)).collect()
}

/// Closed chunk `[lo, hi]`; panics on inverted bounds.
#[must_use]
pub fn chunk(lo: usize, hi: usize) -> Chunk {
    Chunk::new(lo, hi).expect("valid chunk bounds")
}

/// Assert every arena byte belongs to exactly one live entry or free chunk.
pub fn assert_partitioned<K, I>(map: &ArenaMap<K>, keys: I)
where
    K: Eq + std::hash::Hash,
    I: IntoIterator<Item = K>,
{
    let mut owners = vec![0u32; map.capacity()];
    let live = keys.into_iter().filter_map(|k| map.chunk_of(&k));
    for c in live.chain(map.free_chunks().iter().copied()) {
        for owner in &mut owners[c.lo()..=c.hi()] {
            *owner += 1;
        }
    }
    if let Some(offset) = owners.iter().position(|&n| n != 1) {
        panic!(
            "byte {offset} covered {} times; free set {}",
            owners[offset],
            map.free_chunks()
        );
    }
}
