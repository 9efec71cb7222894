//! Key → chunk map over one fixed-size byte arena.
//!
//! Values live back to back inside a single buffer allocated at construction.
//! Each key records the [`Chunk`] its bytes occupy; the [`FreeSet`] tracks
//! everything else. Together they always partition `[0, capacity-1]`.
//!
//! Allocation is first-fit. When no free chunk is large enough the arena is
//! compacted once (see [`ArenaMap::compact`]) and the search retried.

use std::borrow::Borrow;
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::hash::Hash;

use offheap_memory::{ArenaStats, AtomicArenaStats, Chunk, FreeSet};
use tracing::{debug, warn};

use crate::error::{CacheError, Result};

/// Single-threaded arena-backed byte map.
///
/// Not internally synchronised: every mutation takes `&mut self`. Wrap it in a
/// [`SharedArenaMap`](crate::shared::SharedArenaMap) to share it across threads.
pub struct ArenaMap<K> {
    pub(crate) buffer: Box<[u8]>,
    pub(crate) free: FreeSet,
    pub(crate) entries: HashMap<K, Chunk>,
    pub(crate) stats: AtomicArenaStats,
}

impl<K: Eq + Hash> ArenaMap<K> {
    /// Create a map backed by a zeroed arena of `capacity` bytes.
    pub fn new(capacity: usize) -> Result<Self> {
        if capacity == 0 {
            return Err(CacheError::InvalidArgument(
                "capacity must be greater than zero".into(),
            ));
        }
        let free = FreeSet::new(capacity)?;
        Ok(Self {
            buffer: vec![0u8; capacity].into_boxed_slice(),
            free,
            entries: HashMap::new(),
            stats: AtomicArenaStats::new(),
        })
    }

    /// Arena size in bytes.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buffer.len()
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Bytes currently held by entries.
    #[must_use]
    pub fn used_bytes(&self) -> usize {
        self.capacity() - self.free.total_free()
    }

    /// Current free space, in ascending-offset order.
    #[must_use]
    pub fn free_chunks(&self) -> &FreeSet {
        &self.free
    }

    /// Where `key`'s bytes currently live.
    pub fn chunk_of<Q>(&self, key: &Q) -> Option<Chunk>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.get(key).copied()
    }

    /// Snapshot of the usage counters.
    #[must_use]
    pub fn stats(&self) -> ArenaStats {
        self.stats.snapshot()
    }

    /// Zero the usage counters.
    pub fn reset_stats(&self) {
        self.stats.reset();
    }

    /// Whether `key` has an entry.
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries.contains_key(key)
    }

    /// Whether any entry holds exactly `value`. Scans every entry.
    #[must_use]
    pub fn contains_value(&self, value: &[u8]) -> bool {
        self.entries
            .values()
            .any(|chunk| self.bytes(*chunk) == value)
    }

    /// A fresh copy of `key`'s bytes.
    pub fn get<Q>(&self, key: &Q) -> Option<Vec<u8>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let found = self.entries.get(key).map(|chunk| self.bytes(*chunk).to_vec());
        self.stats.record_lookup(found.is_some());
        found
    }

    /// Store `value` under `key`, returning the bytes it replaced.
    ///
    /// An existing entry is freed before the new chunk is searched for, so a
    /// put that fails with [`CacheError::CapacityExceeded`] still drops the
    /// key's previous value.
    pub fn put(&mut self, key: K, value: &[u8]) -> Result<Option<Vec<u8>>> {
        if value.is_empty() {
            return Err(CacheError::InvalidArgument("value must not be empty".into()));
        }
        if value.len() > self.capacity() {
            return Err(self.exhausted(value.len()));
        }

        let previous = match self.entries.remove(&key) {
            Some(chunk) => Some(self.release(chunk)?),
            None => None,
        };
        self.allocate(key, value)?;
        Ok(previous)
    }

    /// Store every pair in order; stops at the first failure.
    pub fn put_all<I, V>(&mut self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
        V: AsRef<[u8]>,
    {
        for (key, value) in items {
            self.put(key, value.as_ref())?;
        }
        Ok(())
    }

    /// Store `value` only if `key` is absent; otherwise return the current bytes.
    pub fn put_if_absent(&mut self, key: K, value: &[u8]) -> Result<Option<Vec<u8>>> {
        if let Some(chunk) = self.entries.get(&key).copied() {
            return Ok(Some(self.bytes(chunk).to_vec()));
        }
        self.put(key, value)
    }

    /// Overwrite `key` only if it already has an entry.
    pub fn replace(&mut self, key: K, value: &[u8]) -> Result<Option<Vec<u8>>> {
        if self.contains_key(&key) {
            self.put(key, value)
        } else {
            Ok(None)
        }
    }

    /// Overwrite `key` only if its current bytes equal `expected`.
    pub fn replace_if(&mut self, key: K, expected: &[u8], value: &[u8]) -> Result<bool> {
        if self.holds(&key, expected) {
            self.put(key, value)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Remove `key`, returning its bytes.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<Option<Vec<u8>>>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        match self.entries.remove(key) {
            Some(chunk) => self.release(chunk).map(Some),
            None => Ok(None),
        }
    }

    /// Remove `key` only if its current bytes equal `expected`.
    pub fn remove_if<Q>(&mut self, key: &Q, expected: &[u8]) -> Result<bool>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        if self.holds(key, expected) {
            self.remove(key)?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    /// Drop every entry and mark the whole arena free.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.free.clear();
    }

    /// Always fails: materializing every value would copy the arena onto the heap.
    pub fn values(&self) -> Result<Vec<Vec<u8>>> {
        Err(CacheError::Unsupported(
            "values() would copy the whole arena onto the heap",
        ))
    }

    /// Always fails: materializing every entry would copy the arena onto the heap.
    pub fn entries(&self) -> Result<Vec<(K, Vec<u8>)>> {
        Err(CacheError::Unsupported(
            "entries() would copy the whole arena onto the heap",
        ))
    }

    pub(crate) fn bytes(&self, chunk: Chunk) -> &[u8] {
        &self.buffer[chunk.lo()..=chunk.hi()]
    }

    fn holds<Q>(&self, key: &Q, expected: &[u8]) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.entries
            .get(key)
            .is_some_and(|chunk| self.bytes(*chunk) == expected)
    }

    /// Copy out a detached chunk's bytes and hand the chunk back to the free set.
    fn release(&mut self, chunk: Chunk) -> Result<Vec<u8>> {
        let bytes = self.bytes(chunk).to_vec();
        self.free.add(chunk)?;
        self.stats.record_remove();
        Ok(bytes)
    }

    fn allocate(&mut self, key: K, value: &[u8]) -> Result<()> {
        let target = match self.free.first_fit(value.len()) {
            Some(chunk) => chunk,
            None => {
                debug!(
                    requested = value.len(),
                    free_chunks = self.free.len(),
                    "no free chunk fits, compacting"
                );
                self.compact()?;
                self.free
                    .first_fit(value.len())
                    .ok_or_else(|| self.exhausted(value.len()))?
            }
        };

        let written = Chunk::with_len(target.lo(), value.len())?;
        self.buffer[written.lo()..=written.hi()].copy_from_slice(value);
        self.free.remove(written)?;
        self.entries.insert(key, written);
        self.stats.record_put();
        Ok(())
    }

    fn exhausted(&self, requested: usize) -> CacheError {
        self.stats.record_exhausted();
        warn!(
            requested,
            capacity = self.capacity(),
            free = self.free.total_free(),
            "arena exhausted"
        );
        CacheError::CapacityExceeded {
            requested,
            capacity: self.capacity(),
        }
    }
}

impl<K: Eq + Hash + Clone> ArenaMap<K> {
    /// Owned snapshot of the stored keys.
    #[must_use]
    pub fn keys(&self) -> HashSet<K> {
        self.entries.keys().cloned().collect()
    }
}

impl<K> fmt::Debug for ArenaMap<K> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArenaMap")
            .field("capacity", &self.buffer.len())
            .field("entries", &self.entries.len())
            .field("free", &self.free.chunks())
            .finish_non_exhaustive()
    }
}
