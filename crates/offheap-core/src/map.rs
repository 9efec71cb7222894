//! The concurrent byte-map contract.

use std::collections::HashSet;

use crate::compaction::CompactionOutcome;
use crate::error::Result;

/// Thread-safe map from keys to byte values that can be defragmented.
///
/// Implemented by [`SharedArenaMap`](crate::shared::SharedArenaMap) and consumed
/// by [`TypedMap`](crate::typed::TypedMap). Check-then-act operations
/// (`put_if_absent`, `replace`, `replace_if`, `remove_if`) are atomic with
/// respect to every other call on the same map.
pub trait CompactableMap<K>: Send + Sync {
    /// Copy of the bytes stored under `key`.
    fn get(&self, key: &K) -> Option<Vec<u8>>;

    /// Store `value`, returning the bytes it replaced.
    fn put(&self, key: K, value: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Remove `key`, returning its bytes.
    fn remove(&self, key: &K) -> Result<Option<Vec<u8>>>;

    /// Remove `key` only if it currently holds `expected`.
    fn remove_if(&self, key: &K, expected: &[u8]) -> Result<bool>;

    /// Whether `key` has an entry.
    fn contains_key(&self, key: &K) -> bool;

    /// Whether any entry holds exactly `value`.
    fn contains_value(&self, value: &[u8]) -> bool;

    /// Number of entries.
    fn len(&self) -> usize;

    /// Whether there are no entries.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry.
    fn clear(&self);

    /// Store every pair, stopping at the first failure.
    fn put_all(&self, items: Vec<(K, Vec<u8>)>) -> Result<()>;

    /// Store `value` only if `key` is absent; otherwise return the current bytes.
    fn put_if_absent(&self, key: K, value: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Overwrite `key` only if it has an entry.
    fn replace(&self, key: K, value: &[u8]) -> Result<Option<Vec<u8>>>;

    /// Overwrite `key` only if it currently holds `expected`.
    fn replace_if(&self, key: K, expected: &[u8], value: &[u8]) -> Result<bool>;

    /// Owned snapshot of the keys.
    fn keys(&self) -> HashSet<K>;

    /// Defragment the backing storage.
    fn compact(&self) -> Result<CompactionOutcome>;

    /// Bulk value materialization. Arena-backed maps refuse it.
    fn values(&self) -> Result<Vec<Vec<u8>>>;

    /// Bulk entry materialization. Arena-backed maps refuse it.
    fn entries(&self) -> Result<Vec<(K, Vec<u8>)>>;
}
