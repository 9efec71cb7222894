//! Readers-writer locked wrapper around an [`ArenaMap`].
//!
//! Lookups share the lock, anything that touches the arena takes it
//! exclusively. A `put` that falls back to compaction runs the whole pass
//! under the write lock it already holds.

use std::collections::HashSet;
use std::hash::Hash;
use std::ops::{Deref, DerefMut};

use offheap_memory::ArenaStats;
use parking_lot::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::arena_map::ArenaMap;
use crate::compaction::CompactionOutcome;
use crate::error::Result;
use crate::map::CompactableMap;

/// An [`ArenaMap`] shareable across threads.
#[derive(Debug)]
pub struct SharedArenaMap<K> {
    inner: RwLock<ArenaMap<K>>,
}

/// Shared access: only `&ArenaMap` is reachable through it.
pub struct ArenaReadGuard<'a, K>(RwLockReadGuard<'a, ArenaMap<K>>);

/// Exclusive access: `&mut ArenaMap` is reachable through it.
pub struct ArenaWriteGuard<'a, K>(RwLockWriteGuard<'a, ArenaMap<K>>);

impl<K> Deref for ArenaReadGuard<'_, K> {
    type Target = ArenaMap<K>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<K> Deref for ArenaWriteGuard<'_, K> {
    type Target = ArenaMap<K>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<K> DerefMut for ArenaWriteGuard<'_, K> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<K: Eq + Hash> SharedArenaMap<K> {
    /// Create a shared map over a fresh arena of `capacity` bytes.
    pub fn new(capacity: usize) -> Result<Self> {
        Ok(Self::from_map(ArenaMap::new(capacity)?))
    }

    /// Take ownership of an existing map.
    #[must_use]
    pub fn from_map(map: ArenaMap<K>) -> Self {
        Self {
            inner: RwLock::new(map),
        }
    }

    /// Block until shared access is granted.
    pub fn read(&self) -> ArenaReadGuard<'_, K> {
        ArenaReadGuard(self.inner.read())
    }

    /// Block until exclusive access is granted.
    pub fn write(&self) -> ArenaWriteGuard<'_, K> {
        ArenaWriteGuard(self.inner.write())
    }

    /// Unwrap the inner map.
    pub fn into_inner(self) -> ArenaMap<K> {
        self.inner.into_inner()
    }

    /// Arena size in bytes.
    pub fn capacity(&self) -> usize {
        self.read().capacity()
    }

    /// Snapshot of the usage counters.
    pub fn stats(&self) -> ArenaStats {
        self.read().stats()
    }
}

impl<K> CompactableMap<K> for SharedArenaMap<K>
where
    K: Eq + Hash + Clone + Send + Sync,
{
    fn get(&self, key: &K) -> Option<Vec<u8>> {
        self.read().get(key)
    }

    fn put(&self, key: K, value: &[u8]) -> Result<Option<Vec<u8>>> {
        self.write().put(key, value)
    }

    fn remove(&self, key: &K) -> Result<Option<Vec<u8>>> {
        self.write().remove(key)
    }

    fn remove_if(&self, key: &K, expected: &[u8]) -> Result<bool> {
        self.write().remove_if(key, expected)
    }

    fn contains_key(&self, key: &K) -> bool {
        self.read().contains_key(key)
    }

    fn contains_value(&self, value: &[u8]) -> bool {
        self.read().contains_value(value)
    }

    fn len(&self) -> usize {
        self.read().len()
    }

    fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    fn clear(&self) {
        self.write().clear();
    }

    fn put_all(&self, items: Vec<(K, Vec<u8>)>) -> Result<()> {
        self.write().put_all(items)
    }

    fn put_if_absent(&self, key: K, value: &[u8]) -> Result<Option<Vec<u8>>> {
        self.write().put_if_absent(key, value)
    }

    fn replace(&self, key: K, value: &[u8]) -> Result<Option<Vec<u8>>> {
        self.write().replace(key, value)
    }

    fn replace_if(&self, key: K, expected: &[u8], value: &[u8]) -> Result<bool> {
        self.write().replace_if(key, expected, value)
    }

    fn keys(&self) -> HashSet<K> {
        self.read().keys()
    }

    fn compact(&self) -> Result<CompactionOutcome> {
        self.write().compact()
    }

    fn values(&self) -> Result<Vec<Vec<u8>>> {
        self.read().values()
    }

    fn entries(&self) -> Result<Vec<(K, Vec<u8>)>> {
        self.read().entries()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::error::CacheError;

    #[test]
    fn zero_capacity_rejected() {
        assert!(matches!(
            SharedArenaMap::<String>::new(0),
            Err(CacheError::InvalidArgument(_))
        ));
    }

    #[test]
    fn delegates_map_contract() {
        let map = SharedArenaMap::new(20).unwrap();
        assert!(map.is_empty());
        map.put("foo".to_string(), b"foo").unwrap();
        assert_eq!(map.get(&"foo".to_string()), Some(b"foo".to_vec()));
        assert!(map.contains_key(&"foo".to_string()));
        assert!(map.contains_value(b"foo"));
        assert_eq!(map.len(), 1);
        assert!(map.replace_if("foo".to_string(), b"foo", b"bar").unwrap());
        assert_eq!(
            map.put_if_absent("foo".to_string(), b"baz").unwrap(),
            Some(b"bar".to_vec())
        );
        assert!(map.remove_if(&"foo".to_string(), b"bar").unwrap());
        assert!(map.is_empty());
        assert!(matches!(map.values(), Err(CacheError::Unsupported(_))));
        assert!(matches!(map.entries(), Err(CacheError::Unsupported(_))));
    }

    #[test]
    fn guards_expose_inner_map() {
        let map = SharedArenaMap::<String>::new(16).unwrap();
        map.write().put("k".to_string(), b"value").unwrap();
        {
            let a = map.read();
            let b = map.read();
            assert_eq!(a.get("k"), b.get("k"));
        }
        assert_eq!(map.capacity(), 16);
        assert_eq!(map.into_inner().len(), 1);
    }

    #[test]
    fn write_guard_released_after_error() {
        let map = SharedArenaMap::new(4).unwrap();
        assert!(map.put("big".to_string(), &[0u8; 8]).is_err());
        // a leaked guard would deadlock here
        map.put("ok".to_string(), &[1u8; 4]).unwrap();
        assert_eq!(map.stats().exhausted, 1);
    }

    #[test]
    fn concurrent_writers_and_readers() {
        let map = Arc::new(SharedArenaMap::<String>::new(4096).unwrap());
        let handles: Vec<_> = (0..4u8)
            .map(|t| {
                let map = Arc::clone(&map);
                thread::spawn(move || {
                    for i in 0..50u8 {
                        let key = format!("t{t}-{i}");
                        let value = vec![t ^ i; 8];
                        map.put(key.clone(), &value).unwrap();
                        assert_eq!(map.get(&key), Some(value));
                        if i % 2 == 0 {
                            map.remove(&key).unwrap();
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(map.len(), 100);
        map.compact().unwrap();
        assert_eq!(map.read().free_chunks().len(), 1);
    }
}
