//! Typed values on top of a byte map.
//!
//! A [`ByteConverter`] turns values into bytes and back; [`TypedMap`] applies
//! it around every call to an underlying [`CompactableMap`].

use std::collections::HashSet;
use std::hash::Hash;
use std::marker::PhantomData;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::compaction::CompactionOutcome;
use crate::error::{CacheError, Result};
use crate::map::CompactableMap;
use crate::shared::SharedArenaMap;

/// Two-way translation between values and their byte form.
///
/// Implementations should round-trip: `to_value(&to_bytes(v)?)? == v`.
pub trait ByteConverter<V>: Send + Sync {
    /// Encode `value`.
    fn to_bytes(&self, value: &V) -> Result<Vec<u8>>;

    /// Decode bytes previously produced by [`to_bytes`](Self::to_bytes).
    fn to_value(&self, bytes: &[u8]) -> Result<V>;
}

/// Stores `String`s as their UTF-8 bytes.
#[derive(Debug, Clone, Copy, Default)]
pub struct Utf8Converter;

impl ByteConverter<String> for Utf8Converter {
    fn to_bytes(&self, value: &String) -> Result<Vec<u8>> {
        Ok(value.as_bytes().to_vec())
    }

    fn to_value(&self, bytes: &[u8]) -> Result<String> {
        String::from_utf8(bytes.to_vec()).map_err(|e| CacheError::Conversion(e.to_string()))
    }
}

/// Stores any serde type as JSON.
pub struct JsonConverter<V> {
    _marker: PhantomData<fn() -> V>,
}

impl<V> JsonConverter<V> {
    /// Create a JSON converter.
    #[must_use]
    pub fn new() -> Self {
        Self {
            _marker: PhantomData,
        }
    }
}

impl<V> Default for JsonConverter<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Serialize + DeserializeOwned> ByteConverter<V> for JsonConverter<V> {
    fn to_bytes(&self, value: &V) -> Result<Vec<u8>> {
        serde_json::to_vec(value).map_err(|e| CacheError::Conversion(e.to_string()))
    }

    fn to_value(&self, bytes: &[u8]) -> Result<V> {
        serde_json::from_slice(bytes).map_err(|e| CacheError::Conversion(e.to_string()))
    }
}

/// Map of typed values backed by a byte map.
pub struct TypedMap<K, V, C, M = SharedArenaMap<K>> {
    converter: C,
    map: M,
    _marker: PhantomData<fn(K) -> V>,
}

impl<K, V, C> TypedMap<K, V, C, SharedArenaMap<K>>
where
    K: Eq + Hash + Clone + Send + Sync,
    C: ByteConverter<V>,
{
    /// Create a typed map over a fresh arena of `capacity` bytes.
    pub fn new(converter: C, capacity: usize) -> Result<Self> {
        Ok(Self::with_map(converter, SharedArenaMap::new(capacity)?))
    }
}

impl<K, V, C, M> TypedMap<K, V, C, M>
where
    C: ByteConverter<V>,
    M: CompactableMap<K>,
{
    /// Wrap an existing byte map.
    pub fn with_map(converter: C, map: M) -> Self {
        Self {
            converter,
            map,
            _marker: PhantomData,
        }
    }

    /// The underlying byte map.
    pub fn inner(&self) -> &M {
        &self.map
    }

    fn decode(&self, bytes: Option<Vec<u8>>) -> Result<Option<V>> {
        bytes.map(|b| self.converter.to_value(&b)).transpose()
    }

    /// Decoded value stored under `key`.
    pub fn get(&self, key: &K) -> Result<Option<V>> {
        self.decode(self.map.get(key))
    }

    /// Store `value`, returning the value it replaced.
    pub fn put(&self, key: K, value: &V) -> Result<Option<V>> {
        let bytes = self.converter.to_bytes(value)?;
        let previous = self.map.put(key, &bytes)?;
        self.decode(previous)
    }

    /// Remove `key`, returning its value.
    pub fn remove(&self, key: &K) -> Result<Option<V>> {
        let previous = self.map.remove(key)?;
        self.decode(previous)
    }

    /// Remove `key` only if it currently holds `expected`.
    pub fn remove_if(&self, key: &K, expected: &V) -> Result<bool> {
        let bytes = self.converter.to_bytes(expected)?;
        self.map.remove_if(key, &bytes)
    }

    /// Whether `key` has an entry.
    pub fn contains_key(&self, key: &K) -> bool {
        self.map.contains_key(key)
    }

    /// Whether any entry encodes to the same bytes as `value`.
    pub fn contains_value(&self, value: &V) -> Result<bool> {
        let bytes = self.converter.to_bytes(value)?;
        Ok(self.map.contains_value(&bytes))
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    /// Whether there are no entries.
    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Drop every entry.
    pub fn clear(&self) {
        self.map.clear();
    }

    /// Encode every pair, then store them in one call.
    pub fn put_all<I>(&self, items: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let encoded = items
            .into_iter()
            .map(|(key, value)| Ok((key, self.converter.to_bytes(&value)?)))
            .collect::<Result<Vec<_>>>()?;
        self.map.put_all(encoded)
    }

    /// Store `value` only if `key` is absent; otherwise return the current value.
    pub fn put_if_absent(&self, key: K, value: &V) -> Result<Option<V>> {
        let bytes = self.converter.to_bytes(value)?;
        let current = self.map.put_if_absent(key, &bytes)?;
        self.decode(current)
    }

    /// Overwrite `key` only if it has an entry.
    pub fn replace(&self, key: K, value: &V) -> Result<Option<V>> {
        let bytes = self.converter.to_bytes(value)?;
        let previous = self.map.replace(key, &bytes)?;
        self.decode(previous)
    }

    /// Overwrite `key` only if it currently holds `expected`.
    pub fn replace_if(&self, key: K, expected: &V, value: &V) -> Result<bool> {
        let expected = self.converter.to_bytes(expected)?;
        let bytes = self.converter.to_bytes(value)?;
        self.map.replace_if(key, &expected, &bytes)
    }

    /// Owned snapshot of the keys.
    pub fn keys(&self) -> HashSet<K> {
        self.map.keys()
    }

    /// Defragment the backing storage.
    pub fn compact(&self) -> Result<CompactionOutcome> {
        self.map.compact()
    }

    /// Always refused for arena-backed storage.
    pub fn values(&self) -> Result<Vec<V>> {
        Err(CacheError::Unsupported(
            "values() would copy the whole arena onto the heap",
        ))
    }

    /// Always refused for arena-backed storage.
    pub fn entries(&self) -> Result<Vec<(K, V)>> {
        Err(CacheError::Unsupported(
            "entries() would copy the whole arena onto the heap",
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use parking_lot::Mutex;
    use serde::Deserialize;

    use super::*;

    /// Plain `HashMap` standing in for the arena, to test the adapter alone.
    #[derive(Default)]
    struct HeapMap {
        inner: Mutex<HashMap<String, Vec<u8>>>,
    }

    impl CompactableMap<String> for HeapMap {
        fn get(&self, key: &String) -> Option<Vec<u8>> {
            self.inner.lock().get(key).cloned()
        }

        fn put(&self, key: String, value: &[u8]) -> Result<Option<Vec<u8>>> {
            Ok(self.inner.lock().insert(key, value.to_vec()))
        }

        fn remove(&self, key: &String) -> Result<Option<Vec<u8>>> {
            Ok(self.inner.lock().remove(key))
        }

        fn remove_if(&self, key: &String, expected: &[u8]) -> Result<bool> {
            let mut inner = self.inner.lock();
            if inner.get(key).is_some_and(|v| v == expected) {
                inner.remove(key);
                return Ok(true);
            }
            Ok(false)
        }

        fn contains_key(&self, key: &String) -> bool {
            self.inner.lock().contains_key(key)
        }

        fn contains_value(&self, value: &[u8]) -> bool {
            self.inner.lock().values().any(|v| v == value)
        }

        fn len(&self) -> usize {
            self.inner.lock().len()
        }

        fn clear(&self) {
            self.inner.lock().clear();
        }

        fn put_all(&self, items: Vec<(String, Vec<u8>)>) -> Result<()> {
            self.inner.lock().extend(items);
            Ok(())
        }

        fn put_if_absent(&self, key: String, value: &[u8]) -> Result<Option<Vec<u8>>> {
            let mut inner = self.inner.lock();
            if let Some(current) = inner.get(&key) {
                return Ok(Some(current.clone()));
            }
            inner.insert(key, value.to_vec());
            Ok(None)
        }

        fn replace(&self, key: String, value: &[u8]) -> Result<Option<Vec<u8>>> {
            let mut inner = self.inner.lock();
            if inner.contains_key(&key) {
                return Ok(inner.insert(key, value.to_vec()));
            }
            Ok(None)
        }

        fn replace_if(&self, key: String, expected: &[u8], value: &[u8]) -> Result<bool> {
            let mut inner = self.inner.lock();
            if inner.get(&key).is_some_and(|v| v == expected) {
                inner.insert(key, value.to_vec());
                return Ok(true);
            }
            Ok(false)
        }

        fn keys(&self) -> HashSet<String> {
            self.inner.lock().keys().cloned().collect()
        }

        fn compact(&self) -> Result<CompactionOutcome> {
            Ok(CompactionOutcome::default())
        }

        fn values(&self) -> Result<Vec<Vec<u8>>> {
            Ok(self.inner.lock().values().cloned().collect())
        }

        fn entries(&self) -> Result<Vec<(String, Vec<u8>)>> {
            Ok(self
                .inner
                .lock()
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect())
        }
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Session {
        user: String,
        hits: u32,
    }

    #[test]
    fn utf8_round_trip() {
        let conv = Utf8Converter;
        let bytes = conv.to_bytes(&"héllo".to_string()).unwrap();
        assert_eq!(conv.to_value(&bytes).unwrap(), "héllo");
    }

    #[test]
    fn utf8_rejects_invalid_bytes() {
        assert!(matches!(
            Utf8Converter.to_value(&[0xff, 0xfe]),
            Err(CacheError::Conversion(_))
        ));
    }

    #[test]
    fn json_round_trip() {
        let conv = JsonConverter::<Session>::new();
        let session = Session {
            user: "ada".into(),
            hits: 3,
        };
        let bytes = conv.to_bytes(&session).unwrap();
        assert_eq!(conv.to_value(&bytes).unwrap(), session);
        assert!(conv.to_value(b"{not json").is_err());
    }

    #[test]
    fn adapter_converts_both_ways() {
        let map: TypedMap<String, String, _, _> =
            TypedMap::with_map(Utf8Converter, HeapMap::default());
        assert_eq!(map.put("k".into(), &"v1".to_string()).unwrap(), None);
        assert_eq!(
            map.put("k".into(), &"v2".to_string()).unwrap(),
            Some("v1".to_string())
        );
        assert_eq!(map.get(&"k".into()).unwrap(), Some("v2".to_string()));
        assert_eq!(map.inner().get(&"k".into()), Some(b"v2".to_vec()));
        assert!(map.contains_value(&"v2".to_string()).unwrap());
        assert!(map.replace_if("k".into(), &"v2".into(), &"v3".into()).unwrap());
        assert!(!map.remove_if(&"k".into(), &"v2".into()).unwrap());
        assert_eq!(map.remove(&"k".into()).unwrap(), Some("v3".to_string()));
        assert!(map.is_empty());
    }

    #[test]
    fn adapter_refuses_bulk_reads_even_if_inner_allows() {
        let map: TypedMap<String, String, _, _> =
            TypedMap::with_map(Utf8Converter, HeapMap::default());
        map.put("k".into(), &"v".to_string()).unwrap();
        assert!(matches!(map.values(), Err(CacheError::Unsupported(_))));
        assert!(matches!(map.entries(), Err(CacheError::Unsupported(_))));
    }

    #[test]
    fn arena_backed_json_map() {
        let map: TypedMap<u64, Session, _> =
            TypedMap::new(JsonConverter::new(), 256).unwrap();
        let s1 = Session {
            user: "ada".into(),
            hits: 1,
        };
        let s2 = Session {
            user: "grace".into(),
            hits: 2,
        };
        map.put_all(vec![(1, s1.clone()), (2, s2.clone())]).unwrap();
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&1).unwrap(), Some(s1.clone()));
        assert_eq!(map.put_if_absent(1, &s2).unwrap(), Some(s1));
        assert_eq!(map.replace(3, &s2).unwrap(), None);
        assert!(!map.contains_key(&3));
        assert_eq!(map.keys(), HashSet::from([1, 2]));
        map.compact().unwrap();
        map.clear();
        assert!(map.is_empty());
    }

    #[test]
    fn decode_failure_surfaces() {
        let map: TypedMap<String, String, _, _> =
            TypedMap::with_map(Utf8Converter, HeapMap::default());
        map.inner().put("bad".into(), &[0xff]).unwrap();
        assert!(matches!(
            map.get(&"bad".into()),
            Err(CacheError::Conversion(_))
        ));
    }
}
