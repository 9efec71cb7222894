#![no_main]

use std::collections::HashMap;

use libfuzzer_sys::fuzz_target;

use offheap_core::{ArenaMap, CacheError};

const CAPACITY: usize = 256;

// Each operation is 2 bytes: opcode+key, then a length.
fuzz_target!(|data: &[u8]| {
    let mut map = ArenaMap::new(CAPACITY).unwrap();
    let mut model: HashMap<u8, Vec<u8>> = HashMap::new();

    for (step, op) in data.chunks_exact(2).enumerate() {
        let key = op[0] & 0x0f;
        let len = usize::from(op[1]) + 1;
        match op[0] >> 6 {
            0 | 1 => {
                let value = vec![step as u8; len];
                let previous = model.remove(&key);
                match map.put(key, &value) {
                    Ok(old) => {
                        assert_eq!(old, previous);
                        model.insert(key, value);
                    }
                    Err(CacheError::CapacityExceeded { .. }) => {
                        let live: usize = model.values().map(Vec::len).sum();
                        assert!(live + len > CAPACITY, "room was available for {len} bytes");
                    }
                    Err(other) => panic!("unexpected error: {other}"),
                }
            }
            2 => assert_eq!(map.remove(&key).unwrap(), model.remove(&key)),
            _ => {
                map.compact().unwrap();
                assert!(map.free_chunks().len() <= 1);
            }
        }

        assert_eq!(map.len(), model.len());
        let used: usize = model.values().map(Vec::len).sum();
        assert_eq!(map.used_bytes(), used);
        assert_eq!(map.free_chunks().total_free(), CAPACITY - used);
        for (key, value) in &model {
            assert_eq!(map.get(key).as_ref(), Some(value));
        }
    }
});
