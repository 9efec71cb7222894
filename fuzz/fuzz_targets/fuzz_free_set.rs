#![no_main]

use libfuzzer_sys::fuzz_target;

use offheap_core::{Chunk, FreeSet};

const CAPACITY: usize = 64;

// Each operation is 3 bytes: add/remove flag, lo, hi.
fuzz_target!(|data: &[u8]| {
    let mut free = FreeSet::new(CAPACITY).unwrap();
    let mut model = [true; CAPACITY];

    for op in data.chunks_exact(3) {
        let (a, b) = (usize::from(op[1]) % CAPACITY, usize::from(op[2]) % CAPACITY);
        let chunk = Chunk::new(a.min(b), a.max(b)).unwrap();
        let is_add = op[0] & 1 == 0;
        if is_add {
            free.add(chunk).unwrap();
        } else {
            free.remove(chunk).unwrap();
        }
        model[chunk.lo()..=chunk.hi()].fill(is_add);

        let mut expected = Vec::new();
        let mut start = None;
        for (i, &is_free) in model.iter().chain(std::iter::once(&false)).enumerate() {
            match (is_free, start) {
                (true, None) => start = Some(i),
                (false, Some(lo)) => {
                    expected.push(Chunk::new(lo, i - 1).unwrap());
                    start = None;
                }
                _ => {}
            }
        }
        assert_eq!(free.chunks(), expected.as_slice());
    }
});
