#![no_main]

use libfuzzer_sys::fuzz_target;

use vecpool_memory::{Checkout, DirectAllocator, PooledAllocator, VectorAllocator};

fuzz_target!(|data: &[u8]| {
    let pooled = PooledAllocator::<Vec<u8>>::new();
    let other = PooledAllocator::<Vec<u8>>::new();
    let direct = DirectAllocator::<Vec<u8>>::new();
    let mut held: Vec<Checkout<Vec<u8>>> = Vec::new();
    // The pool outlives each run and should come back to this level.
    let baseline = pooled.pool().in_use();

    // Each byte is one operation; the low bits pick it, the rest parameterise it.
    for &byte in data {
        let arg = usize::from(byte >> 3);
        match byte & 0b111 {
            0 | 1 => {
                let mut vector = pooled.allocate();
                vector.resize(arg, byte);
                held.push(vector);
            }
            2 | 3 if !held.is_empty() => {
                let vector = held.swap_remove(arg % held.len());
                pooled.release(vector).unwrap();
            }
            4 if !held.is_empty() => {
                // Any allocator of the same pool may take a vector back.
                let vector = held.swap_remove(arg % held.len());
                other.release(vector).unwrap();
            }
            5 if !held.is_empty() => {
                // A refused release hands the vector back untouched.
                let vector = held.swap_remove(arg % held.len());
                let id = vector.id();
                let vector = direct.release(vector).unwrap_err().into_checkout();
                assert_eq!(vector.id(), id);
                held.push(vector);
            }
            6 => {
                let before = pooled.pool().in_use();
                PooledAllocator::<Vec<u8>>::release_unused_memory();
                assert_eq!(pooled.pool().in_use(), before);
            }
            _ => {
                let vector = direct.allocate();
                let vector = pooled.release(vector).unwrap_err().into_checkout();
                direct.release(vector).unwrap();
            }
        }
        assert_eq!(pooled.pool().in_use(), held.len() + baseline);
    }

    for vector in held {
        pooled.release(vector).unwrap();
    }
    assert_eq!(pooled.pool().in_use(), baseline);
});
