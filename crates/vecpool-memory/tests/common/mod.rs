//! Shared helpers for allocator integration tests.
//!
//! Pools are process-wide and keyed by type, so every test declares its own
//! vector type to stay independent of tests running in parallel.

/// Declare a vector type that counts how many instances were constructed and
/// stamps each instance with a construction serial.
macro_rules! counted_vector {
    ($name:ident) => {
        #[allow(dead_code)]
        struct $name {
            data: Vec<f64>,
            serial: usize,
        }

        #[allow(dead_code)]
        impl $name {
            fn counter() -> &'static std::sync::atomic::AtomicUsize {
                static CONSTRUCTED: std::sync::atomic::AtomicUsize =
                    std::sync::atomic::AtomicUsize::new(0);
                &CONSTRUCTED
            }

            fn constructed() -> usize {
                Self::counter().load(std::sync::atomic::Ordering::SeqCst)
            }
        }

        impl Default for $name {
            fn default() -> Self {
                let serial = Self::counter().fetch_add(1, std::sync::atomic::Ordering::SeqCst);
                Self {
                    data: Vec::new(),
                    serial,
                }
            }
        }

        impl vecpool_memory::MemoryConsumption for $name {
            fn memory_consumption(&self) -> usize {
                std::mem::size_of::<usize>()
                    + vecpool_memory::MemoryConsumption::memory_consumption(&self.data)
            }
        }
    };
}

pub(crate) use counted_vector;
