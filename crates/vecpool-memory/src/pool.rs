//! Shared vector storage backing every pooled allocator of one type.
//!
//! A pool is an ordered list of entries. Each entry owns one object while it
//! is available and remembers that the object is out while it is checked out.
//! Entries are appended on growth and removed only by trimming, which never
//! touches checked-out entries.

use std::any::type_name;
use std::mem::size_of;

use parking_lot::Mutex;
use tracing::warn;

use crate::allocator::{next_id, Checkout, Origin, Reusable};
use crate::error::ReleaseError;
use crate::stats::{AtomicPoolStats, PoolSnapshot, PoolStats};

enum Slot<T> {
    Available(Box<T>),
    CheckedOut,
}

struct Entry<T> {
    id: u64,
    /// Footprint measured when the object was last seen by the pool.
    bytes: usize,
    slot: Slot<T>,
}

impl<T> Entry<T> {
    fn is_available(&self) -> bool {
        matches!(self.slot, Slot::Available(_))
    }

    /// Take the object out if the entry is available.
    fn take(&mut self) -> Option<Box<T>> {
        match std::mem::replace(&mut self.slot, Slot::CheckedOut) {
            Slot::Available(object) => Some(object),
            Slot::CheckedOut => None,
        }
    }
}

struct Inner<T> {
    /// Sorted by id: ids only grow and removal preserves order.
    entries: Vec<Entry<T>>,
    next_entry: u64,
}

impl<T> Inner<T> {
    fn push(&mut self, bytes: usize, slot: Slot<T>) -> u64 {
        let id = self.next_entry;
        self.next_entry += 1;
        self.entries.push(Entry { id, bytes, slot });
        id
    }

    fn in_use(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_available()).count()
    }

    fn footprint(&self) -> usize {
        size_of::<Pool<T>>()
            + self.entries.capacity() * size_of::<Entry<T>>()
            + self.entries.iter().map(|e| e.bytes).sum::<usize>()
    }
}

/// Process-wide pool of reusable objects of type `T`.
///
/// Obtained through [`registry::pool_for`](crate::registry::pool_for);
/// allocation goes through [`PooledAllocator`](crate::PooledAllocator).
pub struct Pool<T> {
    id: u64,
    inner: Mutex<Inner<T>>,
    stats: AtomicPoolStats,
}

impl<T: Reusable> Pool<T> {
    pub(crate) fn new() -> Self {
        Self {
            id: next_id(),
            inner: Mutex::new(Inner {
                entries: Vec::new(),
                next_entry: 0,
            }),
            stats: AtomicPoolStats::new(),
        }
    }

    /// Hand out the first available object, or construct a new one.
    ///
    /// A panic in `T::default()` propagates with the pool unchanged.
    pub(crate) fn acquire(&self) -> Checkout<T> {
        let mut inner = self.inner.lock();
        let reused = inner
            .entries
            .iter_mut()
            .find_map(|entry| entry.take().map(|object| (entry.id, object)));

        let (entry, object) = match reused {
            Some(found) => {
                self.stats.record_reuse();
                found
            }
            None => {
                let object = Box::new(T::default());
                let id = inner.push(object.memory_consumption(), Slot::CheckedOut);
                self.stats.record_construct();
                (id, object)
            }
        };

        Checkout::new(
            object,
            Origin::Pooled {
                pool: self.id,
                entry,
            },
        )
    }

    /// Put a checked-out object back, marking its entry available.
    ///
    /// A refused checkout is handed back with the pool unchanged.
    pub(crate) fn give_back(&self, checkout: Checkout<T>) -> Result<(), ReleaseError<T>> {
        let Origin::Pooled { pool, entry } = checkout.origin() else {
            return Err(ReleaseError::not_allocated_here(checkout));
        };
        if pool != self.id {
            return Err(ReleaseError::not_allocated_here(checkout));
        }

        let mut inner = self.inner.lock();
        let Ok(index) = inner.entries.binary_search_by_key(&entry, |e| e.id) else {
            return Err(ReleaseError::not_allocated_here(checkout));
        };
        let found = &mut inner.entries[index];
        if found.is_available() {
            return Err(ReleaseError::not_allocated_here(checkout));
        }
        let object = checkout.into_object();
        found.bytes = object.memory_consumption();
        found.slot = Slot::Available(object);
        Ok(())
    }

    /// Construct objects until at least `count` entries are available.
    pub(crate) fn reserve(&self, count: usize) {
        let mut inner = self.inner.lock();
        let available = inner.entries.iter().filter(|e| e.is_available()).count();
        for _ in available..count {
            let object = Box::new(T::default());
            inner.push(object.memory_consumption(), Slot::Available(object));
            self.stats.record_construct();
        }
    }
}

impl<T> Pool<T> {
    /// Destroy every available object. Checked-out entries are kept.
    ///
    /// Returns the number of objects destroyed.
    pub fn release_unused(&self) -> usize {
        let mut inner = self.inner.lock();
        let before = inner.entries.len();
        inner.entries.retain(|e| !e.is_available());
        let removed = before - inner.entries.len();
        self.stats.record_trim(removed);
        removed
    }

    pub(crate) fn record_leak(&self) {
        self.stats.record_leak();
    }

    /// Number of entries, available or checked out.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the pool holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of checked-out entries.
    #[must_use]
    pub fn in_use(&self) -> usize {
        self.inner.lock().in_use()
    }

    /// Approximate bytes held by the pool, including checked-out objects at
    /// their last measured size.
    #[must_use]
    pub fn memory_consumption(&self) -> usize {
        self.inner.lock().footprint()
    }

    /// Lifetime counters.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        self.stats.snapshot()
    }

    /// Diagnostic view of the pool.
    #[must_use]
    pub fn snapshot(&self) -> PoolSnapshot {
        let inner = self.inner.lock();
        PoolSnapshot {
            type_name: type_name::<T>(),
            entries: inner.entries.len(),
            in_use: inner.in_use(),
            bytes: inner.footprint(),
            stats: self.stats.snapshot(),
        }
    }
}

impl<T> Drop for Pool<T> {
    fn drop(&mut self) {
        let inner = self.inner.get_mut();
        let in_use = inner.in_use();
        if in_use > 0 {
            warn!(
                vector_type = type_name::<T>(),
                in_use,
                entries = inner.entries.len(),
                "Vector pool torn down with vectors still checked out"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    use super::*;
    use crate::consumption::MemoryConsumption;
    use crate::error::MemoryError;

    #[test]
    fn acquire_constructs_when_empty() {
        let pool: Pool<Vec<f64>> = Pool::new();
        let v = pool.acquire();
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.in_use(), 1);
        assert_eq!(pool.stats().constructed, 1);
        pool.give_back(v).unwrap();
        assert_eq!(pool.in_use(), 0);
    }

    #[test]
    fn first_fit_reuse() {
        let pool: Pool<Vec<f64>> = Pool::new();
        let a = pool.acquire();
        let b = pool.acquire();
        let (id_a, id_b) = (a.id(), b.id());
        pool.give_back(b).unwrap();
        pool.give_back(a).unwrap();

        // Entry order, not release order, decides which one comes back.
        let again = pool.acquire();
        assert_eq!(again.id(), id_a);
        assert_ne!(again.id(), id_b);
        assert_eq!(pool.stats().reused, 1);
        pool.give_back(again).unwrap();
    }

    #[test]
    fn reused_contents_are_stale() {
        let pool: Pool<Vec<f64>> = Pool::new();
        let mut v = pool.acquire();
        v.resize(8, 2.5);
        pool.give_back(v).unwrap();
        let v = pool.acquire();
        assert_eq!(v.len(), 8);
        pool.give_back(v).unwrap();
    }

    #[test]
    fn give_back_tracks_footprint() {
        let pool: Pool<Vec<f64>> = Pool::new();
        let mut v = pool.acquire();
        let before = pool.memory_consumption();
        v.reserve_exact(1000);
        pool.give_back(v).unwrap();
        assert!(pool.memory_consumption() >= before + 1000 * 8);
    }

    #[test]
    fn give_back_rejects_other_pool() {
        let first: Pool<Vec<f64>> = Pool::new();
        let second: Pool<Vec<f64>> = Pool::new();
        let v = first.acquire();
        let err = second.give_back(v).unwrap_err();
        assert!(matches!(err.error(), MemoryError::NotAllocatedHere { .. }));
        assert_eq!(second.len(), 0);
        assert_eq!(first.in_use(), 1);

        first.give_back(err.into_checkout()).unwrap();
        assert_eq!(first.in_use(), 0);
        assert_eq!(first.release_unused(), 1);
    }

    #[test]
    fn reserve_tops_up_available_entries() {
        let pool: Pool<Vec<u8>> = Pool::new();
        pool.reserve(3);
        assert_eq!(pool.len(), 3);
        pool.reserve(3);
        assert_eq!(pool.len(), 3);

        let held = pool.acquire();
        pool.reserve(3);
        assert_eq!(pool.len(), 4);
        assert_eq!(pool.stats().constructed, 4);
        pool.give_back(held).unwrap();
    }

    #[test]
    fn release_unused_keeps_checked_out() {
        let pool: Pool<Vec<u8>> = Pool::new();
        let a = pool.acquire();
        let b = pool.acquire();
        let c = pool.acquire();
        pool.give_back(a).unwrap();
        pool.give_back(c).unwrap();

        assert_eq!(pool.release_unused(), 2);
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.in_use(), 1);
        assert_eq!(pool.stats().trimmed, 2);

        // The surviving entry is still found after removal around it.
        pool.give_back(b).unwrap();
        assert_eq!(pool.release_unused(), 1);
        assert!(pool.is_empty());
    }

    #[test]
    fn snapshot_reports_type_and_counts() {
        let pool: Pool<Vec<u16>> = Pool::new();
        let v = pool.acquire();
        let snap = pool.snapshot();
        assert!(snap.type_name.contains("Vec<u16>"));
        assert_eq!(snap.entries, 1);
        assert_eq!(snap.in_use, 1);
        assert!(snap.bytes >= size_of::<Pool<Vec<u16>>>());
        pool.give_back(v).unwrap();
    }

    static FAIL_CONSTRUCTION: AtomicBool = AtomicBool::new(false);

    struct Fragile(Vec<f64>);

    impl Default for Fragile {
        fn default() -> Self {
            assert!(
                !FAIL_CONSTRUCTION.load(Ordering::SeqCst),
                "construction failed"
            );
            Self(Vec::new())
        }
    }

    impl MemoryConsumption for Fragile {
        fn memory_consumption(&self) -> usize {
            self.0.memory_consumption()
        }
    }

    #[test]
    fn construction_panic_leaves_pool_unchanged() {
        let pool: Pool<Fragile> = Pool::new();
        let held = pool.acquire();

        FAIL_CONSTRUCTION.store(true, Ordering::SeqCst);
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| pool.acquire()));
        FAIL_CONSTRUCTION.store(false, Ordering::SeqCst);

        assert!(result.is_err());
        assert_eq!(pool.len(), 1);
        assert_eq!(pool.stats().constructed, 1);

        // The lock is still usable after the panic.
        pool.give_back(held).unwrap();
        let again = pool.acquire();
        assert_eq!(pool.len(), 1);
        pool.give_back(again).unwrap();
    }

    #[test]
    fn concurrent_checkouts_are_exclusive() {
        let pool: Arc<Pool<Vec<u64>>> = Arc::new(Pool::new());
        let handles: Vec<_> = (0..8u64)
            .map(|tag| {
                let pool = Arc::clone(&pool);
                std::thread::spawn(move || {
                    for _ in 0..200 {
                        let mut v = pool.acquire();
                        v.clear();
                        v.push(tag);
                        std::thread::yield_now();
                        // Nobody else may have touched our vector meanwhile.
                        assert_eq!(v.as_slice(), &[tag]);
                        pool.give_back(v).unwrap();
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert_eq!(pool.in_use(), 0);
        assert!(pool.len() <= 8);
    }
}
