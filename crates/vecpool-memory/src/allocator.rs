//! Allocator trait, checkouts, and the direct (non-pooling) allocator.

use std::fmt;
use std::marker::PhantomData;
use std::mem::size_of;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};

use crate::consumption::MemoryConsumption;
use crate::error::ReleaseError;
use crate::stats::AllocatorStats;

/// Types that allocators can hand out.
///
/// Implemented for every `Default + MemoryConsumption + Send + 'static` type.
pub trait Reusable: Default + MemoryConsumption + Send + 'static {}

impl<T: Default + MemoryConsumption + Send + 'static> Reusable for T {}

/// Source of temporary vectors for iterative solvers.
///
/// Every successful [`allocate`](Self::allocate) must be matched by exactly
/// one [`release`](Self::release) on the same allocator, or the checkout
/// wrapped in a [`ScopedVector`](crate::ScopedVector) which does that on drop.
pub trait VectorAllocator<T>: Send + Sync {
    /// Hand out a vector. Its length and contents are unspecified; callers
    /// must resize and reset it before use.
    fn allocate(&self) -> Checkout<T>;

    /// Return a vector obtained from [`allocate`](Self::allocate).
    ///
    /// Returns a [`ReleaseError`] if the checkout did not come from this
    /// allocator. The error carries the checkout, untouched, so it can still
    /// be released to its own allocator.
    fn release(&self, vector: Checkout<T>) -> Result<(), ReleaseError<T>>;

    /// Approximate number of bytes held by this allocator.
    fn memory_consumption(&self) -> usize;
}

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

/// Process-unique id for allocators and pools.
pub(crate) fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Decrement without going below zero. Returns `false` if already zero.
pub(crate) fn saturating_decrement(counter: &AtomicU64) -> bool {
    counter
        .fetch_update(Ordering::AcqRel, Ordering::Acquire, |v| v.checked_sub(1))
        .is_ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum Origin {
    Direct { allocator: u64, serial: u64 },
    Pooled { pool: u64, entry: u64 },
}

/// Identity of a checked-out object.
///
/// Two checkouts carry the same id exactly when they hand out the same
/// underlying object, for example after a pooled vector was released and
/// allocated again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectId(Origin);

/// A vector handed out by a [`VectorAllocator`].
///
/// Dereferences to the vector. Not `Clone`: releasing consumes it, so a
/// checkout can be returned at most once.
#[must_use = "a checkout that is dropped instead of released stays checked out"]
pub struct Checkout<T> {
    object: Box<T>,
    origin: Origin,
}

impl<T> Checkout<T> {
    pub(crate) fn new(object: Box<T>, origin: Origin) -> Self {
        Self { object, origin }
    }

    pub(crate) fn origin(&self) -> Origin {
        self.origin
    }

    pub(crate) fn into_object(self) -> Box<T> {
        self.object
    }

    /// Identity of the underlying object.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        ObjectId(self.origin)
    }
}

impl<T> Deref for Checkout<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.object
    }
}

impl<T> DerefMut for Checkout<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.object
    }
}

impl<T: fmt::Debug> fmt::Debug for Checkout<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Checkout")
            .field("origin", &self.origin)
            .field("object", &self.object)
            .finish()
    }
}

/// Allocator that constructs a new vector on every request and drops it on
/// release.
///
/// Suitable for solvers that run once or rarely; the pooled allocator is the
/// better choice inside nested iterations.
pub struct DirectAllocator<T> {
    id: u64,
    next_serial: AtomicU64,
    total_allocated: AtomicU64,
    current_allocated: AtomicU64,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Reusable> DirectAllocator<T> {
    /// Create a new direct allocator.
    #[must_use]
    pub fn new() -> Self {
        Self {
            id: next_id(),
            next_serial: AtomicU64::new(0),
            total_allocated: AtomicU64::new(0),
            current_allocated: AtomicU64::new(0),
            _marker: PhantomData,
        }
    }

    /// Allocation counters for this instance.
    #[must_use]
    pub fn stats(&self) -> AllocatorStats {
        AllocatorStats {
            total_allocated: self.total_allocated.load(Ordering::Relaxed),
            current_allocated: self.current_allocated.load(Ordering::Relaxed),
        }
    }
}

impl<T: Reusable> Default for DirectAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Reusable> VectorAllocator<T> for DirectAllocator<T> {
    fn allocate(&self) -> Checkout<T> {
        let object = Box::new(T::default());
        let serial = self.next_serial.fetch_add(1, Ordering::Relaxed);
        self.total_allocated.fetch_add(1, Ordering::Relaxed);
        self.current_allocated.fetch_add(1, Ordering::Relaxed);
        Checkout::new(
            object,
            Origin::Direct {
                allocator: self.id,
                serial,
            },
        )
    }

    fn release(&self, vector: Checkout<T>) -> Result<(), ReleaseError<T>> {
        match vector.origin() {
            Origin::Direct { allocator, .. } if allocator == self.id => {
                drop(vector);
                saturating_decrement(&self.current_allocated);
                Ok(())
            }
            _ => Err(ReleaseError::not_allocated_here(vector)),
        }
    }

    fn memory_consumption(&self) -> usize {
        size_of::<Self>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MemoryError;

    #[test]
    fn direct_allocate_release() {
        let alloc = DirectAllocator::<Vec<f64>>::new();
        let mut v = alloc.allocate();
        v.resize(10, 1.0);
        assert_eq!(v.len(), 10);
        assert_eq!(alloc.stats().current_allocated, 1);
        alloc.release(v).unwrap();
        let stats = alloc.stats();
        assert_eq!(stats.total_allocated, 1);
        assert_eq!(stats.current_allocated, 0);
    }

    #[test]
    fn direct_always_constructs_fresh() {
        let alloc = DirectAllocator::<Vec<f64>>::new();
        let mut v = alloc.allocate();
        v.push(3.0);
        let first = v.id();
        alloc.release(v).unwrap();
        let v = alloc.allocate();
        assert!(v.is_empty());
        assert_ne!(v.id(), first);
        alloc.release(v).unwrap();
    }

    #[test]
    fn direct_rejects_foreign_checkout() {
        let a = DirectAllocator::<Vec<f64>>::new();
        let b = DirectAllocator::<Vec<f64>>::new();
        let v = a.allocate();
        let err = b.release(v).unwrap_err();
        assert!(matches!(err.error(), MemoryError::NotAllocatedHere { .. }));
        // a still counts its checkout as outstanding
        assert_eq!(a.stats().current_allocated, 1);
        assert_eq!(b.stats().current_allocated, 0);

        a.release(err.into_checkout()).unwrap();
        assert_eq!(a.stats().current_allocated, 0);
    }

    #[test]
    fn saturating_decrement_stops_at_zero() {
        let counter = AtomicU64::new(1);
        assert!(saturating_decrement(&counter));
        assert!(!saturating_decrement(&counter));
        assert_eq!(counter.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn allocators_are_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<DirectAllocator<Vec<f64>>>();
        assert_send_sync::<Checkout<Vec<f64>>>();
    }

    #[test]
    fn trait_object_usable() {
        let alloc = DirectAllocator::<Vec<u32>>::new();
        let dyn_alloc: &dyn VectorAllocator<Vec<u32>> = &alloc;
        let v = dyn_alloc.allocate();
        dyn_alloc.release(v).unwrap();
        assert!(dyn_alloc.memory_consumption() >= size_of::<DirectAllocator<Vec<u32>>>());
    }
}
