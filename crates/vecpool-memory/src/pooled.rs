//! Pooled allocator: reuses vectors through the shared pool of their type.

use std::any::type_name;
use std::mem::size_of;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::allocator::{saturating_decrement, Checkout, Reusable, VectorAllocator};
use crate::error::ReleaseError;
use crate::options::PoolOptions;
use crate::pool::Pool;
use crate::registry;
use crate::stats::{AllocatorStats, PoolSnapshot};

/// Allocator that keeps released vectors for later reuse.
///
/// All pooled allocators of the same vector type share one pool, so creating
/// an allocator per solver call costs nothing beyond two counters. Vectors
/// stay in the pool until [`release_unused_memory`](Self::release_unused_memory)
/// trims it.
///
/// Release is checked against the pool, not the instance: a vector handed
/// out by one allocator may be returned through another allocator of the
/// same type.
pub struct PooledAllocator<T> {
    pool: Arc<Pool<T>>,
    total_allocated: AtomicU64,
    current_allocated: AtomicU64,
    options: PoolOptions,
}

impl<T: Reusable> PooledAllocator<T> {
    /// Create an allocator with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::with_options(PoolOptions::default())
    }

    /// Create an allocator, pre-populating the shared pool so that at least
    /// `options.initial_size` vectors are available.
    #[must_use]
    pub fn with_options(options: PoolOptions) -> Self {
        let pool = registry::pool_for::<T>();
        if options.initial_size > 0 {
            pool.reserve(options.initial_size);
        }
        Self {
            pool,
            total_allocated: AtomicU64::new(0),
            current_allocated: AtomicU64::new(0),
            options,
        }
    }

    /// Destroy every available vector in the shared pool for `T`.
    ///
    /// Affects all allocators of this type; checked-out vectors and the
    /// allocators' counters are untouched. Returns the number destroyed.
    pub fn release_unused_memory() -> usize {
        registry::pool_for::<T>().release_unused()
    }

    /// Diagnostic view of the shared pool.
    #[must_use]
    pub fn pool_snapshot(&self) -> PoolSnapshot {
        self.pool.snapshot()
    }
}

impl<T> PooledAllocator<T> {
    /// Allocation counters for this instance.
    #[must_use]
    pub fn stats(&self) -> AllocatorStats {
        AllocatorStats {
            total_allocated: self.total_allocated.load(Ordering::Relaxed),
            current_allocated: self.current_allocated.load(Ordering::Relaxed),
        }
    }

    /// The shared pool this allocator draws from.
    #[must_use]
    pub fn pool(&self) -> &Pool<T> {
        &self.pool
    }

    /// Options this allocator was created with.
    #[must_use]
    pub fn options(&self) -> &PoolOptions {
        &self.options
    }
}

impl<T: Reusable> Default for PooledAllocator<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Reusable> VectorAllocator<T> for PooledAllocator<T> {
    fn allocate(&self) -> Checkout<T> {
        let checkout = self.pool.acquire();
        self.total_allocated.fetch_add(1, Ordering::Relaxed);
        self.current_allocated.fetch_add(1, Ordering::Relaxed);
        checkout
    }

    fn release(&self, vector: Checkout<T>) -> Result<(), ReleaseError<T>> {
        self.pool.give_back(vector)?;
        if !saturating_decrement(&self.current_allocated) {
            debug!(
                vector_type = type_name::<T>(),
                "Vector returned through an allocator with no outstanding checkouts"
            );
        }
        Ok(())
    }

    fn memory_consumption(&self) -> usize {
        size_of::<Self>() + self.pool.memory_consumption()
    }
}

impl<T> Drop for PooledAllocator<T> {
    fn drop(&mut self) {
        let stats = self.stats();
        if self.options.log_statistics {
            info!(
                vector_type = type_name::<T>(),
                total_allocated = stats.total_allocated,
                current_allocated = stats.current_allocated,
                pool_entries = self.pool.len(),
                "Pooled allocator statistics"
            );
        }
        if stats.current_allocated != 0 {
            self.pool.record_leak();
            if self.options.warn_on_leak {
                warn!(
                    vector_type = type_name::<T>(),
                    leaked = stats.current_allocated,
                    "Pooled allocator dropped with vectors still checked out"
                );
            }
        }
    }
}
