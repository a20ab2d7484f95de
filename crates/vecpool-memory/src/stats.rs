//! Atomic pool statistics for lock-free usage tracking.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Statistics for one shared pool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PoolStats {
    /// Allocations served by an available entry.
    pub reused: u64,
    /// Objects constructed, on a miss or by pre-population.
    pub constructed: u64,
    /// Objects destroyed by trimming.
    pub trimmed: u64,
    /// Allocator instances dropped with vectors still checked out.
    pub leaks: u64,
}

impl PoolStats {
    /// Fraction of allocations served from the pool, in `[0, 1]`.
    #[must_use]
    #[allow(clippy::cast_precision_loss)]
    pub fn reuse_ratio(&self) -> f64 {
        let total = self.reused + self.constructed;
        if total == 0 {
            0.0
        } else {
            self.reused as f64 / total as f64
        }
    }
}

/// Atomic pool statistics for lock-free updates.
pub(crate) struct AtomicPoolStats {
    reused: AtomicU64,
    constructed: AtomicU64,
    trimmed: AtomicU64,
    leaks: AtomicU64,
}

impl AtomicPoolStats {
    /// Create new zeroed stats.
    pub(crate) const fn new() -> Self {
        Self {
            reused: AtomicU64::new(0),
            constructed: AtomicU64::new(0),
            trimmed: AtomicU64::new(0),
            leaks: AtomicU64::new(0),
        }
    }

    /// Take a snapshot of current stats.
    pub(crate) fn snapshot(&self) -> PoolStats {
        PoolStats {
            reused: self.reused.load(Ordering::Relaxed),
            constructed: self.constructed.load(Ordering::Relaxed),
            trimmed: self.trimmed.load(Ordering::Relaxed),
            leaks: self.leaks.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn record_reuse(&self) {
        self.reused.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_construct(&self) {
        self.constructed.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_trim(&self, count: usize) {
        self.trimmed.fetch_add(count as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_leak(&self) {
        self.leaks.fetch_add(1, Ordering::Relaxed);
    }
}

impl Default for AtomicPoolStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Per-instance allocation counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct AllocatorStats {
    /// Successful `allocate` calls over the instance's lifetime.
    pub total_allocated: u64,
    /// Checkouts not yet released through this instance.
    pub current_allocated: u64,
}

/// Diagnostic view of one shared pool.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PoolSnapshot {
    /// Name of the pooled vector type.
    pub type_name: &'static str,
    /// Entries currently held, available or checked out.
    pub entries: usize,
    /// Entries currently checked out.
    pub in_use: usize,
    /// Approximate bytes held by the pool and its entries.
    pub bytes: usize,
    /// Lifetime counters.
    pub stats: PoolStats,
}

impl PoolSnapshot {
    /// Entries ready to be handed out.
    #[must_use]
    pub fn available(&self) -> usize {
        self.entries - self.in_use
    }
}
