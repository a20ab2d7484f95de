//! Pooled allocator configuration.

use serde::{Deserialize, Serialize};

/// Options for a [`PooledAllocator`](crate::PooledAllocator) instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolOptions {
    /// Number of available entries the shared pool should hold once the
    /// allocator is constructed (0 = no pre-population).
    pub initial_size: usize,
    /// Emit allocation statistics when the allocator is dropped.
    pub log_statistics: bool,
    /// Warn when the allocator is dropped with vectors still checked out.
    pub warn_on_leak: bool,
}

impl Default for PoolOptions {
    fn default() -> Self {
        Self {
            initial_size: 0,
            log_statistics: false,
            warn_on_leak: true,
        }
    }
}

impl PoolOptions {
    /// Set the pre-population target.
    #[must_use]
    pub fn initial_size(mut self, initial_size: usize) -> Self {
        self.initial_size = initial_size;
        self
    }

    /// Enable or disable statistics at drop.
    #[must_use]
    pub fn log_statistics(mut self, enabled: bool) -> Self {
        self.log_statistics = enabled;
        self
    }

    /// Enable or disable the leak warning at drop.
    #[must_use]
    pub fn warn_on_leak(mut self, enabled: bool) -> Self {
        self.warn_on_leak = enabled;
        self
    }
}
