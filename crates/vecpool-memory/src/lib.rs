//! # vecpool-memory
//!
//! Vector memory management for iterative solvers.
//!
//! Solvers obtain their auxiliary vectors through a [`VectorAllocator`].
//! Two strategies are provided:
//!
//! - [`DirectAllocator`] constructs a fresh vector on every request and drops
//!   it on release.
//! - [`PooledAllocator`] draws from a process-wide pool shared by every
//!   allocator of the same vector type. Released vectors are kept for reuse
//!   until [`PooledAllocator::release_unused_memory`] (or
//!   [`release_all_unused_memory`]) trims them.
//!
//! [`ScopedVector`] ties one checkout to a lexical scope and returns it to its
//! allocator on every exit path.
#![warn(missing_docs)]

pub mod allocator;
pub mod consumption;
pub mod error;
pub mod options;
pub mod pool;
pub mod pooled;
pub mod registry;
pub mod scoped;
pub mod stats;

pub use allocator::{Checkout, DirectAllocator, ObjectId, Reusable, VectorAllocator};
pub use consumption::MemoryConsumption;
pub use error::{MemoryError, ReleaseError};
pub use options::PoolOptions;
pub use pool::Pool;
pub use pooled::PooledAllocator;
pub use registry::{release_all_unused_memory, snapshot, teardown};
pub use scoped::ScopedVector;
pub use stats::{AllocatorStats, PoolSnapshot, PoolStats};
