//! Process-wide registry of vector pools, keyed by vector type.
//!
//! The registry is created at compile time and filled lazily: the first
//! [`pool_for::<T>()`](pool_for) call creates the pool for `T`, every later
//! call returns the same pool. [`teardown`] detaches all pools for a
//! controlled shutdown.

use std::any::{Any, TypeId};
use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::{const_rwlock, RwLock};
use tracing::debug;

use crate::allocator::Reusable;
use crate::pool::Pool;
use crate::stats::PoolSnapshot;

/// Type-erased operations the registry runs across all pools.
trait ErasedPool: Send + Sync {
    fn release_unused(&self) -> usize;
    fn snapshot(&self) -> PoolSnapshot;
}

impl<T: Reusable> ErasedPool for Pool<T> {
    fn release_unused(&self) -> usize {
        Pool::release_unused(self)
    }

    fn snapshot(&self) -> PoolSnapshot {
        Pool::snapshot(self)
    }
}

struct Registered {
    typed: Arc<dyn Any + Send + Sync>,
    erased: Arc<dyn ErasedPool>,
}

static REGISTRY: RwLock<BTreeMap<TypeId, Registered>> = const_rwlock(BTreeMap::new());

fn downcast<T: Reusable>(registered: &Registered) -> Arc<Pool<T>> {
    Arc::clone(&registered.typed)
        .downcast::<Pool<T>>()
        .unwrap_or_else(|_| unreachable!("registry entries are keyed by their pool's type"))
}

/// The shared pool for vectors of type `T`, created on first use.
pub fn pool_for<T: Reusable>() -> Arc<Pool<T>> {
    let key = TypeId::of::<T>();
    if let Some(registered) = REGISTRY.read().get(&key) {
        return downcast(registered);
    }

    let mut registry = REGISTRY.write();
    let registered = registry.entry(key).or_insert_with(|| {
        debug!(vector_type = std::any::type_name::<T>(), "Creating vector pool");
        let pool = Arc::new(Pool::<T>::new());
        Registered {
            typed: Arc::clone(&pool) as Arc<dyn Any + Send + Sync>,
            erased: pool,
        }
    });
    downcast(registered)
}

fn registered_pools() -> Vec<Arc<dyn ErasedPool>> {
    REGISTRY
        .read()
        .values()
        .map(|registered| Arc::clone(&registered.erased))
        .collect()
}

/// Destroy every available vector in every registered pool.
///
/// Checked-out vectors are untouched. Returns the number of vectors destroyed.
pub fn release_all_unused_memory() -> usize {
    let released: usize = registered_pools()
        .iter()
        .map(|pool| pool.release_unused())
        .sum();
    debug!(released, "Released unused vectors from all pools");
    released
}

/// Diagnostic view of every registered pool, sorted by type name.
pub fn snapshot() -> Vec<PoolSnapshot> {
    let mut snapshots: Vec<PoolSnapshot> =
        registered_pools().iter().map(|pool| pool.snapshot()).collect();
    snapshots.sort_by(|a, b| a.type_name.cmp(b.type_name));
    snapshots
}

/// Detach every pool from the registry.
///
/// A pool is destroyed once the last allocator using it is dropped; a pool
/// destroyed with vectors still checked out reports them as leaked.
/// Allocators created afterwards start from fresh pools. Returns the number
/// of pools detached.
pub fn teardown() -> usize {
    let detached = std::mem::take(&mut *REGISTRY.write());
    let count = detached.len();
    drop(detached);
    debug!(pools = count, "Vector pool registry torn down");
    count
}
