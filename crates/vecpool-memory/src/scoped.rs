//! Scoped vector handle: returns its checkout on every exit path.

use std::fmt;
use std::ops::{Deref, DerefMut};

use tracing::error;

use crate::allocator::{Checkout, ObjectId, VectorAllocator};
use crate::error::ReleaseError;

/// A vector borrowed from an allocator for the lifetime of a scope.
///
/// Construction allocates; dropping releases, whether the scope ends
/// normally, returns early, or unwinds. The handle is the sole owner of its
/// vector and cannot be cloned.
///
/// ```
/// use vecpool_memory::{PooledAllocator, ScopedVector};
///
/// let memory = PooledAllocator::<Vec<f64>>::new();
/// {
///     let mut tmp = ScopedVector::<Vec<f64>>::new(&memory);
///     tmp.clear();
///     tmp.resize(4, 0.0);
/// }
/// assert_eq!(memory.stats().current_allocated, 0);
/// ```
pub struct ScopedVector<'a, T> {
    allocator: &'a dyn VectorAllocator<T>,
    /// `None` only once `release` or `into_checkout` consumed the handle.
    checkout: Option<Checkout<T>>,
}

impl<'a, T> ScopedVector<'a, T> {
    /// Allocate a vector from `allocator`.
    pub fn new(allocator: &'a dyn VectorAllocator<T>) -> Self {
        let checkout = allocator.allocate();
        Self {
            allocator,
            checkout: Some(checkout),
        }
    }

    /// Identity of the underlying vector.
    #[must_use]
    pub fn id(&self) -> ObjectId {
        self.checkout().id()
    }

    /// Release now and report the outcome, instead of on drop.
    ///
    /// A refused release hands the checkout back inside the error.
    pub fn release(mut self) -> Result<(), ReleaseError<T>> {
        match self.checkout.take() {
            Some(checkout) => self.allocator.release(checkout),
            None => Ok(()),
        }
    }

    /// Detach the vector; the caller becomes responsible for releasing it.
    pub fn into_checkout(mut self) -> Checkout<T> {
        self.checkout
            .take()
            .unwrap_or_else(|| unreachable!("scoped vector holds its checkout until consumed"))
    }

    fn checkout(&self) -> &Checkout<T> {
        self.checkout
            .as_ref()
            .unwrap_or_else(|| unreachable!("scoped vector holds its checkout until consumed"))
    }

    fn checkout_mut(&mut self) -> &mut Checkout<T> {
        self.checkout
            .as_mut()
            .unwrap_or_else(|| unreachable!("scoped vector holds its checkout until consumed"))
    }
}

impl<T> Deref for ScopedVector<'_, T> {
    type Target = T;

    fn deref(&self) -> &T {
        self.checkout()
    }
}

impl<T> DerefMut for ScopedVector<'_, T> {
    fn deref_mut(&mut self) -> &mut T {
        self.checkout_mut()
    }
}

impl<T> AsRef<T> for ScopedVector<'_, T> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T> AsMut<T> for ScopedVector<'_, T> {
    fn as_mut(&mut self) -> &mut T {
        self
    }
}

impl<T: fmt::Debug> fmt::Debug for ScopedVector<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("ScopedVector").field(&self.checkout).finish()
    }
}

impl<T> Drop for ScopedVector<'_, T> {
    fn drop(&mut self) {
        if let Some(checkout) = self.checkout.take() {
            if let Err(err) = self.allocator.release(checkout) {
                error!(%err, "Failed to return scoped vector to its allocator");
            }
        }
    }
}
