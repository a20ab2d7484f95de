//! Allocator error types.

use std::fmt;

use crate::allocator::Checkout;

/// Errors reported by vector allocators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MemoryError {
    /// A vector was handed back to an allocator that never handed it out.
    #[error("vector of type {type_name} was not allocated by this allocator")]
    NotAllocatedHere {
        /// Name of the vector type involved.
        type_name: &'static str,
    },
}

impl MemoryError {
    pub(crate) fn not_allocated_here<T>() -> Self {
        Self::NotAllocatedHere {
            type_name: std::any::type_name::<T>(),
        }
    }
}

/// A release that was refused, carrying the checkout back to the caller.
///
/// The vector and any pool entry it occupies are left exactly as they were,
/// so the checkout can still be returned to the allocator that handed it out.
#[derive(thiserror::Error)]
#[error("{error}")]
pub struct ReleaseError<T> {
    error: MemoryError,
    checkout: Checkout<T>,
}

impl<T> ReleaseError<T> {
    pub(crate) fn not_allocated_here(checkout: Checkout<T>) -> Self {
        Self {
            error: MemoryError::not_allocated_here::<T>(),
            checkout,
        }
    }

    /// Why the release was refused.
    #[must_use]
    pub fn error(&self) -> &MemoryError {
        &self.error
    }

    /// Take the rejected checkout back.
    pub fn into_checkout(self) -> Checkout<T> {
        self.checkout
    }

    /// Split into the error and the rejected checkout.
    pub fn into_parts(self) -> (MemoryError, Checkout<T>) {
        (self.error, self.checkout)
    }
}

impl<T> fmt::Debug for ReleaseError<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReleaseError")
            .field("error", &self.error)
            .field("checkout", &self.checkout.id())
            .finish()
    }
}
