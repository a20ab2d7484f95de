//! Approximate memory footprint of pooled objects.

use std::collections::VecDeque;
use std::mem::size_of;

/// Report the approximate number of bytes an object occupies, including heap
/// storage it owns.
pub trait MemoryConsumption {
    /// Bytes used by `self`, header included.
    fn memory_consumption(&self) -> usize;
}

impl<E> MemoryConsumption for Vec<E> {
    fn memory_consumption(&self) -> usize {
        size_of::<Self>() + self.capacity() * size_of::<E>()
    }
}

impl<E> MemoryConsumption for Box<[E]> {
    fn memory_consumption(&self) -> usize {
        size_of::<Self>() + self.len() * size_of::<E>()
    }
}

impl<E> MemoryConsumption for VecDeque<E> {
    fn memory_consumption(&self) -> usize {
        size_of::<Self>() + self.capacity() * size_of::<E>()
    }
}
