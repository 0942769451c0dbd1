//! Length/capacity-separated attribute buffer
//!
//! [`GrowableArray`] keeps a zero-initialized backing store whose size is the
//! capacity and tracks the live length separately, so vertex attribute slots
//! can be appended, grown to a synthetic index and removed again without a
//! full reallocation on every step. Single-writer, single-thread use only.

use std::ops::{Index, IndexMut};

use bytemuck::Zeroable;

use crate::{Error, Result};

/// Options for [`GrowableArray::resize`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ResizeOptions {
    /// Shrink the backing storage to the new length afterwards.
    pub trim_excess: bool,
    /// Zero every slot that enters or leaves the live range.
    pub clear_memory: bool,
}

impl ResizeOptions {
    /// Zero-fill newly exposed and vacated slots, keep the capacity.
    pub fn cleared() -> Self {
        Self {
            trim_excess: false,
            clear_memory: true,
        }
    }
}

/// A dynamic array over `T` with explicit length and capacity.
#[derive(Debug, Clone)]
pub struct GrowableArray<T> {
    items: Vec<T>,
    length: usize,
}

impl<T: Copy + Zeroable> GrowableArray<T> {
    /// Create an empty array without allocating.
    pub fn new() -> Self {
        Self {
            items: Vec::new(),
            length: 0,
        }
    }

    /// Create an empty array with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: vec![T::zeroed(); capacity],
            length: 0,
        }
    }

    /// Copy `values` into a new array whose length and capacity equal `values.len()`.
    pub fn from_slice(values: &[T]) -> Self {
        Self {
            items: values.to_vec(),
            length: values.len(),
        }
    }

    pub fn len(&self) -> usize {
        self.length
    }

    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    pub fn capacity(&self) -> usize {
        self.items.len()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.as_slice().get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let length = self.length;
        self.items[..length].get_mut(index)
    }

    /// The live elements.
    pub fn as_slice(&self) -> &[T] {
        &self.items[..self.length]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    /// Append an element, doubling the capacity when full.
    pub fn push(&mut self, value: T) {
        if self.length >= self.items.len() {
            let doubled = (self.items.len() << 1).max(1);
            self.set_capacity(doubled);
        }
        self.items[self.length] = value;
        self.length += 1;
    }

    /// Set the live length to `length`.
    ///
    /// Growing past the capacity reallocates to exactly `length`; slots beyond
    /// the old capacity are always zero. With `clear_memory`, slots that leave
    /// or re-enter the live range are zeroed as well.
    pub fn resize(&mut self, length: usize, options: ResizeOptions) {
        if length > self.items.len() {
            self.set_capacity(length);
        }

        if options.clear_memory {
            let (lo, hi) = if length < self.length {
                (length, self.length)
            } else {
                (self.length, length)
            };
            self.items[lo..hi].fill(T::zeroed());
        }

        self.length = length;

        if options.trim_excess {
            self.trim_excess();
        }
    }

    /// Drop any capacity beyond the live length.
    pub fn trim_excess(&mut self) {
        if self.items.len() == self.length {
            return;
        }
        self.items.truncate(self.length);
        self.items.shrink_to_fit();
    }

    /// Remove the element at `index`, shifting the tail down by one.
    pub fn remove(&mut self, index: usize) -> Result<T> {
        if index >= self.length {
            return Err(Error::StructuralInvariant(format!(
                "remove index {} out of bounds for length {}",
                index, self.length
            )));
        }

        let removed = self.items[index];
        self.items[index..self.length].rotate_left(1);
        self.length -= 1;
        self.items[self.length] = T::zeroed();
        Ok(removed)
    }

    /// Remove every index in `sorted` (strictly ascending) in one pass.
    ///
    /// Equivalent to calling [`remove`](Self::remove) for each index from the
    /// highest down, without the repeated tail shifts.
    pub fn remove_sorted(&mut self, sorted: &[usize]) -> Result<()> {
        if let Some(&last) = sorted.last() {
            if last >= self.length {
                return Err(Error::StructuralInvariant(format!(
                    "remove index {} out of bounds for length {}",
                    last, self.length
                )));
            }
        }
        if sorted.windows(2).any(|w| w[0] >= w[1]) {
            return Err(Error::StructuralInvariant(
                "indices to remove must be strictly ascending".to_string(),
            ));
        }

        let mut pending = sorted.iter().peekable();
        let mut write = 0;
        for read in 0..self.length {
            if pending.next_if_eq(&&read).is_some() {
                continue;
            }
            self.items[write] = self.items[read];
            write += 1;
        }
        self.items[write..self.length].fill(T::zeroed());
        self.length = write;
        Ok(())
    }

    /// Zero the live range and set the length to zero.
    pub fn clear(&mut self) {
        self.items[..self.length].fill(T::zeroed());
        self.length = 0;
    }

    /// Copy the live elements into a fixed-size snapshot.
    pub fn to_vec(&self) -> Vec<T> {
        self.as_slice().to_vec()
    }

    fn set_capacity(&mut self, capacity: usize) {
        self.items.resize(capacity, T::zeroed());
    }
}

impl<T: Copy + Zeroable> Default for GrowableArray<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Copy + Zeroable> From<Vec<T>> for GrowableArray<T> {
    fn from(items: Vec<T>) -> Self {
        let length = items.len();
        Self { items, length }
    }
}

impl<T: Copy + Zeroable> Index<usize> for GrowableArray<T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        &self.as_slice()[index]
    }
}

impl<T: Copy + Zeroable> IndexMut<usize> for GrowableArray<T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let length = self.length;
        &mut self.items[..length][index]
    }
}
