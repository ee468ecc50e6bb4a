//! Growable, index-addressed storage shared by the register file and the
//! instruction stream.
//!
//! Growth goes through [`Vec::try_reserve`], so running out of memory is
//! reported as [`VMError::Allocation`] rather than aborting the process.

use crate::virtual_machine::errors::VMError;

/// Contiguous buffer of `Copy` elements with fallible growth.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct WordStore<T> {
    items: Vec<T>,
}

impl<T: Copy + Default> WordStore<T> {
    /// Creates an empty store with room for `capacity` elements.
    pub fn with_capacity(capacity: usize) -> Result<Self, VMError> {
        let mut items = Vec::new();
        items
            .try_reserve_exact(capacity)
            .map_err(|_| VMError::Allocation {
                requested: capacity,
            })?;
        Ok(Self { items })
    }

    /// Number of elements currently stored.
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Returns the element at `index`, or `None` past the end.
    pub fn get(&self, index: usize) -> Option<T> {
        self.items.get(index).copied()
    }

    /// Returns a mutable reference to the element at `index`.
    ///
    /// The reference borrows the store, so it cannot outlive the next growth.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        self.items.get_mut(index)
    }

    /// Appends a copy of `data`.
    pub fn push_back_slice(&mut self, data: &[T]) -> Result<(), VMError> {
        self.reserve(data.len())?;
        self.items.extend_from_slice(data);
        Ok(())
    }

    /// Appends `count` default-valued elements.
    pub fn push_back_default(&mut self, count: usize) -> Result<(), VMError> {
        self.reserve(count)?;
        self.items
            .extend(std::iter::repeat_n(T::default(), count));
        Ok(())
    }

    /// Truncates or grows the store to `new_len`, filling new slots with the default value.
    pub fn resize(&mut self, new_len: usize) -> Result<(), VMError> {
        if new_len > self.items.len() {
            self.reserve(new_len - self.items.len())?;
        }
        self.items.resize(new_len, T::default());
        Ok(())
    }

    pub fn as_slice(&self) -> &[T] {
        &self.items
    }

    fn reserve(&mut self, additional: usize) -> Result<(), VMError> {
        self.items
            .try_reserve(additional)
            .map_err(|_| VMError::Allocation {
                requested: additional,
            })
    }
}
