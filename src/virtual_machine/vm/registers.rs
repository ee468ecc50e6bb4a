use crate::virtual_machine::errors::{Region, VMError};
use crate::virtual_machine::isa::{WORD_SIZE, Word};
use crate::virtual_machine::word_store::WordStore;

/// Register file holding VM storage.
///
/// Fixed-size after creation. Bytecode addresses registers by byte offset;
/// [`Registers::index_of`] turns an offset into an index and every other
/// method works on indices.
pub(super) struct Registers {
    store: WordStore<Word>,
}

impl Registers {
    /// Creates a register file with `count` zeroed registers.
    pub(super) fn new(count: usize) -> Result<Self, VMError> {
        let mut store = WordStore::with_capacity(count)?;
        store.push_back_default(count)?;
        Ok(Self { store })
    }

    pub(super) fn len(&self) -> usize {
        self.store.len()
    }

    /// Validates an encoded register operand and returns its register index.
    ///
    /// Returns [`VMError::MisalignedRegister`] if `offset` is not a multiple of
    /// the word size and [`VMError::OutOfBoundsAccess`] if it lies past the file.
    pub(super) fn index_of(&self, offset: Word, ip: usize) -> Result<usize, VMError> {
        if offset % WORD_SIZE != 0 {
            return Err(VMError::MisalignedRegister { offset, ip });
        }
        let index = offset / WORD_SIZE;
        if index >= self.len() {
            return Err(VMError::OutOfBoundsAccess {
                region: Region::Registers,
                index,
                len: self.len(),
            });
        }
        Ok(index)
    }

    /// Returns the value in register `idx`.
    pub(super) fn get(&self, idx: usize) -> Result<Word, VMError> {
        self.store.get(idx).ok_or(VMError::OutOfBoundsAccess {
            region: Region::Registers,
            index: idx,
            len: self.len(),
        })
    }

    /// Stores a value into register `idx`.
    pub(super) fn set(&mut self, idx: usize, v: Word) -> Result<(), VMError> {
        let len = self.len();
        let slot = self
            .store
            .get_mut(idx)
            .ok_or(VMError::OutOfBoundsAccess {
                region: Region::Registers,
                index: idx,
                len,
            })?;
        *slot = v;
        Ok(())
    }

    pub(super) fn as_slice(&self) -> &[Word] {
        self.store.as_slice()
    }
}
