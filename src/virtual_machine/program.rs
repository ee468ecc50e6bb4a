//! In-memory program construction.
//!
//! [`Program`] is a word buffer with one chainable method per instruction,
//! generated from the ISA table. Branch targets are word indices; use
//! [`Program::len`] before emitting an instruction to capture its address.
//!
//! ```
//! use regvm::virtual_machine::program::Program;
//! use regvm::virtual_machine::register::Register;
//!
//! let mut program = Program::new();
//! program.addi(Register::A0, Register::ZERO, 15);
//! let body = program.len();
//! program
//!     .addi(Register::A1, Register::A1, 1)
//!     .blt(Register::A1, Register::A0, body);
//! assert_eq!(program.len(), 12);
//! ```

use crate::virtual_machine::isa::{Instruction, Word};
use crate::virtual_machine::register::Register;

/// Encoded instruction words ready to be loaded into a VM.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Program {
    words: Vec<Word>,
}

macro_rules! define_builders {
    // ---------- types ----------
    (@ty Reg) => { Register };
    (@ty Imm) => { Word };

    // ---------- encoding ----------
    (@word Reg, $v:ident) => { $v.offset() };
    (@word Imm, $v:ident) => { $v };

    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:literal, $mnemonic:literal, $builder:ident => [
                $( $field:ident : $kind:ident ),* $(,)?
            ], $class:ident
        ),* $(,)?
    ) => {
        impl Program {
            $(
                $(#[$doc])*
                pub fn $builder(&mut self, $( $field: define_builders!(@ty $kind) ),*) -> &mut Self {
                    self.words.push(Instruction::$name.opcode());
                    $( self.words.push(define_builders!(@word $kind, $field)); )*
                    self
                }
            )*
        }
    };
}

crate::for_each_instruction!(define_builders);

impl Program {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an arbitrary word, bypassing the typed builders.
    pub fn raw(&mut self, word: Word) -> &mut Self {
        self.words.push(word);
        self
    }

    /// Number of words emitted so far, which is also the address of the next instruction.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    pub fn words(&self) -> &[Word] {
        &self.words
    }

    pub fn into_words(self) -> Vec<Word> {
        self.words
    }
}

impl From<Program> for Vec<Word> {
    fn from(program: Program) -> Self {
        program.words
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::virtual_machine::isa::WORD_SIZE;

    #[test]
    fn reference_program_matches_hand_encoding() {
        let mut program = Program::new();
        program.addi(Register::A0, Register::ZERO, 15);
        let body = program.len();
        program
            .addi(Register::A1, Register::A1, 1)
            .blt(Register::A1, Register::A0, body);

        let expected: Vec<Word> = vec![
            1, 10 * WORD_SIZE, 0, 15,
            1, 11 * WORD_SIZE, 11 * WORD_SIZE, 1,
            9, 11 * WORD_SIZE, 10 * WORD_SIZE, 4,
        ];
        assert_eq!(program.words(), expected.as_slice());
    }

    #[test]
    fn jal_emits_three_words() {
        let mut program = Program::new();
        program.jal(Register::RA, 7);
        assert_eq!(program.words(), &[6, WORD_SIZE, 7]);
        assert_eq!(program.len(), Instruction::Jal.width());
    }

    #[test]
    fn raw_words_are_appended_verbatim() {
        let mut program = Program::new();
        program.raw(255).raw(0);
        assert_eq!(program.into_words(), vec![255, 0]);
    }
}
