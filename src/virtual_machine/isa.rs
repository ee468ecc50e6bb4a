//! Instruction Set Architecture (ISA) definitions.
//!
//! Defines the VM's instruction set. The [`for_each_instruction!`](crate::for_each_instruction) macro holds
//! the canonical instruction definitions and invokes a callback macro for code
//! generation, so the decoder here and the builder in [`program`](super::program)
//! are produced from one table.
//!
//! This module generates:
//! - The [`Instruction`] enum with opcode mappings
//! - `TryFrom<Word>` for decoding opcodes
//! - Operand layout and class queries used by the interpreter
//!
//! # Bytecode Format
//!
//! Every field is one machine [`Word`]:
//! - Opcode: 1 word
//! - Register operand (`Reg`): 1 word, the register index multiplied by [`WORD_SIZE`]
//! - Immediate (`Imm`): 1 word, a literal value or an absolute jump target
//!
//! Jump targets are word indices into the instruction stream, not byte offsets.

use crate::virtual_machine::errors::VMError;

/// Native unsigned machine word used for opcodes, operands and register contents.
pub type Word = usize;

/// Width of a [`Word`] in bytes; register operands are encoded as `index * WORD_SIZE`.
pub const WORD_SIZE: usize = std::mem::size_of::<Word>();

/// Invokes a callback macro with the complete instruction definition list.
///
/// Each entry reads `Variant = opcode, "MNEMONIC", builder => [operands], Class`.
#[macro_export]
macro_rules! for_each_instruction {
    ($callback:ident) => {
        $callback! {
            // =========================
            // Integer arithmetic
            // =========================
            /// ADD rd, rs1, rs2 ; rd = rs1 + rs2 (wrapping)
            Add = 0, "ADD", add => [rd: Reg, rs1: Reg, rs2: Reg], Arithmetic,
            /// ADDI rd, rs1, imm ; rd = rs1 + imm (wrapping)
            Addi = 1, "ADDI", addi => [rd: Reg, rs1: Reg, imm: Imm], Arithmetic,
            /// SUB rd, rs1, rs2 ; rd = rs1 - rs2 (wrapping)
            Sub = 2, "SUB", sub => [rd: Reg, rs1: Reg, rs2: Reg], Arithmetic,
            /// MUL rd, rs1, rs2 ; rd = rs1 * rs2 (wrapping)
            Mul = 3, "MUL", mul => [rd: Reg, rs1: Reg, rs2: Reg], Arithmetic,
            /// DIV rd, rs1, rs2 ; rd = rs1 / rs2 (trap on division by zero)
            Div = 4, "DIV", div => [rd: Reg, rs1: Reg, rs2: Reg], Division,
            /// REM rd, rs1, rs2 ; rd = rs1 % rs2 (trap on division by zero)
            Rem = 5, "REM", rem => [rd: Reg, rs1: Reg, rs2: Reg], Division,
            // =========================
            // Control Flow
            // =========================
            /// JAL rd, target ; ip = target (rd is decoded but not written)
            Jal = 6, "JAL", jal => [rd: Reg, target: Imm], Jump,
            /// BEQ rs1, rs2, target ; if rs1 == rs2 then ip = target
            Beq = 7, "BEQ", beq => [rs1: Reg, rs2: Reg, target: Imm], Branch,
            /// BNE rs1, rs2, target ; if rs1 != rs2 then ip = target
            Bne = 8, "BNE", bne => [rs1: Reg, rs2: Reg, target: Imm], Branch,
            /// BLT rs1, rs2, target ; if rs1 < rs2 (unsigned) then ip = target
            Blt = 9, "BLT", blt => [rs1: Reg, rs2: Reg, target: Imm], Branch,
            /// BGE rs1, rs2, target ; if rs1 >= rs2 (unsigned) then ip = target
            Bge = 10, "BGE", bge => [rs1: Reg, rs2: Reg, target: Imm], Branch,
        }
    };
}

/// Kind of word that follows an opcode.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum OperandKind {
    /// Register byte offset.
    Reg,
    /// Literal value or absolute jump target.
    Imm,
}

/// Coarse grouping of instructions, used for step accounting.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum InstrClass {
    Arithmetic,
    Division,
    Jump,
    Branch,
}

macro_rules! define_instructions {
    (
        $(
            $(#[$doc:meta])*
            $name:ident = $opcode:literal, $mnemonic:literal, $builder:ident => [
                $( $field:ident : $kind:ident ),* $(,)?
            ], $class:ident
        ),* $(,)?
    ) => {
        // =========================
        // VM instruction enum
        // =========================
        #[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
        #[repr(usize)]
        pub enum Instruction {
            $(
                $(#[$doc])*
                $name = $opcode,
            )*
        }

        impl TryFrom<Word> for Instruction {
            type Error = VMError;

            fn try_from(value: Word) -> Result<Self, Self::Error> {
                match value {
                    $( $opcode => Ok(Instruction::$name), )*
                    _ => Err(VMError::InvalidOpcode {
                        opcode: value,
                        ip: 0,
                    }),
                }
            }
        }

        impl Instruction {
            /// Every instruction in opcode order.
            pub const ALL: &'static [Instruction] = &[$( Instruction::$name ),*];

            /// Returns the assembly mnemonic for this instruction.
            pub const fn mnemonic(&self) -> &'static str {
                match self {
                    $( Instruction::$name => $mnemonic, )*
                }
            }

            /// Returns the kinds of the operand words following the opcode.
            pub const fn operands(&self) -> &'static [OperandKind] {
                match self {
                    $( Instruction::$name => &[$( OperandKind::$kind ),*], )*
                }
            }

            pub const fn class(&self) -> InstrClass {
                match self {
                    $( Instruction::$name => InstrClass::$class, )*
                }
            }
        }
    };
}

for_each_instruction!(define_instructions);

impl Instruction {
    /// Returns the opcode word.
    pub const fn opcode(&self) -> Word {
        *self as Word
    }

    /// Number of words the encoded instruction occupies, opcode included.
    pub const fn width(&self) -> usize {
        1 + self.operands().len()
    }
}
