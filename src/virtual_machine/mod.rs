//! Register-based bytecode virtual machine.
//!
//! # Architecture
//!
//! - **Registers**: 32 unsigned machine words, addressed in bytecode by byte
//!   offset (`index * WORD_SIZE`)
//! - **Zero register**: `zero` is zero by convention only; the engine does not guard it
//! - **Instruction format**: one opcode word followed by one word per operand
//! - **Execution model**: wrapping integer arithmetic, division, unconditional
//!   jumps and unsigned conditional branches to absolute word indices
//! - **Step budget**: runs may be bounded by a step limit, with per-category profiling
//!
//! # Modules
//!
//! - [`errors`]: Execution error types
//! - [`isa`]: Instruction set definition and opcode mappings
//! - [`program`]: Typed builder for instruction streams
//! - [`register`]: Register indices and ABI names
//! - [`vm`]: Core virtual machine implementation and step accounting
//! - [`word_store`]: Growable word buffer shared by the register file and the instruction stream

pub mod errors;
pub mod isa;
#[cfg(test)]
mod isa_static_check;
pub mod program;
pub mod register;
pub mod vm;
pub mod word_store;
