//! Register-based bytecode interpreter.
//!
//! Provides a word-addressed virtual machine, its instruction set and a typed
//! program builder, along with leveled terminal logging.

pub mod utils;
pub mod virtual_machine;
