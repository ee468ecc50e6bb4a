//! ABI register names.
//!
//! The VM itself only sees byte offsets; these names exist for the code that
//! builds programs and inspects results.

use crate::virtual_machine::isa::{WORD_SIZE, Word};
use std::fmt;

/// Number of registers in the register file.
pub const REGISTER_COUNT: usize = 32;

const NAMES: [&str; REGISTER_COUNT] = [
    "zero", "ra", "sp", "gp", "tp", "t0", "t1", "t2", "fp", "s1", "a0", "a1", "a2", "a3", "a4",
    "a5", "a6", "a7", "s2", "s3", "s4", "s5", "s6", "s7", "s8", "s9", "s10", "s11", "t3", "t4",
    "t5", "t6",
];

/// Index into the register file.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct Register(u8);

impl Register {
    /// Zero register. Programs keep it at zero by convention only.
    pub const ZERO: Register = Register(0);
    /// Return address.
    pub const RA: Register = Register(1);
    /// Stack pointer.
    pub const SP: Register = Register(2);
    /// Global pointer.
    pub const GP: Register = Register(3);
    /// Thread pointer.
    pub const TP: Register = Register(4);
    pub const T0: Register = Register(5);
    pub const T1: Register = Register(6);
    pub const T2: Register = Register(7);
    /// Frame pointer, shared with `S0`.
    pub const FP: Register = Register(8);
    pub const S0: Register = Register::FP;
    pub const S1: Register = Register(9);
    /// Argument registers.
    pub const A0: Register = Register(10);
    pub const A1: Register = Register(11);
    pub const A2: Register = Register(12);
    pub const A3: Register = Register(13);
    pub const A4: Register = Register(14);
    pub const A5: Register = Register(15);
    pub const A6: Register = Register(16);
    pub const A7: Register = Register(17);
    /// Saved registers.
    pub const S2: Register = Register(18);
    pub const S3: Register = Register(19);
    pub const S4: Register = Register(20);
    pub const S5: Register = Register(21);
    pub const S6: Register = Register(22);
    pub const S7: Register = Register(23);
    pub const S8: Register = Register(24);
    pub const S9: Register = Register(25);
    pub const S10: Register = Register(26);
    pub const S11: Register = Register(27);
    /// Temporaries.
    pub const T3: Register = Register(28);
    pub const T4: Register = Register(29);
    pub const T5: Register = Register(30);
    pub const T6: Register = Register(31);

    /// Returns the register with the given index, or `None` past the register file.
    pub const fn new(index: usize) -> Option<Register> {
        if index < REGISTER_COUNT {
            Some(Register(index as u8))
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    /// Byte offset used to encode this register as an operand.
    pub const fn offset(self) -> Word {
        self.index() * WORD_SIZE
    }

    /// ABI name, e.g. `a0`.
    pub const fn name(self) -> &'static str {
        NAMES[self.0 as usize]
    }

    /// Looks a register up by ABI name (`a1`, `s0`, `zero`, ...), case-insensitively.
    pub fn from_name(name: &str) -> Option<Register> {
        let lower = name.to_ascii_lowercase();
        if lower == "s0" {
            return Some(Register::S0);
        }
        NAMES
            .iter()
            .position(|n| *n == lower)
            .and_then(Register::new)
    }
}

impl fmt::Display for Register {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
