use crate::virtual_machine::isa::Word;
use regvm_derive::Error;
use std::fmt;

/// Buffer touched by an out-of-bounds access.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Region {
    /// The instruction stream.
    Instructions,
    /// The register file.
    Registers,
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Region::Instructions => write!(f, "instruction stream"),
            Region::Registers => write!(f, "register file"),
        }
    }
}

/// Errors that can occur while building or running the VM.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum VMError {
    /// Backing storage could not be obtained or grown.
    #[error("allocation failed while reserving {requested} words")]
    Allocation { requested: usize },
    /// Unknown opcode encountered in bytecode.
    #[error("invalid opcode {opcode} at ip {ip}")]
    InvalidOpcode { opcode: Word, ip: usize },
    /// `DIV` or `REM` with a zero divisor.
    #[error("division by zero at ip {ip}")]
    DivisionByZero { ip: usize },
    /// Instruction fetch or register access outside the buffer.
    #[error("{region} index {index} out of bounds (len {len})")]
    OutOfBoundsAccess {
        region: Region,
        index: usize,
        len: usize,
    },
    /// Register operand that is not a multiple of the word size.
    #[error("register offset {offset} at ip {ip} is not word aligned")]
    MisalignedRegister { offset: Word, ip: usize },
    /// The configured step budget ran out.
    #[error("step limit of {limit} exceeded at ip {ip}")]
    StepLimitExceeded { limit: u64, ip: usize },
}
