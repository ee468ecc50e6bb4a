//! Core virtual machine implementation.
//!
//! The VM executes word-encoded bytecode against a 32-register file. All
//! arithmetic is unsigned and wrapping; division by zero, unknown opcodes and
//! out-of-range accesses stop the run with a [`VMError`].
//!
//! Each instruction is decoded in full (every operand word read and every
//! register operand validated) before any register is touched, and the
//! instruction pointer only moves once the instruction has succeeded. A failed
//! instruction therefore leaves `ip` on its own opcode.

mod profile;
mod registers;
#[cfg(test)]
mod tests;

pub use profile::{StepCategory, StepProfile};

use crate::virtual_machine::errors::{Region, VMError};
use crate::virtual_machine::isa::{Instruction, Word};
use crate::virtual_machine::register::REGISTER_COUNT;
use crate::virtual_machine::word_store::WordStore;
use registers::Registers;

/// Where the instruction pointer goes once an instruction has executed.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Flow {
    /// Continue with the instruction after the operands.
    Next,
    /// Continue at an absolute word index.
    Jump(Word),
}

macro_rules! exec_vm {
    (
        vm = $vm:ident,
        cursor = $cursor:ident,
        instr = $instr:ident,
        { $( $variant:ident => $handler:ident ( $( $field:ident : $kind:ident ),* $(,)? ) ),* $(,)? }
    ) => {{
        match $instr {
            $(
                Instruction::$variant => {
                    $( let $field = exec_vm!(@read $vm, $cursor, $kind)?; )*
                    $vm.$handler($( $field ),*)
                }
            ),*
        }
    }};

    // Decode a register byte offset into a validated register index
    (@read $vm:ident, $cursor:ident, Reg) => {{
        let offset = $vm.fetch(&mut $cursor)?;
        $vm.registers.index_of(offset, $vm.ip)
    }};

    // Decode an immediate word
    (@read $vm:ident, $cursor:ident, Imm) => {{
        $vm.fetch(&mut $cursor)
    }};
}

/// Bytecode virtual machine.
///
/// Owns the register file and the instruction stream. Programs are appended
/// with [`load_instructions`](VM::load_instructions), executed with
/// [`run`](VM::run) and cleared with [`unload_instructions`](VM::unload_instructions);
/// register contents survive between runs. Dropping the VM releases both buffers.
pub struct VM {
    /// Encoded instruction words.
    instructions: WordStore<Word>,
    /// Instruction pointer (index of the next opcode word).
    ip: usize,
    /// Register file.
    registers: Registers,
    /// Maximum number of instructions a single run may execute.
    step_limit: Option<u64>,
    /// Steps executed by the current or last run.
    profile: StepProfile,
}

impl VM {
    /// Creates a VM with zeroed registers, no program and no step limit.
    pub fn new() -> Result<Self, VMError> {
        Ok(Self {
            instructions: WordStore::with_capacity(0)?,
            ip: 0,
            registers: Registers::new(REGISTER_COUNT)?,
            step_limit: None,
            profile: StepProfile::new(),
        })
    }

    /// Creates a VM whose runs fail with [`VMError::StepLimitExceeded`] after `limit` steps.
    pub fn with_step_limit(limit: u64) -> Result<Self, VMError> {
        let mut vm = Self::new()?;
        vm.step_limit = Some(limit);
        Ok(vm)
    }

    /// Appends `words` to the instruction stream.
    pub fn load_instructions(&mut self, words: &[Word]) -> Result<(), VMError> {
        self.instructions.push_back_slice(words)
    }

    /// Empties the instruction stream. The instruction pointer is left as is.
    pub fn unload_instructions(&mut self) -> Result<(), VMError> {
        self.instructions.resize(0)
    }

    /// Executes the loaded program from the first word until completion or error.
    ///
    /// The run ends successfully once the instruction pointer reaches or passes
    /// the end of the stream, including through a branch target.
    pub fn run(&mut self) -> Result<(), VMError> {
        self.ip = 0;
        self.profile = StepProfile::new();

        while self.ip < self.instructions.len() {
            if let Some(limit) = self.step_limit
                && self.profile.total() >= limit
            {
                return Err(VMError::StepLimitExceeded { limit, ip: self.ip });
            }
            let opcode = self.fetch_at(self.ip)?;
            self.eval_op(opcode)?;
        }
        Ok(())
    }

    /// Decodes and executes the instruction whose `opcode` sits at the current ip.
    pub fn eval_op(&mut self, opcode: Word) -> Result<(), VMError> {
        let ip = self.ip;
        let instr = Instruction::try_from(opcode)
            .map_err(|_| VMError::InvalidOpcode { opcode, ip })?;

        let flow = self.exec(instr)?;
        self.ip = match flow {
            Flow::Next => ip + instr.width(),
            Flow::Jump(target) => target,
        };
        self.profile
            .add(StepCategory::of(instr.class(), flow != Flow::Next));
        Ok(())
    }

    /// Returns the value of register `index`.
    pub fn read_register(&self, index: usize) -> Result<Word, VMError> {
        self.registers.get(index)
    }

    /// Returns the whole register file.
    pub fn registers(&self) -> &[Word] {
        self.registers.as_slice()
    }

    pub fn register_count(&self) -> usize {
        self.registers.len()
    }

    pub fn ip(&self) -> usize {
        self.ip
    }

    /// Number of words in the instruction stream.
    pub fn instruction_count(&self) -> usize {
        self.instructions.len()
    }

    pub fn step_limit(&self) -> Option<u64> {
        self.step_limit
    }

    pub fn set_step_limit(&mut self, limit: Option<u64>) {
        self.step_limit = limit;
    }

    /// Steps executed by the last run, by category.
    pub fn profile(&self) -> &StepProfile {
        &self.profile
    }

    /// Reads the instruction word at `index`.
    fn fetch_at(&self, index: usize) -> Result<Word, VMError> {
        self.instructions
            .get(index)
            .ok_or(VMError::OutOfBoundsAccess {
                region: Region::Instructions,
                index,
                len: self.instructions.len(),
            })
    }

    /// Advances `cursor` by one word and reads the word it lands on.
    fn fetch(&self, cursor: &mut usize) -> Result<Word, VMError> {
        let next = cursor
            .checked_add(1)
            .ok_or(VMError::OutOfBoundsAccess {
                region: Region::Instructions,
                index: *cursor,
                len: self.instructions.len(),
            })?;
        *cursor = next;
        self.fetch_at(next)
    }

    /// Executes a single instruction located at the current ip.
    fn exec(&mut self, instruction: Instruction) -> Result<Flow, VMError> {
        let mut cursor = self.ip;
        exec_vm! {
            vm = self,
            cursor = cursor,
            instr = instruction,
            {
                // Integer arithmetic
                Add => op_add(rd: Reg, rs1: Reg, rs2: Reg),
                Addi => op_addi(rd: Reg, rs1: Reg, imm: Imm),
                Sub => op_sub(rd: Reg, rs1: Reg, rs2: Reg),
                Mul => op_mul(rd: Reg, rs1: Reg, rs2: Reg),
                Div => op_div(rd: Reg, rs1: Reg, rs2: Reg),
                Rem => op_rem(rd: Reg, rs1: Reg, rs2: Reg),
                // Control Flow
                Jal => op_jal(rd: Reg, target: Imm),
                Beq => op_beq(rs1: Reg, rs2: Reg, target: Imm),
                Bne => op_bne(rs1: Reg, rs2: Reg, target: Imm),
                Blt => op_blt(rs1: Reg, rs2: Reg, target: Imm),
                Bge => op_bge(rs1: Reg, rs2: Reg, target: Imm),
            }
        }
    }

    fn op_add(&mut self, dst: usize, a: usize, b: usize) -> Result<Flow, VMError> {
        let va = self.registers.get(a)?;
        let vb = self.registers.get(b)?;
        self.registers.set(dst, va.wrapping_add(vb))?;
        Ok(Flow::Next)
    }

    fn op_addi(&mut self, dst: usize, a: usize, imm: Word) -> Result<Flow, VMError> {
        let va = self.registers.get(a)?;
        self.registers.set(dst, va.wrapping_add(imm))?;
        Ok(Flow::Next)
    }

    fn op_sub(&mut self, dst: usize, a: usize, b: usize) -> Result<Flow, VMError> {
        let va = self.registers.get(a)?;
        let vb = self.registers.get(b)?;
        self.registers.set(dst, va.wrapping_sub(vb))?;
        Ok(Flow::Next)
    }

    fn op_mul(&mut self, dst: usize, a: usize, b: usize) -> Result<Flow, VMError> {
        let va = self.registers.get(a)?;
        let vb = self.registers.get(b)?;
        self.registers.set(dst, va.wrapping_mul(vb))?;
        Ok(Flow::Next)
    }

    fn op_div(&mut self, dst: usize, a: usize, b: usize) -> Result<Flow, VMError> {
        let va = self.registers.get(a)?;
        let vb = self.registers.get(b)?;
        let quotient = va
            .checked_div(vb)
            .ok_or(VMError::DivisionByZero { ip: self.ip })?;
        self.registers.set(dst, quotient)?;
        Ok(Flow::Next)
    }

    fn op_rem(&mut self, dst: usize, a: usize, b: usize) -> Result<Flow, VMError> {
        let va = self.registers.get(a)?;
        let vb = self.registers.get(b)?;
        let remainder = va
            .checked_rem(vb)
            .ok_or(VMError::DivisionByZero { ip: self.ip })?;
        self.registers.set(dst, remainder)?;
        Ok(Flow::Next)
    }

    // The link register slot is part of the encoding but is never written.
    fn op_jal(&mut self, _rd: usize, target: Word) -> Result<Flow, VMError> {
        Ok(Flow::Jump(target))
    }

    fn op_beq(&mut self, rs1: usize, rs2: usize, target: Word) -> Result<Flow, VMError> {
        let a = self.registers.get(rs1)?;
        let b = self.registers.get(rs2)?;
        Ok(branch_if(a == b, target))
    }

    fn op_bne(&mut self, rs1: usize, rs2: usize, target: Word) -> Result<Flow, VMError> {
        let a = self.registers.get(rs1)?;
        let b = self.registers.get(rs2)?;
        Ok(branch_if(a != b, target))
    }

    fn op_blt(&mut self, rs1: usize, rs2: usize, target: Word) -> Result<Flow, VMError> {
        let a = self.registers.get(rs1)?;
        let b = self.registers.get(rs2)?;
        Ok(branch_if(a < b, target))
    }

    fn op_bge(&mut self, rs1: usize, rs2: usize, target: Word) -> Result<Flow, VMError> {
        let a = self.registers.get(rs1)?;
        let b = self.registers.get(rs2)?;
        Ok(branch_if(a >= b, target))
    }
}

fn branch_if(taken: bool, target: Word) -> Flow {
    if taken { Flow::Jump(target) } else { Flow::Next }
}
