use super::*;
use crate::virtual_machine::isa::WORD_SIZE;
use crate::virtual_machine::program::Program;
use crate::virtual_machine::register::Register;

fn new_vm(program: &Program) -> VM {
    let mut vm = VM::new().expect("vm new failed");
    vm.load_instructions(program.words())
        .expect("load failed");
    vm
}

fn run_program(program: &Program) -> VM {
    let mut vm = new_vm(program);
    vm.run().expect("vm run failed");
    vm
}

fn run_expect_err(program: &Program) -> (VM, VMError) {
    let mut vm = new_vm(program);
    let err = vm.run().expect_err("expected error");
    (vm, err)
}

fn reg(vm: &VM, r: Register) -> Word {
    vm.read_register(r.index()).unwrap()
}

/// Program that loads `a` into T0 and `b` into T1.
fn with_operands(a: Word, b: Word) -> Program {
    let mut program = Program::new();
    program
        .addi(Register::T0, Register::ZERO, a)
        .addi(Register::T1, Register::ZERO, b);
    program
}

/// The counting loop: A0 = n, then increment A1 until it reaches A0.
fn counting_loop(n: Word) -> Program {
    let mut program = Program::new();
    program.addi(Register::A0, Register::ZERO, n);
    let body = program.len();
    program
        .addi(Register::A1, Register::A1, 1)
        .blt(Register::A1, Register::A0, body);
    program
}

// ==================== Lifecycle ====================

#[test]
fn registers_start_at_zero() {
    let vm = VM::new().unwrap();
    assert_eq!(vm.register_count(), 32);
    for index in 0..32 {
        assert_eq!(vm.read_register(index).unwrap(), 0);
    }
    assert_eq!(vm.ip(), 0);
    assert_eq!(vm.instruction_count(), 0);
}

#[test]
fn read_register_out_of_range() {
    let vm = VM::new().unwrap();
    assert_eq!(
        vm.read_register(32),
        Err(VMError::OutOfBoundsAccess {
            region: Region::Registers,
            index: 32,
            len: 32,
        })
    );
}

#[test]
fn empty_program_runs() {
    let mut vm = VM::new().unwrap();
    vm.run().unwrap();
    assert_eq!(vm.profile().total(), 0);
}

#[test]
fn loads_concatenate() {
    let mut first = Program::new();
    first.addi(Register::A0, Register::ZERO, 2);
    let mut second = Program::new();
    second.addi(Register::A1, Register::A0, 3);

    let mut vm = new_vm(&first);
    vm.load_instructions(second.words()).unwrap();
    assert_eq!(vm.instruction_count(), 8);
    vm.run().unwrap();
    assert_eq!(reg(&vm, Register::A1), 5);
}

#[test]
fn unload_then_load_runs_only_new_program() {
    let mut first = Program::new();
    first.addi(Register::A0, Register::A0, 1);
    let mut second = Program::new();
    second.addi(Register::A1, Register::ZERO, 3);

    let mut vm = run_program(&first);
    assert_eq!(reg(&vm, Register::A0), 1);

    vm.unload_instructions().unwrap();
    assert_eq!(vm.instruction_count(), 0);
    vm.load_instructions(second.words()).unwrap();
    vm.run().unwrap();

    assert_eq!(vm.instruction_count(), second.len());
    assert_eq!(reg(&vm, Register::A1), 3);
    // Registers persist across runs; the old program did not execute again.
    assert_eq!(reg(&vm, Register::A0), 1);
}

#[test]
fn unload_keeps_ip() {
    let mut program = Program::new();
    program.addi(Register::A0, Register::ZERO, 1);
    let mut vm = run_program(&program);
    assert_eq!(vm.ip(), 4);
    vm.unload_instructions().unwrap();
    assert_eq!(vm.ip(), 4);
}

#[test]
fn run_restarts_from_first_word() {
    let mut program = Program::new();
    program.addi(Register::A0, Register::A0, 1);
    let mut vm = run_program(&program);
    vm.run().unwrap();
    assert_eq!(reg(&vm, Register::A0), 2);
}

// ==================== Arithmetic ====================

#[test]
fn add() {
    let mut program = with_operands(20, 22);
    program.add(Register::T2, Register::T0, Register::T1);
    assert_eq!(reg(&run_program(&program), Register::T2), 42);
}

#[test]
fn add_wrapping() {
    let mut program = with_operands(Word::MAX, 2);
    program.add(Register::T2, Register::T0, Register::T1);
    assert_eq!(reg(&run_program(&program), Register::T2), 1);
}

#[test]
fn addi_zero_is_identity() {
    let mut program = with_operands(1234, 0);
    program.addi(Register::T2, Register::T0, 0);
    assert_eq!(reg(&run_program(&program), Register::T2), 1234);
}

#[test]
fn addi_wrapping() {
    let mut program = with_operands(Word::MAX, 0);
    program.addi(Register::T0, Register::T0, 1);
    assert_eq!(reg(&run_program(&program), Register::T0), 0);
}

#[test]
fn sub() {
    let mut program = with_operands(50, 8);
    program.sub(Register::T2, Register::T0, Register::T1);
    assert_eq!(reg(&run_program(&program), Register::T2), 42);
}

#[test]
fn sub_wrapping() {
    let mut program = with_operands(0, 1);
    program.sub(Register::T2, Register::T0, Register::T1);
    assert_eq!(reg(&run_program(&program), Register::T2), Word::MAX);
}

#[test]
fn mul() {
    let mut program = with_operands(6, 7);
    program.mul(Register::T2, Register::T0, Register::T1);
    assert_eq!(reg(&run_program(&program), Register::T2), 42);
}

#[test]
fn mul_wrapping() {
    let mut program = with_operands(Word::MAX, 2);
    program.mul(Register::T2, Register::T0, Register::T1);
    assert_eq!(reg(&run_program(&program), Register::T2), Word::MAX - 1);
}

#[test]
fn div() {
    let mut program = with_operands(85, 2);
    program.div(Register::T2, Register::T0, Register::T1);
    assert_eq!(reg(&run_program(&program), Register::T2), 42);
}

#[test]
fn rem() {
    let mut program = with_operands(85, 2);
    program.rem(Register::T2, Register::T0, Register::T1);
    assert_eq!(reg(&run_program(&program), Register::T2), 1);
}

#[test]
fn div_by_zero() {
    let mut program = with_operands(10, 0);
    let div_at = program.len();
    program
        .div(Register::T2, Register::T0, Register::T1)
        .addi(Register::A0, Register::ZERO, 1);

    let (vm, err) = run_expect_err(&program);
    assert_eq!(err, VMError::DivisionByZero { ip: div_at });
    assert_eq!(vm.ip(), div_at);
    assert_eq!(reg(&vm, Register::T0), 10);
    assert_eq!(reg(&vm, Register::T1), 0);
    assert_eq!(reg(&vm, Register::T2), 0);
    assert_eq!(reg(&vm, Register::A0), 0);
}

#[test]
fn rem_by_zero() {
    let mut program = with_operands(0, 0);
    program.rem(Register::T2, Register::T0, Register::T1);
    let (_, err) = run_expect_err(&program);
    assert_eq!(err, VMError::DivisionByZero { ip: 8 });
}

#[test]
fn zero_register_is_not_guarded() {
    let mut program = Program::new();
    program.addi(Register::ZERO, Register::ZERO, 5);
    assert_eq!(reg(&run_program(&program), Register::ZERO), 5);
}

// ==================== Control flow ====================

#[test]
fn counting_loop_reaches_fifteen() {
    let vm = run_program(&counting_loop(15));
    assert_eq!(reg(&vm, Register::A1), 15);
    assert_eq!(reg(&vm, Register::A0), 15);
    assert_eq!(vm.ip(), 12);
}

#[test]
fn counting_loop_profile() {
    let vm = run_program(&counting_loop(15));
    let profile = vm.profile();
    assert_eq!(profile.get(StepCategory::Arithmetic), 16);
    assert_eq!(profile.get(StepCategory::BranchTaken), 14);
    assert_eq!(profile.get(StepCategory::BranchNotTaken), 1);
    assert_eq!(profile.total(), 31);
}

#[test]
fn jal_skips_instructions() {
    let mut program = Program::new();
    program.jal(Register::RA, 7);
    program
        .addi(Register::A0, Register::ZERO, 1)
        .addi(Register::A1, Register::ZERO, 2);
    let vm = run_program(&program);
    assert_eq!(reg(&vm, Register::A0), 0);
    assert_eq!(reg(&vm, Register::A1), 2);
    // The link register slot is decoded but not written.
    assert_eq!(reg(&vm, Register::RA), 0);
}

#[test]
fn beq_taken() {
    let mut program = with_operands(3, 3);
    let skip_to = program.len() + 8;
    program
        .beq(Register::T0, Register::T1, skip_to)
        .addi(Register::A0, Register::ZERO, 1)
        .addi(Register::A1, Register::ZERO, 1);
    let vm = run_program(&program);
    assert_eq!(reg(&vm, Register::A0), 0);
    assert_eq!(reg(&vm, Register::A1), 1);
}

#[test]
fn beq_not_taken() {
    let mut program = with_operands(3, 4);
    let skip_to = program.len() + 8;
    program
        .beq(Register::T0, Register::T1, skip_to)
        .addi(Register::A0, Register::ZERO, 1);
    assert_eq!(reg(&run_program(&program), Register::A0), 1);
}

#[test]
fn bne_taken() {
    let mut program = with_operands(3, 4);
    let skip_to = program.len() + 8;
    program
        .bne(Register::T0, Register::T1, skip_to)
        .addi(Register::A0, Register::ZERO, 1);
    assert_eq!(reg(&run_program(&program), Register::A0), 0);
}

#[test]
fn bne_not_taken() {
    let mut program = with_operands(4, 4);
    let skip_to = program.len() + 8;
    program
        .bne(Register::T0, Register::T1, skip_to)
        .addi(Register::A0, Register::ZERO, 1);
    assert_eq!(reg(&run_program(&program), Register::A0), 1);
}

#[test]
fn blt_is_unsigned() {
    // Word::MAX would be -1 as a signed value; unsigned it is the largest word.
    let mut program = with_operands(Word::MAX, 1);
    let skip_to = program.len() + 8;
    program
        .blt(Register::T0, Register::T1, skip_to)
        .addi(Register::A0, Register::ZERO, 1);
    assert_eq!(reg(&run_program(&program), Register::A0), 1);
}

#[test]
fn bge_taken_on_equal() {
    let mut program = with_operands(9, 9);
    let skip_to = program.len() + 8;
    program
        .bge(Register::T0, Register::T1, skip_to)
        .addi(Register::A0, Register::ZERO, 1);
    assert_eq!(reg(&run_program(&program), Register::A0), 0);
}

#[test]
fn bge_is_unsigned() {
    let mut program = with_operands(Word::MAX, 1);
    let skip_to = program.len() + 8;
    program
        .bge(Register::T0, Register::T1, skip_to)
        .addi(Register::A0, Register::ZERO, 1);
    assert_eq!(reg(&run_program(&program), Register::A0), 0);
}

#[test]
fn branch_to_end_terminates() {
    let mut program = Program::new();
    let end = 4 + 4;
    program
        .beq(Register::ZERO, Register::ZERO, end)
        .addi(Register::A0, Register::ZERO, 1);
    assert_eq!(program.len(), end);
    let vm = run_program(&program);
    assert_eq!(vm.ip(), end);
    assert_eq!(reg(&vm, Register::A0), 0);
}

#[test]
fn branch_past_end_terminates() {
    let mut program = Program::new();
    program.jal(Register::ZERO, 1000);
    let vm = run_program(&program);
    assert_eq!(vm.ip(), 1000);
}

// ==================== Errors ====================

#[test]
fn invalid_opcode() {
    let mut program = Program::new();
    program.addi(Register::A0, Register::ZERO, 1).raw(255);
    let (vm, err) = run_expect_err(&program);
    assert_eq!(err, VMError::InvalidOpcode { opcode: 255, ip: 4 });
    assert_eq!(vm.ip(), 4);
    assert_eq!(reg(&vm, Register::A0), 1);
}

#[test]
fn truncated_instruction() {
    let mut program = Program::new();
    program
        .raw(Instruction::Add.opcode())
        .raw(Register::A0.offset());
    let (vm, err) = run_expect_err(&program);
    assert_eq!(
        err,
        VMError::OutOfBoundsAccess {
            region: Region::Instructions,
            index: 2,
            len: 2,
        }
    );
    assert_eq!(vm.ip(), 0);
}

#[test]
fn register_operand_past_file() {
    let mut program = Program::new();
    program
        .raw(Instruction::Addi.opcode())
        .raw(32 * WORD_SIZE)
        .raw(Register::ZERO.offset())
        .raw(1);
    let (vm, err) = run_expect_err(&program);
    assert_eq!(
        err,
        VMError::OutOfBoundsAccess {
            region: Region::Registers,
            index: 32,
            len: 32,
        }
    );
    assert!(vm.registers().iter().all(|&v| v == 0));
}

#[test]
fn misaligned_register_operand() {
    let mut program = Program::new();
    program
        .raw(Instruction::Addi.opcode())
        .raw(Register::A0.offset())
        .raw(WORD_SIZE + 1)
        .raw(7);
    let (vm, err) = run_expect_err(&program);
    assert_eq!(
        err,
        VMError::MisalignedRegister {
            offset: WORD_SIZE + 1,
            ip: 0
        }
    );
    // The destination was decoded first but nothing was written.
    assert_eq!(reg(&vm, Register::A0), 0);
}

#[test]
fn jal_register_slot_is_still_validated() {
    let mut program = Program::new();
    program
        .raw(Instruction::Jal.opcode())
        .raw(40 * WORD_SIZE)
        .raw(0);
    let (_, err) = run_expect_err(&program);
    assert!(matches!(
        err,
        VMError::OutOfBoundsAccess {
            region: Region::Registers,
            index: 40,
            ..
        }
    ));
}

// ==================== Single step ====================

#[test]
fn eval_op_executes_one_instruction() {
    let mut program = Program::new();
    program
        .addi(Register::A0, Register::ZERO, 9)
        .addi(Register::A1, Register::A0, 1);
    let mut vm = new_vm(&program);

    vm.eval_op(Instruction::Addi.opcode()).unwrap();
    assert_eq!(vm.ip(), 4);
    assert_eq!(reg(&vm, Register::A0), 9);
    assert_eq!(reg(&vm, Register::A1), 0);

    vm.eval_op(Instruction::Addi.opcode()).unwrap();
    assert_eq!(vm.ip(), 8);
    assert_eq!(reg(&vm, Register::A1), 10);
}

#[test]
fn eval_op_rejects_unknown_opcode_in_place() {
    let mut vm = VM::new().unwrap();
    assert_eq!(
        vm.eval_op(77),
        Err(VMError::InvalidOpcode { opcode: 77, ip: 0 })
    );
    assert_eq!(vm.ip(), 0);
}

// ==================== Step limit ====================

#[test]
fn step_limit_stops_infinite_loop() {
    let mut program = Program::new();
    program.jal(Register::ZERO, 0);
    let mut vm = VM::with_step_limit(100).unwrap();
    vm.load_instructions(program.words()).unwrap();

    assert_eq!(
        vm.run(),
        Err(VMError::StepLimitExceeded { limit: 100, ip: 0 })
    );
    assert_eq!(vm.profile().get(StepCategory::Jump), 100);
}

#[test]
fn step_limit_is_inclusive() {
    let program = counting_loop(15);

    let mut vm = VM::with_step_limit(31).unwrap();
    vm.load_instructions(program.words()).unwrap();
    vm.run().unwrap();
    assert_eq!(reg(&vm, Register::A1), 15);

    let mut vm = VM::with_step_limit(30).unwrap();
    vm.load_instructions(program.words()).unwrap();
    assert!(matches!(
        vm.run(),
        Err(VMError::StepLimitExceeded { limit: 30, .. })
    ));
}

#[test]
fn step_limit_can_be_cleared() {
    let mut vm = VM::with_step_limit(1).unwrap();
    vm.load_instructions(counting_loop(3).words()).unwrap();
    assert!(vm.run().is_err());

    vm.set_step_limit(None);
    assert_eq!(vm.step_limit(), None);
    vm.run().unwrap();
}
