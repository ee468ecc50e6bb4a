//! VM benchmark binary.
//!
//! Measures execution time for representative instruction mixes.
//! Run with: `cargo run --release --bin bench`

use std::time::{Duration, Instant};

use regvm::virtual_machine::isa::Word;
use regvm::virtual_machine::program::Program;
use regvm::virtual_machine::register::Register;
use regvm::virtual_machine::vm::VM;

// ---------------------------------------------------------------------------
// Benchmark harness
// ---------------------------------------------------------------------------

struct BenchResult {
    name: String,
    iterations: u64,
    total: Duration,
    /// Instructions executed by the last run.
    steps: u64,
}

impl BenchResult {
    fn avg(&self) -> Duration {
        self.total / self.iterations as u32
    }

    fn print(&self) {
        let ns_per_op = self.avg().as_nanos();
        let ns_per_instr = if self.steps > 0 {
            format!("{:>8.2}", ns_per_op as f64 / self.steps as f64)
        } else {
            "       -".to_string()
        };
        println!(
            "  {:<30} {:>7} iters {:>10.3} us/iter {:>12} steps  {} ns/instr",
            self.name,
            self.iterations,
            ns_per_op as f64 / 1000.0,
            self.steps,
            ns_per_instr,
        );
    }
}

/// Runs `f` for at least `min_duration`, returning aggregated results.
fn bench<F>(name: String, min_duration: Duration, mut f: F) -> BenchResult
where
    F: FnMut() -> u64,
{
    // Warmup
    for _ in 0..5 {
        f();
    }

    let mut iterations = 0u64;
    let mut last_steps = 0u64;
    let start = Instant::now();
    while start.elapsed() < min_duration {
        last_steps = f();
        iterations += 1;
    }
    let total = start.elapsed();

    BenchResult {
        name,
        iterations,
        total,
        steps: last_steps,
    }
}

/// Loads `program` into a fresh VM, runs it and returns the executed step count.
fn run_steps(program: &Program) -> u64 {
    let mut vm = VM::new().expect("vm new failed");
    vm.load_instructions(program.words()).expect("load failed");
    vm.run().expect("run failed");
    vm.profile().total()
}

// ---------------------------------------------------------------------------
// Benchmark definitions
// ---------------------------------------------------------------------------

/// `A0 = n; do { A1 += 1 } while A1 < A0`
fn counting_loop(n: Word) -> Program {
    let mut program = Program::new();
    program.addi(Register::A0, Register::ZERO, n);
    let body = program.len();
    program
        .addi(Register::A1, Register::A1, 1)
        .blt(Register::A1, Register::A0, body);
    program
}

/// Mixes every arithmetic and division opcode in a loop of `n` iterations.
fn arithmetic_mix(n: Word) -> Program {
    let mut program = Program::new();
    program
        .addi(Register::S1, Register::ZERO, n)
        .addi(Register::T0, Register::ZERO, 1)
        .addi(Register::T1, Register::ZERO, 2)
        .addi(Register::T2, Register::ZERO, 3);
    let body = program.len();
    program
        .add(Register::T3, Register::T0, Register::T1)
        .mul(Register::T4, Register::T3, Register::T2)
        .sub(Register::T5, Register::T4, Register::T0)
        .div(Register::T6, Register::T5, Register::T1)
        .rem(Register::A2, Register::T6, Register::T2)
        .addi(Register::T0, Register::A2, 1)
        .addi(Register::S2, Register::S2, 1)
        .bne(Register::S2, Register::S1, body);
    program
}

/// Each iteration falls through a BEQ and jumps over a dead ADDI before looping back.
fn branch_heavy(n: Word) -> Program {
    let mut program = Program::new();
    program.addi(Register::S1, Register::ZERO, n);
    let top = program.len();
    // BEQ + ADDI + JAL
    let after_taken = top + 4 + 4 + 3;
    let cont = after_taken + 4;
    program
        .beq(Register::S2, Register::S1, after_taken)
        .addi(Register::S2, Register::S2, 1)
        .jal(Register::ZERO, cont)
        .addi(Register::A0, Register::A0, 1)
        .blt(Register::S2, Register::S1, top);
    program
}

// ---------------------------------------------------------------------------
// Main
// ---------------------------------------------------------------------------

fn main() {
    let min = Duration::from_secs(2);

    println!("VM Benchmarks (each runs for >= 2s)\n");
    println!(
        "  {:<30} {:>7}       {:>14} {:>12}  {:>10}",
        "benchmark", "iters", "avg time", "steps/run", "ns/instr"
    );
    println!("  {}", "-".repeat(84));

    // 1. Counting loop variants
    for &n in &[15 as Word, 1_000, 100_000] {
        let program = counting_loop(n);
        bench(format!("counting_loop({n})"), min, || run_steps(&program)).print();
    }

    // 2. Arithmetic mix (10K iterations)
    let program = arithmetic_mix(10_000);
    bench("arithmetic_mix(10K)".to_string(), min, || run_steps(&program)).print();

    // 3. Branch-heavy (50K iterations)
    let program = branch_heavy(50_000);
    bench("branch_heavy(50K)".to_string(), min, || run_steps(&program)).print();

    println!();
}
