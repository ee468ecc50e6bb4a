//! Runs the counting-loop reference program on the register VM.
//!
//! # Usage
//! ```text
//! regvm [OPTIONS]
//! ```
//!
//! # Options
//! - `--count <n>`: Value the loop counts up to (default 15)
//! - `--step-limit <n>`: Abort the run after `n` executed instructions
//! - `--no-timestamp`: Omit timestamps from log lines
//! - `--help`, `-h`: Print usage
//!
//! # Environment
//! - `REGVM_LOG`: Minimum log level (`debug`, `info`, `warn`, `error`)
//! - `REGVM_STEP_LIMIT`: Step limit used when `--step-limit` is not given

use regvm::utils::log::{self, Level, SHOW_TIMESTAMP};
use regvm::virtual_machine::isa::Word;
use regvm::virtual_machine::program::Program;
use regvm::virtual_machine::register::Register;
use regvm::virtual_machine::vm::VM;
use regvm::{debug, error, info, warn};
use std::env;
use std::process;
use std::sync::atomic::Ordering;

const DEFAULT_COUNT: Word = 15;

fn print_usage(program: &str) {
    eprintln!("Usage: {} [OPTIONS]", program);
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --count <n>        Value the loop counts up to (default {DEFAULT_COUNT})");
    eprintln!("  --step-limit <n>   Abort the run after n executed instructions");
    eprintln!("  --no-timestamp     Omit timestamps from log lines");
    eprintln!("  -h, --help         Print this message");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  REGVM_LOG          Minimum log level (debug, info, warn, error)");
    eprintln!("  REGVM_STEP_LIMIT   Step limit used when --step-limit is not given");
}

/// Parses a numeric option value or exits with a message naming the option.
fn parse_number<T: std::str::FromStr>(option: &str, value: &str) -> T {
    value.parse().unwrap_or_else(|_| {
        error!("{option} expects a non-negative integer, got '{value}'");
        process::exit(1);
    })
}

/// Builds `A0 = count; do { A1 += 1 } while A1 < A0`.
fn counting_loop(count: Word) -> Program {
    let mut program = Program::new();
    program.addi(Register::A0, Register::ZERO, count);
    let body = program.len();
    program
        .addi(Register::A1, Register::A1, 1)
        .blt(Register::A1, Register::A0, body);
    program
}

fn main() {
    let args: Vec<String> = env::args().collect();

    if let Ok(raw) = env::var("REGVM_LOG") {
        match raw.parse::<Level>() {
            Ok(level) => log::set_max_level(level),
            Err(e) => warn!("REGVM_LOG: {e}"),
        }
    }

    let mut count = DEFAULT_COUNT;
    let mut step_limit: Option<u64> = env::var("REGVM_STEP_LIMIT")
        .ok()
        .map(|raw| parse_number("REGVM_STEP_LIMIT", &raw));

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            "--count" => {
                i += 1;
                if i >= args.len() {
                    error!("--count requires an argument");
                    process::exit(1);
                }
                count = parse_number("--count", &args[i]);
                i += 1;
            }
            "--step-limit" => {
                i += 1;
                if i >= args.len() {
                    error!("--step-limit requires an argument");
                    process::exit(1);
                }
                step_limit = Some(parse_number("--step-limit", &args[i]));
                i += 1;
            }
            "--no-timestamp" => {
                SHOW_TIMESTAMP.store(false, Ordering::Relaxed);
                i += 1;
            }
            other => {
                eprintln!("Unexpected argument: {}\n", other);
                print_usage(&args[0]);
                process::exit(1);
            }
        }
    }

    let mut vm = match step_limit {
        Some(limit) => VM::with_step_limit(limit),
        None => VM::new(),
    }
    .unwrap_or_else(|e| {
        error!("Failed to create VM: {e}");
        process::exit(1);
    });

    let program = counting_loop(count);
    debug!("Program words: {:?}", program.words());

    if let Err(e) = vm.load_instructions(program.words()) {
        error!("Failed to load program: {e}");
        process::exit(1);
    }
    info!(
        "Loaded {} words, running with step limit {}",
        vm.instruction_count(),
        step_limit.map_or_else(|| "none".to_string(), |l| l.to_string())
    );

    let outcome = vm.run();

    if let Err(e) = vm.unload_instructions() {
        error!("Failed to unload program: {e}");
        process::exit(1);
    }

    if let Err(e) = outcome {
        error!("Run failed: {e}");
        process::exit(1);
    }

    match vm.read_register(Register::A1.index()) {
        Ok(value) => info!("{} = {}", Register::A1, value),
        Err(e) => {
            error!("{e}");
            process::exit(1);
        }
    }

    let profile = vm.profile();
    info!("Executed {} instructions", profile.total());
    for (category, steps) in profile.iter() {
        info!("  {:<16} {}", category.as_str(), steps);
    }
}
