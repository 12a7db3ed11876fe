//! Performance harness for vulcan-core benchmarking.
//!
//! Measures instruction throughput using the same stepping pattern a host
//! frame loop would use: repeated bounded runs of a fixed cycle slice.
//!
//! ## Usage
//!
//! ```sh
//! cargo run -p vulcan-core --example performance_harness --release
//! ```
//!
//! ## Metrics
//!
//! - Instructions per second across all threads
//! - Machine-equivalents at 60 Hz with a 10,000-cycle frame slice
//!
//! Each thread owns its machine; machines carry device closures and are
//! not `Send`.

#![allow(clippy::pedantic)]

use log as _;
use proptest as _;
use rand as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use serde_json as _;
use thiserror as _;
use vulcan_core::{encode_instruction, HookDevice, Machine, Opcode};

use std::sync::mpsc;
use std::thread;
use std::time::{Duration, Instant};

const FRAME_SLICE_CYCLES: u64 = 10_000;
const FRAMES_PER_SECOND: u64 = 60;
const NUM_THREADS: usize = 4;

fn op(opcode: Opcode) -> u8 {
    encode_instruction(opcode, 0)
}

/// `jmp 0x400` tail shared by every loop body.
fn back_to_start(body: &[u8]) -> Vec<u8> {
    let mut program = body.to_vec();
    program.extend_from_slice(&[0x02, 0x00, 0x04, op(Opcode::Jmp)]);
    program
}

fn nop_loop() -> Vec<u8> {
    back_to_start(&[op(Opcode::Nop)])
}

fn alu_loop() -> Vec<u8> {
    back_to_start(&[
        0x01,
        1,
        0x01,
        2,
        op(Opcode::Add),
        0x01,
        3,
        op(Opcode::Mul),
        op(Opcode::Pop),
    ])
}

fn memory_loop() -> Vec<u8> {
    back_to_start(&[
        0x03,
        0x56,
        0x34,
        0x12,
        encode_instruction(Opcode::Storew, 2),
        0x00,
        0x20,
        encode_instruction(Opcode::Loadw, 2),
        0x00,
        0x20,
        op(Opcode::Pop),
    ])
}

#[derive(Debug, Clone, Copy)]
struct BenchmarkResult {
    name: &'static str,
    instructions_per_second: f64,
    machine_equivalents_60hz: f64,
}

fn benchmark(
    name: &'static str,
    program: fn() -> Vec<u8>,
    with_device: bool,
    duration: Duration,
) -> BenchmarkResult {
    let (tx, rx) = mpsc::channel();

    let handles: Vec<_> = (0..NUM_THREADS)
        .map(|seed| {
            let tx = tx.clone();
            thread::spawn(move || {
                let mut machine = Machine::new(Some(seed as u64));
                machine.load_program(&program());
                if with_device {
                    machine
                        .install_device(0x2000, 0x2002, HookDevice::new().on_tick(|_| {}))
                        .ok();
                }

                let mut total_instructions = 0u64;
                let start = Instant::now();
                while start.elapsed() < duration {
                    match machine.run_for(FRAME_SLICE_CYCLES) {
                        Ok(outcome) => total_instructions += outcome.steps,
                        Err(_) => break,
                    }
                }

                tx.send(total_instructions).ok();
            })
        })
        .collect();

    for h in handles {
        h.join().ok();
    }

    drop(tx);

    let total_instructions: u64 = rx.iter().sum();
    let instructions_per_second = total_instructions as f64 / duration.as_secs_f64();

    BenchmarkResult {
        name,
        instructions_per_second,
        machine_equivalents_60hz: instructions_per_second
            / (FRAME_SLICE_CYCLES * FRAMES_PER_SECOND) as f64,
    }
}

fn format_number(n: f64) -> String {
    if n >= 1_000_000.0 {
        format!("{:.2}M", n / 1_000_000.0)
    } else if n >= 1_000.0 {
        format!("{:.2}K", n / 1_000.0)
    } else {
        format!("{:.2}", n)
    }
}

fn print_results(results: &[BenchmarkResult]) {
    println!("\nvulcan-core performance harness");
    println!(
        "threads: {NUM_THREADS}, slice: {FRAME_SLICE_CYCLES} cycles, rate: {FRAMES_PER_SECOND} Hz\n"
    );
    println!("{:14} {:>15} {:>15}", "Benchmark", "Instr/sec", "Machines@60Hz");
    for result in results {
        println!(
            "{:14} {:>15} {:>15}",
            result.name,
            format_number(result.instructions_per_second),
            format_number(result.machine_equivalents_60hz)
        );
    }
}

fn main() {
    let warmup = Duration::from_millis(500);
    let benchmark_duration = Duration::from_secs(3);

    println!("Running warmup for {:?}...", warmup);
    let _ = benchmark("nop_loop", nop_loop, false, warmup);

    println!("Running benchmarks for {:?} each...", benchmark_duration);

    print_results(&[
        benchmark("nop_loop", nop_loop, false, benchmark_duration),
        benchmark("alu_loop", alu_loop, false, benchmark_duration),
        benchmark("memory_loop", memory_loop, false, benchmark_duration),
        benchmark("ticked_memory", memory_loop, true, benchmark_duration),
    ]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_benchmark_loops_run() {
        for program in [nop_loop, alu_loop, memory_loop] {
            let result = benchmark("smoke", program, true, Duration::from_millis(50));
            assert!(result.instructions_per_second > 0.0);
        }
    }
}
