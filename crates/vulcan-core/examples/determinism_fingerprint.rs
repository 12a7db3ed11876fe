//! Deterministic execution fingerprint used for cross-host comparison.
//!
//! Runs a fixed program on a seeded machine, with a ticking device that
//! raises one interrupt, and prints an FNV-1a hash of the final state.

use log as _;
use proptest as _;
use rand as _;
use rstest as _;
#[cfg(feature = "serde")]
use serde as _;
use serde_json as _;
use thiserror as _;
use vulcan_core::{encode_instruction, HookDevice, Machine, Opcode};

use std::cell::Cell;
use std::rc::Rc;

const SEED: u64 = 0x5EED_0001;

fn op(opcode: Opcode) -> u8 {
    encode_instruction(opcode, 0)
}

fn hash_bytes(hash: &mut u64, bytes: &[u8]) {
    for byte in bytes {
        *hash ^= u64::from(*byte);
        *hash = hash.wrapping_mul(0x1000_0000_01B3);
    }
}

fn fingerprint() -> String {
    let mut machine = Machine::new(Some(SEED));
    let ticks = Rc::new(Cell::new(0u32));
    let counter = Rc::clone(&ticks);
    machine
        .install_device(
            0xF000,
            0xF000,
            HookDevice::new().on_tick(move |cpu| {
                counter.set(counter.get() + 1);
                if counter.get() == 20 {
                    let _ = cpu.request_interrupt(&[0x77]);
                }
            }),
        )
        .expect("empty device table");

    // setiv 0x800; inton
    // loop: rand; storew 0x2000; jmp 0x404
    // 0x800: hlt
    machine.load_program(&[
        encode_instruction(Opcode::Setiv, 2),
        0x00,
        0x08,
        op(Opcode::Inton),
        op(Opcode::Rand),
        encode_instruction(Opcode::Storew, 2),
        0x00,
        0x20,
        0x02,
        0x04,
        0x04,
        op(Opcode::Jmp),
    ]);
    machine.load_at(0x800, &[op(Opcode::Hlt)]);

    let outcome = machine.run_for(1_000).expect("program runs without faults");

    let mut hash = 0xcbf2_9ce4_8422_2325_u64;
    hash_bytes(&mut hash, &outcome.steps.to_le_bytes());
    hash_bytes(&mut hash, &[u8::from(outcome.halted)]);
    hash_bytes(&mut hash, &machine.program_counter().to_le_bytes());
    hash_bytes(&mut hash, &machine.data_pointer().to_le_bytes());
    hash_bytes(&mut hash, &machine.call_pointer().to_le_bytes());
    for word in machine.data_stack().expect("data stack did not underflow") {
        hash_bytes(&mut hash, &word.to_le_bytes());
    }
    hash_bytes(&mut hash, machine.cpu().memory());

    format!("{hash:016x}")
}

fn main() {
    println!("{}", fingerprint());
}

#[cfg(test)]
mod tests {
    use super::fingerprint;

    #[test]
    fn fingerprint_is_stable_within_a_process() {
        assert_eq!(fingerprint(), fingerprint());
    }
}
