//! Core emulator crate for the Vulcan 24-bit stack machine.

/// 24-bit word arithmetic and little-endian byte packing.
pub mod word;
pub use word::{
    assemble_literal, from_signed, mask_word, to_signed, word_from_le_bytes, word_to_le_bytes,
    WORD_BITS, WORD_BYTES, WORD_MASK, WORD_SIGN_BIT,
};

/// Memory model primitives and fixed region map.
pub mod memory;
pub use memory::{
    decode_memory_region, mask_address, new_address_space, read_byte_raw, read_word_raw,
    write_byte_raw, write_word_raw, zeroed_address_space, MemoryRegion, RegionDescriptor,
    ADDRESS_MASK, ADDRESS_SPACE_BYTES, BOOT_PC, CALL_STACK_TOP, DATA_STACK_BASE,
    FIXED_MEMORY_REGIONS, GENERAL_END, GENERAL_START, PROGRAM_START, RESERVED_END,
    RESERVED_START, STACK_END, STACK_START,
};

/// Opcode table and instruction byte packing.
pub mod encoding;
pub use encoding::{
    encode_instruction, split_instruction_byte, Opcode, MAX_ARG_LENGTH, OPCODE_FIELD_MAX,
    OPCODE_TABLE,
};

/// Instruction fetch and decode.
pub mod decoder;
pub use decoder::{DecodedInstruction, Decoder};

/// Fault taxonomy and host-facing error types.
pub mod fault;
pub use fault::{Fault, FaultClass, FaultCode, InstallError, SnapshotError, StackError};

/// Architectural CPU state: registers, stacks and interrupt entry.
pub mod state;
pub use state::{CpuState, InterruptOutcome, RegisterFile, RunState};

/// Memory-mapped device registry.
pub mod device;
pub use device::{
    Capabilities, Device, DeviceId, DeviceRange, DeviceTable, HookDevice,
    DEFAULT_DEVICE_CAPACITY,
};

/// Public host-facing configuration and outcome types.
pub mod api;
pub use api::{
    BootLayout, Flags, MachineConfig, MachineSnapshot, RunOutcome, SnapshotVersion, StepOutcome,
    UnknownOpcodePolicy,
};

/// The machine: CPU state, device table and bus.
pub mod machine;
pub use machine::Machine;

/// Instruction execution pipeline and run loops.
pub mod execute;
pub use execute::{run_for, run_until_halted, step_one, tick_devices};

/// Stack dumps.
pub mod diag;
pub use diag::{format_return_stack, format_stack, EMPTY_STACK, UNDERFLOWED_STACK};

/// Debugger-oriented disassembly.
pub mod disasm;
pub use disasm::{disassemble, disassemble_one, DisassemblyRow};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
#[cfg(test)]
use serde_json as _;
