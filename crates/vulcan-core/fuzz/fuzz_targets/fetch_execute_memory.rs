#![no_main]

use libfuzzer_sys::fuzz_target;
use vulcan_core::{
    disassemble, Decoder, Machine, MachineConfig, UnknownOpcodePolicy, PROGRAM_START,
};

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let _ = Decoder::decode(data[0], &data[1..4]);

    let mut machine = Machine::with_config(MachineConfig {
        unknown_opcode: UnknownOpcodePolicy::Ignore,
        ..MachineConfig::seeded(0)
    });
    machine.load_program(data);
    let _ = machine.run_for(4_096);
    let _ = machine.request_interrupt(&[u32::from(data[0])]);
    let _ = machine.run_for(256);

    let _ = disassemble(machine.cpu().memory(), PROGRAM_START, 64);
});
