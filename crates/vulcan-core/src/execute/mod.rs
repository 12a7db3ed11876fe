//! Instruction cycle for the Vulcan core.
//!
//! One cycle is:
//! 1. Fetch the instruction byte and its literal bytes through the bus
//! 2. Push the literal, if any
//! 3. Stage `next_pc` past the instruction, unless the opcode is `HLT`
//! 4. Dispatch, which may restage `next_pc` or halt
//! 5. Commit `pc = next_pc`
//!
//! A faulting cycle leaves `pc` on the faulting instruction. Stack effects
//! performed before the fault (the literal push and operand pops) stand.

mod alu;

use log::{debug, log_enabled, trace, warn, Level};

use crate::api::{RunOutcome, StepOutcome, UnknownOpcodePolicy};
use crate::decoder::{DecodedInstruction, Decoder};
use crate::diag::format_stack;
use crate::encoding::Opcode;
use crate::fault::{Fault, FaultCode};
use crate::machine::Machine;
use crate::state::{CpuState, RunState};
use crate::word::mask_word;

/// Executes one fetch/decode/dispatch/commit cycle.
///
/// A halted machine does nothing and reports [`StepOutcome::Idle`]. Devices
/// are not ticked; run loops do that between cycles.
///
/// # Errors
///
/// Returns a [`Fault`] for division by zero, and for an unassigned opcode
/// under [`UnknownOpcodePolicy::Fault`]. `pc` is left on the faulting
/// instruction.
pub fn step_one(machine: &mut Machine) -> Result<StepOutcome, Fault> {
    if machine.cpu.regs.halted() {
        return Ok(StepOutcome::Idle);
    }

    let pc = machine.cpu.regs.pc();
    let decoded = Decoder::fetch(pc, |addr| machine.read_byte(addr));

    if let Some(literal) = decoded.literal {
        machine.cpu.push_data(literal);
    }

    let Some(opcode) = decoded.opcode else {
        return skip_unknown(machine, pc, &decoded);
    };

    if machine.config.trace {
        trace!(
            "{pc:#07x}: {:<7} {:>9} dp={:#07x} sp={:#07x}",
            opcode.mnemonic(),
            decoded
                .literal
                .map_or_else(String::new, |literal| format!("{literal:#x}")),
            machine.cpu.regs.dp(),
            machine.cpu.regs.sp()
        );
    }

    if opcode != Opcode::Hlt {
        machine
            .cpu
            .regs
            .set_next_pc(mask_word(pc.wrapping_add(decoded.encoded_len())));
    }

    if let Err(code) = dispatch(machine, opcode, pc) {
        machine.cpu.regs.take_next_pc();
        let fault = Fault::new(code, pc, decoded.opcode_bits);
        warn!("{fault}");
        return Err(fault);
    }

    if opcode == Opcode::Hlt {
        return Ok(StepOutcome::Halted);
    }

    if let Some(next) = machine.cpu.regs.take_next_pc() {
        machine.cpu.regs.set_pc(next);
    }
    Ok(StepOutcome::Retired { opcode })
}

fn skip_unknown(
    machine: &mut Machine,
    pc: u32,
    decoded: &DecodedInstruction,
) -> Result<StepOutcome, Fault> {
    match machine.config.unknown_opcode {
        UnknownOpcodePolicy::Fault => {
            let fault = Fault::new(FaultCode::UnknownOpcode, pc, decoded.opcode_bits);
            warn!("{fault}");
            Err(fault)
        }
        UnknownOpcodePolicy::Ignore => {
            machine
                .cpu
                .regs
                .set_pc(mask_word(pc.wrapping_add(decoded.encoded_len())));
            Ok(StepOutcome::Skipped {
                opcode_bits: decoded.opcode_bits,
            })
        }
    }
}

#[allow(clippy::too_many_lines)]
fn dispatch(machine: &mut Machine, opcode: Opcode, pc: u32) -> Result<(), FaultCode> {
    let cpu = &mut machine.cpu;
    match opcode {
        Opcode::Nop => {}
        Opcode::Add => binary(cpu, u32::wrapping_add),
        Opcode::Sub => binary(cpu, u32::wrapping_sub),
        Opcode::Mul => binary(cpu, u32::wrapping_mul),
        Opcode::Div => checked_binary(cpu, alu::div)?,
        Opcode::Mod => checked_binary(cpu, alu::rem)?,
        Opcode::Rand => {
            let word = machine.next_random_word();
            machine.cpu.push_data(word);
        }
        Opcode::And => binary(cpu, |a, b| a & b),
        Opcode::Or => binary(cpu, |a, b| a | b),
        Opcode::Xor => binary(cpu, |a, b| a ^ b),
        Opcode::Not => {
            let a = cpu.pop_data();
            cpu.push_data(alu::logical_not(a));
        }
        Opcode::Gt => binary(cpu, alu::greater),
        Opcode::Lt => binary(cpu, alu::less),
        Opcode::Agt => binary(cpu, alu::signed_greater),
        Opcode::Alt => binary(cpu, alu::signed_less),
        Opcode::Lshift => binary(cpu, alu::shift_left),
        Opcode::Rshift => binary(cpu, alu::shift_right),
        Opcode::Arshift => binary(cpu, alu::arithmetic_shift_right),
        Opcode::Pop => {
            cpu.pop_data();
        }
        Opcode::Dup => {
            let top = cpu.peek_data(0);
            cpu.push_data(top);
        }
        Opcode::Swap => {
            let b = cpu.pop_data();
            let a = cpu.pop_data();
            cpu.push_data(b);
            cpu.push_data(a);
        }
        Opcode::Pick => {
            let depth = cpu.pop_data();
            let value = cpu.peek_data(depth);
            cpu.push_data(value);
        }
        Opcode::Rot => {
            let c = cpu.pop_data();
            let b = cpu.pop_data();
            let a = cpu.pop_data();
            cpu.push_data(b);
            cpu.push_data(c);
            cpu.push_data(a);
        }
        Opcode::Jmp => {
            let target = cpu.pop_data();
            cpu.regs.set_next_pc(target);
        }
        Opcode::Jmpr => {
            let offset = cpu.pop_data();
            cpu.regs.set_next_pc(alu::relative_target(pc, offset));
        }
        Opcode::Call => {
            let target = cpu.pop_data();
            if let Some(return_pc) = cpu.regs.next_pc() {
                cpu.push_call(return_pc);
            }
            cpu.regs.set_next_pc(target);
        }
        Opcode::Ret => {
            let target = cpu.pop_call();
            cpu.regs.set_next_pc(target);
        }
        Opcode::Brz | Opcode::Brnz => {
            let offset = cpu.pop_data();
            let condition = cpu.pop_data();
            if (condition == 0) == (opcode == Opcode::Brz) {
                cpu.regs.set_next_pc(alu::relative_target(pc, offset));
            }
        }
        Opcode::Hlt => cpu.regs.set_run_state(RunState::Halted),
        Opcode::Load => {
            let addr = cpu.pop_data();
            let value = machine.read_byte(addr);
            machine.cpu.push_data(u32::from(value));
        }
        Opcode::Loadw => {
            let addr = cpu.pop_data();
            let value = machine.read24(addr);
            machine.cpu.push_data(value);
        }
        Opcode::Store => {
            let addr = cpu.pop_data();
            let [low, ..] = cpu.pop_data().to_le_bytes();
            machine.write_byte(addr, low);
        }
        Opcode::Storew => {
            let addr = cpu.pop_data();
            let value = cpu.pop_data();
            machine.write24(addr, value);
        }
        Opcode::Inton => cpu.regs.set_interrupt_enabled(true),
        Opcode::Intoff => cpu.regs.set_interrupt_enabled(false),
        Opcode::Setiv => {
            let vector = cpu.pop_data();
            cpu.regs.set_interrupt_vector(vector);
        }
        Opcode::Sdp => {
            let sp = cpu.regs.sp();
            cpu.push_data(sp);
            let dp = cpu.regs.dp();
            cpu.push_data(dp.wrapping_add(3));
        }
        Opcode::Setsdp => {
            let dp = cpu.pop_data();
            let sp = cpu.pop_data();
            cpu.regs.repoint_stacks(dp, sp);
        }
        Opcode::Pushr => {
            let value = cpu.pop_data();
            cpu.push_call(value);
        }
        Opcode::Popr => {
            let value = cpu.pop_call();
            cpu.push_data(value);
        }
        Opcode::Peekr => {
            let value = cpu.peek_call();
            cpu.push_data(value);
        }
        Opcode::Debug => {
            if log_enabled!(Level::Debug) {
                debug!("data stack at {pc:#07x}:\n{}", format_stack(cpu));
            }
        }
    }
    Ok(())
}

fn binary(cpu: &mut CpuState, op: impl FnOnce(u32, u32) -> u32) {
    let b = cpu.pop_data();
    let a = cpu.pop_data();
    cpu.push_data(op(a, b));
}

fn checked_binary(
    cpu: &mut CpuState,
    op: impl FnOnce(u32, u32) -> Option<u32>,
) -> Result<(), FaultCode> {
    let b = cpu.pop_data();
    let a = cpu.pop_data();
    let result = op(a, b).ok_or(FaultCode::DivisionByZero)?;
    cpu.push_data(result);
    Ok(())
}

/// Ticks every device once.
pub fn tick_devices(machine: &mut Machine) {
    machine.tick_devices();
}

/// Runs cycles, ticking devices after each, until the machine halts.
///
/// Returns at once on a halted machine. There is no cycle limit; use
/// [`run_for`] for a bounded run.
///
/// # Errors
///
/// Stops at the first [`Fault`] and returns it.
pub fn run_until_halted(machine: &mut Machine) -> Result<RunOutcome, Fault> {
    let mut steps = 0;
    while !machine.halted() {
        step_one(machine)?;
        steps += 1;
        machine.tick_devices();
    }
    Ok(RunOutcome {
        steps,
        halted: true,
    })
}

/// Runs at most `max_cycles` cycles, ticking devices after each.
///
/// # Errors
///
/// Stops at the first [`Fault`] and returns it.
pub fn run_for(machine: &mut Machine, max_cycles: u64) -> Result<RunOutcome, Fault> {
    let mut steps = 0;
    while steps < max_cycles && !machine.halted() {
        step_one(machine)?;
        steps += 1;
        machine.tick_devices();
    }
    Ok(RunOutcome {
        steps,
        halted: machine.halted(),
    })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::{run_for, run_until_halted, step_one};
    use crate::api::{MachineConfig, StepOutcome, UnknownOpcodePolicy};
    use crate::encoding::{encode_instruction, Opcode};
    use crate::fault::{Fault, FaultCode};
    use crate::machine::Machine;
    use crate::word::from_signed;

    fn op(opcode: Opcode) -> u8 {
        encode_instruction(opcode, 0)
    }

    fn machine_with(program: &[u8]) -> Machine {
        let mut machine = Machine::new(Some(0xC0FFEE));
        machine.load_program(program);
        machine
    }

    fn run_stack(program: &[u8]) -> Vec<u32> {
        let mut machine = machine_with(program);
        run_until_halted(&mut machine).expect("program halts cleanly");
        machine.data_stack().expect("data stack did not underflow")
    }

    #[test]
    fn literal_push_advances_past_operand_bytes() {
        let mut machine = machine_with(&[0x03, 0x56, 0x34, 0x12]);
        assert_eq!(
            step_one(&mut machine),
            Ok(StepOutcome::Retired {
                opcode: Opcode::Nop
            })
        );
        assert_eq!(machine.program_counter(), 0x404);
        assert_eq!(machine.data_stack(), Ok(vec![0x12_3456]));
    }

    #[rstest]
    #[case(Opcode::Add, 7, 5, 12)]
    #[case(Opcode::Sub, 7, 5, 2)]
    #[case(Opcode::Sub, 5, 7, 0xFF_FFFE)]
    #[case(Opcode::Mul, 0x1000, 0x1000, 0)]
    #[case(Opcode::Mul, 6, 7, 42)]
    #[case(Opcode::Div, 17, 5, 3)]
    #[case(Opcode::Mod, 17, 5, 2)]
    #[case(Opcode::And, 0b1100, 0b1010, 0b1000)]
    #[case(Opcode::Or, 0b1100, 0b1010, 0b1110)]
    #[case(Opcode::Xor, 0b1100, 0b1010, 0b0110)]
    #[case(Opcode::Gt, 5, 3, 1)]
    #[case(Opcode::Lt, 5, 3, 0)]
    #[case(Opcode::Lshift, 1, 4, 16)]
    #[case(Opcode::Rshift, 16, 4, 1)]
    #[case(Opcode::Arshift, 0x80_0000, 1, 0xC0_0000)]
    fn binary_operators_take_left_operand_first(
        #[case] opcode: Opcode,
        #[case] a: u32,
        #[case] b: u32,
        #[case] expected: u32,
    ) {
        let mut machine = machine_with(&[op(opcode), op(Opcode::Hlt)]);
        machine.push_data(a);
        machine.push_data(b);
        run_until_halted(&mut machine).expect("halts");
        assert_eq!(machine.data_stack(), Ok(vec![expected]));
    }

    #[test]
    fn arithmetic_wraps_to_24_bits() {
        let mut machine = machine_with(&[op(Opcode::Add), op(Opcode::Hlt)]);
        machine.push_data(0xFF_FFFF);
        machine.push_data(2);
        run_until_halted(&mut machine).expect("halts");
        assert_eq!(machine.data_stack(), Ok(vec![1]));
    }

    #[test]
    fn stack_shuffles() {
        assert_eq!(
            run_stack(&[0x01, 1, 0x01, 2, op(Opcode::Swap), op(Opcode::Hlt)]),
            vec![2, 1]
        );
        assert_eq!(
            run_stack(&[0x01, 9, op(Opcode::Dup), op(Opcode::Hlt)]),
            vec![9, 9]
        );
        assert_eq!(
            run_stack(&[0x01, 1, 0x01, 2, op(Opcode::Pop), op(Opcode::Hlt)]),
            vec![1]
        );
        assert_eq!(
            run_stack(&[0x01, 1, 0x01, 2, 0x01, 3, op(Opcode::Rot), op(Opcode::Hlt)]),
            vec![2, 3, 1]
        );
        assert_eq!(
            run_stack(&[
                0x01,
                10,
                0x01,
                20,
                0x01,
                30,
                encode_instruction(Opcode::Pick, 1),
                2,
                op(Opcode::Hlt)
            ]),
            vec![10, 20, 30, 10]
        );
    }

    #[test]
    fn not_is_logical_negation() {
        assert_eq!(
            run_stack(&[0x01, 0, op(Opcode::Not), 0x01, 7, op(Opcode::Not), op(Opcode::Hlt)]),
            vec![1, 0]
        );
    }

    #[test]
    fn halt_leaves_pc_on_instruction() {
        let mut machine = machine_with(&[op(Opcode::Nop), op(Opcode::Hlt)]);
        assert!(matches!(step_one(&mut machine), Ok(StepOutcome::Retired { .. })));
        assert_eq!(step_one(&mut machine), Ok(StepOutcome::Halted));
        assert!(machine.halted());
        assert_eq!(machine.program_counter(), 0x401);
        assert_eq!(machine.cpu().regs.next_pc(), None);
        assert_eq!(step_one(&mut machine), Ok(StepOutcome::Idle));
        assert_eq!(machine.program_counter(), 0x401);
    }

    #[test]
    fn absolute_and_relative_jumps() {
        // jmpr is relative to its own address: 0x412 + 4
        let mut machine = machine_with(&[0x02, 0x10, 0x04, op(Opcode::Jmp)]);
        machine.load_at(0x410, &[0x01, 4, op(Opcode::Jmpr)]);
        machine.load_at(0x416, &[op(Opcode::Hlt)]);
        run_until_halted(&mut machine).expect("halts");
        assert_eq!(machine.program_counter(), 0x416);
        assert_eq!(machine.data_stack_depth(), 0);
    }

    #[test]
    fn backward_relative_jump_uses_sign() {
        let mut machine = machine_with(&[]);
        let offset = from_signed(-0x10).to_le_bytes();
        machine.load_at(0x510, &[0x03, offset[0], offset[1], offset[2], op(Opcode::Jmpr)]);
        machine.set_program_counter(0x510);
        step_one(&mut machine).expect("push");
        step_one(&mut machine).expect("jmpr");
        assert_eq!(machine.program_counter(), 0x504);
    }

    #[rstest]
    #[case(Opcode::Brz, 0, 0x40A)]
    #[case(Opcode::Brz, 1, 0x405)]
    #[case(Opcode::Brnz, 1, 0x40A)]
    #[case(Opcode::Brnz, 0, 0x405)]
    fn conditional_branches_pop_offset_then_condition(
        #[case] opcode: Opcode,
        #[case] condition: u8,
        #[case] expected_pc: u32,
    ) {
        let mut machine = machine_with(&[0x01, condition, 0x01, 6, op(opcode)]);
        for _ in 0..3 {
            step_one(&mut machine).expect("step");
        }
        assert_eq!(machine.program_counter(), expected_pc);
        assert_eq!(machine.data_stack_depth(), 0);
    }

    #[test]
    fn call_then_ret_returns_after_call() {
        let mut machine = machine_with(&[0x02, 0x10, 0x04, op(Opcode::Call), op(Opcode::Hlt)]);
        machine.load_at(0x410, &[op(Opcode::Ret)]);
        step_one(&mut machine).expect("push");
        step_one(&mut machine).expect("call");
        assert_eq!(machine.program_counter(), 0x410);
        assert_eq!(machine.return_stack(), Ok(vec![0x404]));
        step_one(&mut machine).expect("ret");
        assert_eq!(machine.program_counter(), 0x404);
        assert_eq!(machine.return_stack_depth(), 0);
    }

    #[test]
    fn return_stack_transfers() {
        let mut machine = machine_with(&[
            0x01,
            5,
            op(Opcode::Pushr),
            op(Opcode::Peekr),
            op(Opcode::Popr),
            op(Opcode::Hlt),
        ]);
        run_until_halted(&mut machine).expect("halts");
        assert_eq!(machine.data_stack(), Ok(vec![5, 5]));
        assert_eq!(machine.return_stack_depth(), 0);
    }

    #[test]
    fn byte_and_word_memory_access() {
        let mut machine = machine_with(&[
            0x03,
            0x56,
            0x34,
            0x12,
            encode_instruction(Opcode::Storew, 2),
            0x00,
            0x30,
            encode_instruction(Opcode::Loadw, 2),
            0x00,
            0x30,
            encode_instruction(Opcode::Load, 2),
            0x01,
            0x30,
            op(Opcode::Hlt),
        ]);
        run_until_halted(&mut machine).expect("halts");
        assert_eq!(machine.data_stack(), Ok(vec![0x12_3456, 0x34]));
    }

    #[test]
    fn store_writes_low_byte_only() {
        let mut machine = machine_with(&[
            0x02,
            0xFF,
            0x01,
            encode_instruction(Opcode::Store, 2),
            0x00,
            0x30,
            op(Opcode::Hlt),
        ]);
        machine.load_at(0x3001, &[0xAB]);
        run_until_halted(&mut machine).expect("halts");
        assert_eq!(machine.read_byte(0x3000), 0xFF);
        assert_eq!(machine.read_byte(0x3001), 0xAB);
    }

    #[test]
    fn interrupt_control_opcodes() {
        let mut machine = machine_with(&[
            encode_instruction(Opcode::Setiv, 2),
            0x00,
            0x08,
            op(Opcode::Inton),
            op(Opcode::Hlt),
        ]);
        run_until_halted(&mut machine).expect("halts");
        assert!(machine.flags().interrupt_enabled);
        assert_eq!(machine.cpu().regs.interrupt_vector(), 0x800);

        let mut machine = machine_with(&[op(Opcode::Inton), op(Opcode::Intoff), op(Opcode::Hlt)]);
        run_until_halted(&mut machine).expect("halts");
        assert!(!machine.flags().interrupt_enabled);
    }

    #[test]
    fn sdp_reports_pointers_after_pushing() {
        let stack = run_stack(&[op(Opcode::Sdp), op(Opcode::Hlt)]);
        assert_eq!(stack, vec![0x400, 0x106]);
    }

    #[test]
    fn setsdp_repoints_both_stacks() {
        let mut machine = machine_with(&[
            0x02,
            0x80,
            0x03,
            0x02,
            0x00,
            0x02,
            op(Opcode::Setsdp),
            op(Opcode::Hlt),
        ]);
        run_until_halted(&mut machine).expect("halts");
        assert_eq!(machine.data_pointer(), 0x200);
        assert_eq!(machine.call_pointer(), 0x380);
        assert_eq!(machine.cpu().regs.bottom_dp(), 0x200);
        assert_eq!(machine.cpu().regs.top_sp(), 0x380);
        assert_eq!(machine.data_stack_depth(), 0);
    }

    #[test]
    fn rand_pushes_a_word_from_seeded_source() {
        let a = run_stack(&[op(Opcode::Rand), op(Opcode::Hlt)]);
        let b = run_stack(&[op(Opcode::Rand), op(Opcode::Hlt)]);
        assert_eq!(a.len(), 1);
        assert_eq!(a, b);
        assert!(a[0] <= 0xFF_FFFF);
    }

    #[test]
    fn debug_leaves_state_unchanged() {
        let mut machine = machine_with(&[0x01, 3, op(Opcode::Debug), op(Opcode::Hlt)]);
        step_one(&mut machine).expect("push");
        let before = machine.snapshot();
        step_one(&mut machine).expect("debug");
        let mut after = machine.snapshot();
        after.state.regs.set_pc(before.state.regs.pc());
        assert_eq!(after, before);
    }

    #[test]
    fn division_by_zero_faults_in_place() {
        let mut machine = machine_with(&[0x01, 9, 0x01, 0, op(Opcode::Div)]);
        step_one(&mut machine).expect("push");
        step_one(&mut machine).expect("push");
        let err = step_one(&mut machine).expect_err("divide by zero");
        assert_eq!(err, Fault::new(FaultCode::DivisionByZero, 0x404, 4));
        assert_eq!(machine.program_counter(), 0x404);
        assert_eq!(machine.data_pointer(), 0x100);
        assert_eq!(machine.call_pointer(), 0x400);
        assert_eq!(machine.cpu().regs.next_pc(), None);
    }

    #[test]
    fn unknown_opcode_faults_by_default() {
        let mut machine = machine_with(&[0xFC]);
        assert_eq!(
            step_one(&mut machine),
            Err(Fault::new(FaultCode::UnknownOpcode, 0x400, 0x3F))
        );
        assert_eq!(machine.program_counter(), 0x400);
    }

    #[test]
    fn unknown_opcode_is_skipped_when_ignored() {
        let mut machine = Machine::with_config(MachineConfig {
            unknown_opcode: UnknownOpcodePolicy::Ignore,
            ..MachineConfig::seeded(1)
        });
        machine.load_program(&[0xFD, 0x07, op(Opcode::Hlt)]);
        assert_eq!(
            step_one(&mut machine),
            Ok(StepOutcome::Skipped { opcode_bits: 0x3F })
        );
        assert_eq!(machine.program_counter(), 0x402);
        assert_eq!(machine.data_stack(), Ok(vec![7]));
        assert_eq!(run_until_halted(&mut machine).map(|run| run.steps), Ok(1));
    }

    #[test]
    fn bounded_run_stops_at_limit() {
        let mut machine = machine_with(&[0x02, 0x00, 0x04, op(Opcode::Jmp)]);
        let outcome = run_for(&mut machine, 10).expect("no fault");
        assert_eq!(outcome.steps, 10);
        assert!(!outcome.halted);

        let mut machine = machine_with(&[op(Opcode::Hlt)]);
        let outcome = run_for(&mut machine, 10).expect("no fault");
        assert_eq!(outcome.steps, 1);
        assert!(outcome.halted);
    }

    #[test]
    fn traced_machine_executes_identically() {
        let program = [0x01, 2, 0x01, 3, op(Opcode::Mul), op(Opcode::Hlt)];
        let mut traced = Machine::with_config(MachineConfig {
            trace: true,
            ..MachineConfig::seeded(0xC0FFEE)
        });
        traced.load_program(&program);
        run_until_halted(&mut traced).expect("halts");
        assert_eq!(traced.data_stack(), Ok(run_stack(&program)));
    }
}
