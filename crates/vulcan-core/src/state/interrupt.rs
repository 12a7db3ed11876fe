use crate::state::{CpuState, RunState};

/// Result of an interrupt request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InterruptOutcome {
    /// Interrupt was delivered; execution resumes at the vector.
    Accepted {
        /// Address execution resumes at.
        vector: u32,
        /// Program counter saved on the call stack.
        return_pc: u32,
    },
    /// Interrupts were disabled; nothing changed and nothing is queued.
    Disabled,
}

impl InterruptOutcome {
    /// Returns `true` when the interrupt was delivered.
    #[must_use]
    pub const fn accepted(self) -> bool {
        matches!(self, Self::Accepted { .. })
    }
}

impl CpuState {
    /// Delivers an interrupt if the gate is open.
    ///
    /// On acceptance the gate closes, a halted machine resumes, the current
    /// `pc` goes onto the call stack, `args` are pushed onto the data stack in
    /// order and `pc` moves to the interrupt vector.
    ///
    /// Raised from a device hook while an instruction is executing, the
    /// staged `next_pc` is saved instead and the vector is staged in its
    /// place, so the instruction retires into the handler.
    pub fn request_interrupt(&mut self, args: &[u32]) -> InterruptOutcome {
        if !self.regs.interrupt_enabled() {
            return InterruptOutcome::Disabled;
        }

        let staged = self.regs.next_pc();
        let return_pc = staged.unwrap_or_else(|| self.regs.pc());
        let vector = self.regs.interrupt_vector();

        self.regs.set_interrupt_enabled(false);
        self.regs.set_run_state(RunState::Running);
        self.push_call(return_pc);
        for arg in args {
            self.push_data(*arg);
        }
        self.regs.set_pc(vector);
        if staged.is_some() {
            self.regs.set_next_pc(vector);
        }

        InterruptOutcome::Accepted { vector, return_pc }
    }
}
