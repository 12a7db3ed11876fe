use crate::api::BootLayout;
use crate::state::RunState;

/// Register file of the Vulcan core.
///
/// Pointers are plain byte offsets. Nothing here checks that the stacks stay
/// inside their conventional region.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct RegisterFile {
    pc: u32,
    next_pc: Option<u32>,
    dp: u32,
    sp: u32,
    bottom_dp: u32,
    top_sp: u32,
    interrupt_enabled: bool,
    interrupt_vector: u32,
    run_state: RunState,
}

impl Default for RegisterFile {
    fn default() -> Self {
        Self::at_boot(&BootLayout::default())
    }
}

impl RegisterFile {
    /// Creates the reset register state for `boot`.
    #[must_use]
    pub const fn at_boot(boot: &BootLayout) -> Self {
        Self {
            pc: boot.pc,
            next_pc: None,
            dp: boot.dp,
            sp: boot.sp,
            bottom_dp: boot.dp,
            top_sp: boot.sp,
            interrupt_enabled: false,
            interrupt_vector: 0,
            run_state: RunState::Running,
        }
    }

    /// Reads the program counter.
    #[must_use]
    pub const fn pc(&self) -> u32 {
        self.pc
    }

    /// Writes the program counter.
    pub const fn set_pc(&mut self, value: u32) {
        self.pc = value;
    }

    /// Reads the staged next program counter, if a fetch has set one.
    #[must_use]
    pub const fn next_pc(&self) -> Option<u32> {
        self.next_pc
    }

    /// Stages the next program counter.
    pub const fn set_next_pc(&mut self, value: u32) {
        self.next_pc = Some(value);
    }

    /// Takes the staged next program counter, leaving it unset.
    pub const fn take_next_pc(&mut self) -> Option<u32> {
        self.next_pc.take()
    }

    /// Reads the data-stack pointer.
    #[must_use]
    pub const fn dp(&self) -> u32 {
        self.dp
    }

    /// Writes the data-stack pointer.
    pub const fn set_dp(&mut self, value: u32) {
        self.dp = value;
    }

    /// Reads the call-stack pointer.
    #[must_use]
    pub const fn sp(&self) -> u32 {
        self.sp
    }

    /// Writes the call-stack pointer.
    pub const fn set_sp(&mut self, value: u32) {
        self.sp = value;
    }

    /// Data-stack origin used for depth reporting.
    #[must_use]
    pub const fn bottom_dp(&self) -> u32 {
        self.bottom_dp
    }

    /// Call-stack origin used for depth reporting.
    #[must_use]
    pub const fn top_sp(&self) -> u32 {
        self.top_sp
    }

    /// Repoints both stacks and realigns their diagnostic origins.
    pub const fn repoint_stacks(&mut self, dp: u32, sp: u32) {
        self.dp = dp;
        self.sp = sp;
        self.bottom_dp = dp;
        self.top_sp = sp;
    }

    /// Returns `true` while interrupts are accepted.
    #[must_use]
    pub const fn interrupt_enabled(&self) -> bool {
        self.interrupt_enabled
    }

    /// Opens or closes the interrupt gate.
    pub const fn set_interrupt_enabled(&mut self, enabled: bool) {
        self.interrupt_enabled = enabled;
    }

    /// Reads the interrupt vector.
    #[must_use]
    pub const fn interrupt_vector(&self) -> u32 {
        self.interrupt_vector
    }

    /// Writes the interrupt vector.
    pub const fn set_interrupt_vector(&mut self, value: u32) {
        self.interrupt_vector = value;
    }

    /// Reads the run state.
    #[must_use]
    pub const fn run_state(&self) -> RunState {
        self.run_state
    }

    /// Writes the run state.
    pub const fn set_run_state(&mut self, state: RunState) {
        self.run_state = state;
    }

    /// Returns `true` once `HLT` has retired.
    #[must_use]
    pub const fn halted(&self) -> bool {
        self.run_state.is_halted()
    }
}
