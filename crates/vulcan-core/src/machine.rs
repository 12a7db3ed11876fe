//! The machine aggregate: CPU state, device table and random source.

use log::debug;
use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};

use crate::api::{Flags, MachineConfig, MachineSnapshot, RunOutcome, SnapshotVersion, StepOutcome};
use crate::device::{Device, DeviceId, DeviceRange, DeviceTable};
use crate::execute;
use crate::fault::{Fault, InstallError, SnapshotError, StackError};
use crate::memory::{read_byte_raw, write_byte_raw, PROGRAM_START};
use crate::state::{CpuState, InterruptOutcome};
use crate::word::{mask_word, word_from_le_bytes, word_to_le_bytes};

/// One Vulcan machine, owned by its host.
///
/// Fetch, `LOAD*`/`STORE*` and the host byte accessors go through the device
/// table. Stack traffic and the program loaders address backing memory
/// directly.
#[derive(Debug)]
pub struct Machine {
    pub(crate) cpu: CpuState,
    pub(crate) devices: DeviceTable,
    pub(crate) config: MachineConfig,
    rng: StdRng,
}

impl Default for Machine {
    fn default() -> Self {
        Self::with_config(MachineConfig::default())
    }
}

impl Machine {
    /// Creates a machine with noise-filled memory, seeded when `seed` is set.
    #[must_use]
    pub fn new(seed: Option<u64>) -> Self {
        Self::with_config(MachineConfig {
            seed,
            ..MachineConfig::default()
        })
    }

    /// Creates a machine from an explicit configuration.
    #[must_use]
    pub fn with_config(config: MachineConfig) -> Self {
        let mut rng = config
            .seed
            .map_or_else(StdRng::from_entropy, StdRng::seed_from_u64);
        let cpu = CpuState::new(&mut rng, &config.boot);
        let devices = DeviceTable::with_capacity(config.device_capacity);
        Self {
            cpu,
            devices,
            config,
            rng,
        }
    }

    /// Active configuration.
    #[must_use]
    pub const fn config(&self) -> &MachineConfig {
        &self.config
    }

    /// Registers and memory.
    #[must_use]
    pub const fn cpu(&self) -> &CpuState {
        &self.cpu
    }

    /// Mutable registers and memory.
    pub const fn cpu_mut(&mut self) -> &mut CpuState {
        &mut self.cpu
    }

    /// Installed devices.
    #[must_use]
    pub const fn devices(&self) -> &DeviceTable {
        &self.devices
    }

    /// Restores boot registers and runs every device reset hook.
    ///
    /// Memory keeps its contents.
    pub fn reset(&mut self) {
        debug!(
            "reset: pc={:#07x} dp={:#07x} sp={:#07x}",
            self.config.boot.pc, self.config.boot.dp, self.config.boot.sp
        );
        self.cpu.reset_registers(&self.config.boot);
        self.devices.reset_all(&mut self.cpu);
    }

    /// Installs `device` over the inclusive range `start..=end`.
    ///
    /// Later installs have lower priority where ranges overlap.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::TableFull`] when every slot is taken; the
    /// machine is left unchanged.
    pub fn install_device<D>(
        &mut self,
        start: u32,
        end: u32,
        device: D,
    ) -> Result<DeviceId, InstallError>
    where
        D: Device + 'static,
    {
        self.devices
            .install(DeviceRange::new(start, end), Box::new(device))
    }

    /// Reads a byte, dispatching to the first matching device with a peek hook.
    pub fn read_byte(&mut self, addr: u32) -> u8 {
        match self.devices.peek(addr, &mut self.cpu) {
            Some(value) => value,
            None => read_byte_raw(self.cpu.memory(), addr),
        }
    }

    /// Writes a byte, dispatching to the first matching device with a poke
    /// hook. A device write does not reach backing memory.
    pub fn write_byte(&mut self, addr: u32, value: u8) {
        if !self.devices.poke(addr, value, &mut self.cpu) {
            write_byte_raw(self.cpu.memory_mut(), addr, value);
        }
    }

    /// Reads a little-endian word as three independent byte reads.
    ///
    /// Each byte resolves on its own, so a word may straddle devices.
    pub fn read24(&mut self, addr: u32) -> u32 {
        word_from_le_bytes([
            self.read_byte(addr),
            self.read_byte(addr.wrapping_add(1)),
            self.read_byte(addr.wrapping_add(2)),
        ])
    }

    /// Writes the low 24 bits of `word` as three independent byte writes.
    pub fn write24(&mut self, addr: u32, word: u32) {
        for (offset, byte) in (0u32..).zip(word_to_le_bytes(word)) {
            self.write_byte(addr.wrapping_add(offset), byte);
        }
    }

    /// Copies `bytes` into backing memory from `addr`, masking each address.
    pub fn load_at(&mut self, addr: u32, bytes: &[u8]) {
        let memory = self.cpu.memory_mut();
        for (offset, byte) in (0u32..).zip(bytes) {
            write_byte_raw(memory, addr.wrapping_add(offset), *byte);
        }
    }

    /// Copies a program image to the conventional load address (`0x400`).
    pub fn load_program(&mut self, bytes: &[u8]) {
        self.load_at(PROGRAM_START, bytes);
    }

    /// Current program counter.
    #[must_use]
    pub const fn program_counter(&self) -> u32 {
        self.cpu.regs.pc()
    }

    /// Moves the program counter.
    pub const fn set_program_counter(&mut self, addr: u32) {
        self.cpu.regs.set_pc(addr);
    }

    /// Returns `true` once `HLT` has retired.
    #[must_use]
    pub const fn halted(&self) -> bool {
        self.cpu.regs.halted()
    }

    /// Halted and interrupt-enable flags.
    #[must_use]
    pub const fn flags(&self) -> Flags {
        Flags {
            halted: self.cpu.regs.halted(),
            interrupt_enabled: self.cpu.regs.interrupt_enabled(),
        }
    }

    /// Data-stack pointer.
    #[must_use]
    pub const fn data_pointer(&self) -> u32 {
        self.cpu.regs.dp()
    }

    /// Call-stack pointer.
    #[must_use]
    pub const fn call_pointer(&self) -> u32 {
        self.cpu.regs.sp()
    }

    /// Words on the data stack.
    #[must_use]
    pub const fn data_stack_depth(&self) -> i32 {
        self.cpu.data_stack_depth()
    }

    /// Data-stack word `index` entries below the top.
    #[must_use]
    pub fn data_stack_value_at(&self, index: u32) -> u32 {
        self.cpu.data_stack_value_at(index)
    }

    /// Words on the call stack.
    #[must_use]
    pub const fn return_stack_depth(&self) -> i32 {
        self.cpu.return_stack_depth()
    }

    /// Call-stack word `index` entries below the top.
    #[must_use]
    pub fn return_stack_value_at(&self, index: u32) -> u32 {
        self.cpu.return_stack_value_at(index)
    }

    /// Data-stack words, bottom first.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::DataUnderflow`] after the data stack underflows.
    pub fn data_stack(&self) -> Result<Vec<u32>, StackError> {
        self.cpu.data_stack()
    }

    /// Call-stack words, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`StackError::ReturnUnderflow`] after the call stack underflows.
    pub fn return_stack(&self) -> Result<Vec<u32>, StackError> {
        self.cpu.return_stack()
    }

    /// Pushes onto the data stack.
    pub fn push_data(&mut self, word: u32) {
        self.cpu.push_data(word);
    }

    /// Pops from the data stack.
    pub fn pop_data(&mut self) -> u32 {
        self.cpu.pop_data()
    }

    /// Pushes onto the call stack.
    pub fn push_call(&mut self, word: u32) {
        self.cpu.push_call(word);
    }

    /// Pops from the call stack.
    pub fn pop_call(&mut self) -> u32 {
        self.cpu.pop_call()
    }

    /// Requests an interrupt carrying `args` for the handler's data stack.
    ///
    /// A request while interrupts are disabled is dropped.
    pub fn request_interrupt(&mut self, args: &[u32]) -> InterruptOutcome {
        let outcome = self.cpu.request_interrupt(args);
        match outcome {
            InterruptOutcome::Accepted { vector, return_pc } => debug!(
                "interrupt accepted: vector={vector:#07x} return={return_pc:#07x} args={}",
                args.len()
            ),
            InterruptOutcome::Disabled => debug!("interrupt dropped: interrupts disabled"),
        }
        outcome
    }

    /// Calls every device tick hook once, in registration order.
    pub fn tick_devices(&mut self) {
        self.devices.tick_all(&mut self.cpu);
    }

    /// Executes one cycle without ticking devices.
    ///
    /// # Errors
    ///
    /// Returns the [`Fault`] raised by the cycle; see [`execute::step_one`].
    pub fn step_one_cycle(&mut self) -> Result<StepOutcome, Fault> {
        execute::step_one(self)
    }

    /// Runs cycles, ticking devices after each, until `HLT`.
    ///
    /// # Errors
    ///
    /// Returns the first [`Fault`] raised.
    pub fn run_until_halted(&mut self) -> Result<RunOutcome, Fault> {
        execute::run_until_halted(self)
    }

    /// Runs at most `max_cycles` cycles, ticking devices after each.
    ///
    /// # Errors
    ///
    /// Returns the first [`Fault`] raised.
    pub fn run_for(&mut self, max_cycles: u64) -> Result<RunOutcome, Fault> {
        execute::run_for(self, max_cycles)
    }

    /// Next word from the machine's random source.
    pub fn next_random_word(&mut self) -> u32 {
        mask_word(self.rng.next_u32())
    }

    /// Captures registers and memory.
    #[must_use]
    pub fn snapshot(&self) -> MachineSnapshot {
        MachineSnapshot {
            version: SnapshotVersion::V1,
            state: self.cpu.clone(),
        }
    }

    /// Replaces registers and memory with a captured state. Devices are kept.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::MemorySize`] when the image does not cover
    /// the address space; the machine is left unchanged.
    pub fn restore(&mut self, snapshot: MachineSnapshot) -> Result<(), SnapshotError> {
        let MachineSnapshot { state, .. } = snapshot;
        let expected = self.cpu.memory().len();
        if state.memory().len() != expected {
            return Err(SnapshotError::MemorySize {
                expected,
                actual: state.memory().len(),
            });
        }
        self.cpu = state;
        Ok(())
    }
}
