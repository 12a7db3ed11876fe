//! CPU state: register file plus the backing memory both stacks live in.

/// Interrupt entry sequence.
pub mod interrupt;
/// Register file and reset values.
pub mod registers;
/// Execution-state machine.
pub mod run_state;
/// Data- and call-stack discipline over backing memory.
pub mod stack;

pub use interrupt::InterruptOutcome;
pub use registers::RegisterFile;
pub use run_state::RunState;

use rand::RngCore;

use crate::api::BootLayout;
use crate::fault::SnapshotError;
use crate::memory::{new_address_space, ADDRESS_SPACE_BYTES};

/// Registers and memory of one machine, without its devices.
///
/// Device hooks receive this on every call, and it is what a snapshot
/// captures. Deserializing goes through [`CpuState::from_parts`], so a
/// short memory image is rejected.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde",
    derive(serde::Deserialize, serde::Serialize),
    serde(try_from = "CpuStateImage")
)]
pub struct CpuState {
    /// Register file.
    pub regs: RegisterFile,
    memory: Box<[u8]>,
}

/// Unchecked wire form of [`CpuState`].
#[cfg(feature = "serde")]
#[derive(serde::Deserialize)]
struct CpuStateImage {
    regs: RegisterFile,
    memory: Box<[u8]>,
}

#[cfg(feature = "serde")]
impl TryFrom<CpuStateImage> for CpuState {
    type Error = SnapshotError;

    fn try_from(image: CpuStateImage) -> Result<Self, Self::Error> {
        Self::from_parts(image.regs, image.memory)
    }
}

impl CpuState {
    /// Creates a state with noise-filled memory and reset registers.
    #[must_use]
    pub fn new<R: RngCore + ?Sized>(rng: &mut R, boot: &BootLayout) -> Self {
        Self {
            regs: RegisterFile::at_boot(boot),
            memory: new_address_space(rng),
        }
    }

    /// Wraps an existing memory image.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::MemorySize`] unless `memory` covers exactly
    /// the 128 KiB address space.
    pub fn from_parts(regs: RegisterFile, memory: Box<[u8]>) -> Result<Self, SnapshotError> {
        if memory.len() != ADDRESS_SPACE_BYTES {
            return Err(SnapshotError::MemorySize {
                expected: ADDRESS_SPACE_BYTES,
                actual: memory.len(),
            });
        }
        Ok(Self { regs, memory })
    }

    /// Backing memory.
    #[must_use]
    pub fn memory(&self) -> &[u8] {
        &self.memory
    }

    /// Mutable backing memory. The slice length is fixed.
    pub fn memory_mut(&mut self) -> &mut [u8] {
        &mut self.memory
    }

    /// Restores boot register values. Memory is left untouched.
    pub fn reset_registers(&mut self, boot: &BootLayout) {
        self.regs = RegisterFile::at_boot(boot);
    }
}
