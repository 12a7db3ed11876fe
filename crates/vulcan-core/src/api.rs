//! Public host-facing API contracts for embedding the machine.

use crate::device::DEFAULT_DEVICE_CAPACITY;
use crate::encoding::Opcode;
use crate::memory::{BOOT_PC, CALL_STACK_TOP, DATA_STACK_BASE};
use crate::state::CpuState;

/// Register values applied on reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct BootLayout {
    /// Boot program counter.
    pub pc: u32,
    /// Data-stack base; also the initial `bottom_dp`.
    pub dp: u32,
    /// Call-stack top; also the initial `top_sp`.
    pub sp: u32,
}

impl Default for BootLayout {
    fn default() -> Self {
        Self {
            pc: BOOT_PC,
            dp: DATA_STACK_BASE,
            sp: CALL_STACK_TOP,
        }
    }
}

/// What a cycle does with an unassigned opcode field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum UnknownOpcodePolicy {
    /// Report [`crate::FaultCode::UnknownOpcode`] and leave `pc` in place.
    #[default]
    Fault,
    /// Treat the instruction as a no-op and advance `pc`.
    Ignore,
}

/// Top-level configuration for a machine instance.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MachineConfig {
    /// Seed for the memory fill and `RAND`; `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Register values applied on construction and reset.
    pub boot: BootLayout,
    /// Number of device slots.
    pub device_capacity: usize,
    /// Handling of unassigned opcodes.
    pub unknown_opcode: UnknownOpcodePolicy,
    /// Emits a `trace`-level log record for every executed instruction.
    pub trace: bool,
}

impl Default for MachineConfig {
    fn default() -> Self {
        Self {
            seed: None,
            boot: BootLayout::default(),
            device_capacity: DEFAULT_DEVICE_CAPACITY,
            unknown_opcode: UnknownOpcodePolicy::Fault,
            trace: false,
        }
    }
}

impl MachineConfig {
    /// Default configuration with a fixed seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }
}

/// Output status from one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StepOutcome {
    /// Instruction executed and `pc` moved to the staged next address.
    Retired {
        /// Opcode that executed.
        opcode: Opcode,
    },
    /// `HLT` executed; `pc` stays on it.
    Halted,
    /// Machine was already halted; nothing happened.
    Idle,
    /// Unassigned opcode skipped under [`UnknownOpcodePolicy::Ignore`].
    Skipped {
        /// Six-bit opcode field that was skipped.
        opcode_bits: u8,
    },
}

/// Aggregated outcome of a multi-cycle run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RunOutcome {
    /// Cycles executed, the halting one included.
    pub steps: u64,
    /// Whether the run stopped because the machine halted.
    pub halted: bool,
}

/// Flag register view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Flags {
    /// `HLT` has retired.
    pub halted: bool,
    /// Interrupts are accepted.
    pub interrupt_enabled: bool,
}

/// Stable snapshot wire-version identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u16)]
pub enum SnapshotVersion {
    /// Initial schema revision.
    V1 = 1,
}

impl SnapshotVersion {
    /// Converts wire value to known snapshot version.
    #[must_use]
    pub const fn from_u16(version: u16) -> Option<Self> {
        match version {
            1 => Some(Self::V1),
            _ => None,
        }
    }
}

/// Registers and memory captured from a machine. Devices are not included.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct MachineSnapshot {
    /// Snapshot schema version.
    pub version: SnapshotVersion,
    /// Captured state.
    pub state: CpuState,
}

#[cfg(test)]
mod tests {
    use super::{BootLayout, MachineConfig, SnapshotVersion, UnknownOpcodePolicy};

    #[test]
    fn default_config_matches_reset_contract() {
        let config = MachineConfig::default();
        assert_eq!(config.seed, None);
        assert_eq!(
            config.boot,
            BootLayout {
                pc: 0x400,
                dp: 0x100,
                sp: 0x400
            }
        );
        assert_eq!(config.device_capacity, 100);
        assert_eq!(config.unknown_opcode, UnknownOpcodePolicy::Fault);
        assert!(!config.trace);
    }

    #[test]
    fn seeded_config_keeps_other_defaults() {
        let config = MachineConfig::seeded(42);
        assert_eq!(config.seed, Some(42));
        assert_eq!(config.boot, BootLayout::default());
    }

    #[test]
    fn snapshot_version_roundtrip_is_stable() {
        assert_eq!(SnapshotVersion::from_u16(1), Some(SnapshotVersion::V1));
        assert_eq!(SnapshotVersion::from_u16(2), None);
    }
}
