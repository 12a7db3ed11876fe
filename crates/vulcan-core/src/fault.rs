use thiserror::Error;

/// Fault classes used for diagnostics aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultClass {
    /// Arithmetic operation could not produce a result.
    Arithmetic,
    /// Fetched instruction byte does not name an assigned opcode.
    Decode,
}

/// Stable fault taxonomy reported by the stepping primitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[repr(u8)]
pub enum FaultCode {
    /// `DIV` or `MOD` popped a zero divisor.
    #[error("division by zero")]
    DivisionByZero = 0x01,
    /// Opcode field names no assigned instruction.
    #[error("unknown opcode")]
    UnknownOpcode = 0x02,
}

impl FaultCode {
    /// Converts a fault code to its stable byte value.
    #[must_use]
    pub const fn as_u8(self) -> u8 {
        self as u8
    }

    /// Converts a stable byte value back into a fault code.
    #[must_use]
    pub const fn from_u8(code: u8) -> Option<Self> {
        match code {
            0x01 => Some(Self::DivisionByZero),
            0x02 => Some(Self::UnknownOpcode),
            _ => None,
        }
    }

    /// Returns the diagnostics fault class for this fault code.
    #[must_use]
    pub const fn class(self) -> FaultClass {
        match self {
            Self::DivisionByZero => FaultClass::Arithmetic,
            Self::UnknownOpcode => FaultClass::Decode,
        }
    }
}

/// A fault raised while executing one cycle.
///
/// `pc` is the address of the faulting instruction. The machine's program
/// counter is left there, so the host may inspect state and resume or reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[error("{code} at pc {pc:#07x} (opcode {opcode})")]
pub struct Fault {
    /// Fault taxonomy entry.
    pub code: FaultCode,
    /// Address of the faulting instruction.
    pub pc: u32,
    /// Six-bit opcode field of the faulting instruction.
    pub opcode: u8,
}

impl Fault {
    /// Creates a fault record.
    #[must_use]
    pub const fn new(code: FaultCode, pc: u32, opcode: u8) -> Self {
        Self { code, pc, opcode }
    }
}

/// Error returned when a device cannot be installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum InstallError {
    /// Every slot of the device table is taken.
    #[error("device table is full ({capacity} slots)")]
    TableFull {
        /// Fixed capacity of the table.
        capacity: usize,
    },
}

/// Error returned when a snapshot cannot be restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum SnapshotError {
    /// Snapshot memory image does not cover the full address space.
    #[error("snapshot memory is {actual} bytes, expected {expected}")]
    MemorySize {
        /// Required image length.
        expected: usize,
        /// Length found in the snapshot.
        actual: usize,
    },
}

/// Error returned when a stack view is taken below the stack's base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
pub enum StackError {
    /// `dp` sits below the data-stack base.
    #[error("data stack underflowed by {words} words")]
    DataUnderflow {
        /// Words popped past the base.
        words: u32,
    },
    /// `sp` sits above the call-stack top.
    #[error("return stack underflowed by {words} words")]
    ReturnUnderflow {
        /// Words popped past the top.
        words: u32,
    },
}
