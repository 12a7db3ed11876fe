//! Instruction disassembly for debugger listings.
//!
//! Reads backing memory directly, so listing a device window never triggers
//! device hooks.

use std::fmt;

use crate::decoder::Decoder;
use crate::encoding::Opcode;
use crate::memory::read_byte_raw;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A single disassembled instruction row.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct DisassemblyRow {
    /// Address of the instruction byte.
    pub addr: u32,
    /// Instruction byte plus literal bytes.
    pub bytes: Vec<u8>,
    /// Lowercase mnemonic; `push` for a literal-carrying `nop`.
    pub mnemonic: String,
    /// Inline literal, if present.
    pub literal: Option<u32>,
    /// Whether the opcode field is unassigned.
    pub is_unknown: bool,
}

impl DisassemblyRow {
    /// Encoded length in bytes.
    #[must_use]
    pub fn len_bytes(&self) -> u32 {
        u32::try_from(self.bytes.len()).unwrap_or(u32::MAX)
    }
}

impl fmt::Display for DisassemblyRow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#07x}:", self.addr)?;
        for byte in &self.bytes {
            write!(f, " {byte:02x}")?;
        }
        for _ in self.bytes.len()..4 {
            f.write_str("   ")?;
        }
        if self.is_unknown {
            return write!(f, "  .db {:#04x}", self.bytes.first().copied().unwrap_or(0));
        }
        write!(f, "  {}", self.mnemonic)?;
        if let Some(literal) = self.literal {
            write!(f, " {literal:#x}")?;
        }
        Ok(())
    }
}

/// Disassembles one instruction at `addr`.
#[must_use]
pub fn disassemble_one(memory: &[u8], addr: u32) -> DisassemblyRow {
    let decoded = Decoder::fetch(addr, |at| read_byte_raw(memory, at));
    let bytes = (0..decoded.encoded_len())
        .map(|offset| read_byte_raw(memory, addr.wrapping_add(offset)))
        .collect();
    let mnemonic = match decoded.opcode {
        Some(Opcode::Nop) if decoded.literal.is_some() => "push",
        Some(opcode) => opcode.mnemonic(),
        None => ".db",
    };

    DisassemblyRow {
        addr,
        bytes,
        mnemonic: mnemonic.to_owned(),
        literal: decoded.literal,
        is_unknown: decoded.is_unknown(),
    }
}

/// Disassembles `count` consecutive instructions starting at `start`.
///
/// Addresses wrap through the 17-bit mask; bytes past the end of a short
/// `memory` slice read as zero. An unassigned opcode becomes one `.db` row
/// spanning its literal field.
#[must_use]
pub fn disassemble(memory: &[u8], start: u32, count: usize) -> Vec<DisassemblyRow> {
    let mut rows = Vec::with_capacity(count);
    let mut addr = start;
    for _ in 0..count {
        let row = disassemble_one(memory, addr);
        addr = addr.wrapping_add(row.len_bytes());
        rows.push(row);
    }
    rows
}
