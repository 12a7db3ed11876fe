//! Instruction decoder for the Vulcan instruction byte.
//!
//! An instruction is one byte, `opcode << 2 | arg_length`, followed by
//! `arg_length` little-endian literal bytes. Decoding never fails: an
//! unassigned opcode field is reported as `opcode: None` and the executor
//! applies the configured unknown-opcode policy.

use crate::encoding::{split_instruction_byte, Opcode};
use crate::word::assemble_literal;

/// Decoded instruction with all extracted fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DecodedInstruction {
    /// Raw instruction byte.
    pub raw: u8,
    /// Six-bit opcode field, assigned or not.
    pub opcode_bits: u8,
    /// Assigned opcode, when the field names one.
    pub opcode: Option<Opcode>,
    /// Number of literal bytes following the instruction byte (0..=3).
    pub arg_length: u8,
    /// Assembled inline literal, present when `arg_length > 0`.
    pub literal: Option<u32>,
}

impl DecodedInstruction {
    /// Total encoded length in bytes, instruction byte included.
    #[must_use]
    pub const fn encoded_len(&self) -> u32 {
        self.arg_length as u32 + 1
    }

    /// Returns `true` when the opcode field is unassigned.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        self.opcode.is_none()
    }

    /// Returns `true` for `HLT`, which suppresses the PC advance.
    #[must_use]
    pub const fn is_halt(&self) -> bool {
        matches!(self.opcode, Some(Opcode::Hlt))
    }
}

/// Instruction decoder.
pub struct Decoder;

impl Decoder {
    /// Decodes an instruction byte and its trailing literal bytes.
    ///
    /// `operand` must hold at least the `arg_length` bytes read after the
    /// instruction byte; extra bytes are ignored and missing bytes read as
    /// zero.
    #[must_use]
    pub fn decode(instruction: u8, operand: &[u8]) -> DecodedInstruction {
        let (opcode_bits, arg_length) = split_instruction_byte(instruction);
        let literal = (arg_length > 0).then(|| {
            let take = operand.len().min(usize::from(arg_length));
            assemble_literal(&operand[..take])
        });

        DecodedInstruction {
            raw: instruction,
            opcode_bits,
            opcode: Opcode::from_u6(opcode_bits),
            arg_length,
            literal,
        }
    }

    /// Decodes the instruction at `pc` using `read` to fetch each byte.
    ///
    /// Only the instruction byte and its `arg_length` literal bytes are read,
    /// so reads through device windows happen exactly as often as a fetch
    /// performs them.
    pub fn fetch<F>(pc: u32, mut read: F) -> DecodedInstruction
    where
        F: FnMut(u32) -> u8,
    {
        let instruction = read(pc);
        let (_, arg_length) = split_instruction_byte(instruction);
        let mut operand = [0u8; 3];
        for (offset, byte) in (1u32..).zip(operand.iter_mut().take(usize::from(arg_length))) {
            *byte = read(pc.wrapping_add(offset));
        }
        Self::decode(instruction, &operand[..usize::from(arg_length)])
    }
}

#[cfg(test)]
mod tests {
    use super::Decoder;
    use crate::encoding::{encode_instruction, Opcode};

    #[test]
    fn decode_opcode_without_literal() {
        let decoded = Decoder::decode(encode_instruction(Opcode::Add, 0), &[]);
        assert_eq!(decoded.opcode, Some(Opcode::Add));
        assert_eq!(decoded.arg_length, 0);
        assert_eq!(decoded.literal, None);
        assert_eq!(decoded.encoded_len(), 1);
    }

    #[test]
    fn decode_push_literal_forms() {
        let one = Decoder::decode(0x01, &[0x05]);
        assert_eq!(one.opcode, Some(Opcode::Nop));
        assert_eq!(one.literal, Some(5));
        assert_eq!(one.encoded_len(), 2);

        let three = Decoder::decode(0x03, &[0x56, 0x34, 0x12]);
        assert_eq!(three.literal, Some(0x12_3456));
        assert_eq!(three.encoded_len(), 4);
    }

    #[test]
    fn literal_with_opcode_is_decoded_alongside() {
        let decoded = Decoder::decode(encode_instruction(Opcode::Store, 2), &[0x00, 0x03]);
        assert_eq!(decoded.opcode, Some(Opcode::Store));
        assert_eq!(decoded.literal, Some(0x300));
    }

    #[test]
    fn unassigned_opcode_field_decodes_as_unknown() {
        let decoded = Decoder::decode(0xFC, &[]);
        assert!(decoded.is_unknown());
        assert_eq!(decoded.opcode_bits, 0x3F);
    }

    #[test]
    fn halt_is_flagged() {
        assert!(Decoder::decode(encode_instruction(Opcode::Hlt, 0), &[]).is_halt());
        assert!(!Decoder::decode(encode_instruction(Opcode::Ret, 0), &[]).is_halt());
    }

    #[test]
    fn fetch_reads_only_declared_literal_bytes() {
        let program = [0x02u8, 0x34, 0x12, 0xEE];
        let mut reads = Vec::new();
        let decoded = Decoder::fetch(0x400, |addr| {
            reads.push(addr);
            program[(addr - 0x400) as usize]
        });
        assert_eq!(decoded.literal, Some(0x1234));
        assert_eq!(reads, vec![0x400, 0x401, 0x402]);
    }
}
