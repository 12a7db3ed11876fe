//! 24-bit machine word helpers.
//!
//! Every value that lands on either stack is a word: an unsigned 24-bit
//! quantity stored little-endian across three consecutive bytes.

/// Number of bits in a machine word.
pub const WORD_BITS: u32 = 24;
/// Mask applied to every value pushed onto a stack.
pub const WORD_MASK: u32 = 0x00FF_FFFF;
/// Sign bit of a word interpreted as two's complement.
pub const WORD_SIGN_BIT: u32 = 0x0080_0000;
/// Width of a word in memory.
pub const WORD_BYTES: u32 = 3;

const WORD_MODULUS: i32 = 0x0100_0000;

/// Truncates `value` to 24 bits.
#[must_use]
pub const fn mask_word(value: u32) -> u32 {
    value & WORD_MASK
}

/// Interprets a word as a two's-complement signed value (sign bit 23).
#[must_use]
#[allow(clippy::cast_possible_wrap)]
pub const fn to_signed(word: u32) -> i32 {
    let word = mask_word(word);
    if word & WORD_SIGN_BIT == 0 {
        word as i32
    } else {
        word as i32 - WORD_MODULUS
    }
}

/// Encodes a signed value as a 24-bit word, wrapping out-of-range values.
#[must_use]
#[allow(clippy::cast_sign_loss)]
pub const fn from_signed(value: i32) -> u32 {
    mask_word(value as u32)
}

/// Splits a word into its three little-endian bytes.
#[must_use]
pub const fn word_to_le_bytes(word: u32) -> [u8; 3] {
    let [lo, mid, hi, _] = word.to_le_bytes();
    [lo, mid, hi]
}

/// Joins three little-endian bytes into a word.
#[must_use]
pub const fn word_from_le_bytes(bytes: [u8; 3]) -> u32 {
    u32::from_le_bytes([bytes[0], bytes[1], bytes[2], 0])
}

/// Assembles up to three little-endian literal bytes into a word.
///
/// Bytes past the third are ignored.
#[must_use]
pub fn assemble_literal(bytes: &[u8]) -> u32 {
    bytes
        .iter()
        .take(WORD_BYTES as usize)
        .enumerate()
        .fold(0, |acc, (n, byte)| acc | (u32::from(*byte) << (8 * n)))
}
