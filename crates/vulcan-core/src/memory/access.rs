//! Device-free access to backing memory.
//!
//! Stack storage and host loaders use these helpers; they never consult the
//! device table. Every byte address is masked to the 17-bit window
//! independently, so a word access at the top of memory wraps to address 0.
//! A slice shorter than the window reads as zero past its end and ignores
//! writes there.

use crate::memory::ADDRESS_MASK;
use crate::word::{word_from_le_bytes, word_to_le_bytes};

/// Masks `addr` into the addressable window and returns it as an index.
#[must_use]
pub const fn mask_address(addr: u32) -> usize {
    (addr & ADDRESS_MASK) as usize
}

/// Reads one byte of backing memory.
#[must_use]
pub fn read_byte_raw(memory: &[u8], addr: u32) -> u8 {
    memory.get(mask_address(addr)).copied().unwrap_or(0)
}

/// Writes one byte of backing memory.
pub fn write_byte_raw(memory: &mut [u8], addr: u32, value: u8) {
    if let Some(slot) = memory.get_mut(mask_address(addr)) {
        *slot = value;
    }
}

/// Reads a little-endian word from `addr`, `addr + 1` and `addr + 2`.
#[must_use]
pub fn read_word_raw(memory: &[u8], addr: u32) -> u32 {
    word_from_le_bytes([
        read_byte_raw(memory, addr),
        read_byte_raw(memory, addr.wrapping_add(1)),
        read_byte_raw(memory, addr.wrapping_add(2)),
    ])
}

/// Writes the low 24 bits of `word` little-endian at `addr`.
pub fn write_word_raw(memory: &mut [u8], addr: u32, word: u32) {
    for (offset, byte) in (0u32..).zip(word_to_le_bytes(word)) {
        write_byte_raw(memory, addr.wrapping_add(offset), byte);
    }
}

#[cfg(test)]
mod tests {
    use super::{mask_address, read_byte_raw, read_word_raw, write_byte_raw, write_word_raw};
    use crate::memory::zeroed_address_space;

    #[test]
    fn addresses_wrap_into_17_bits() {
        assert_eq!(mask_address(0x2_0000), 0);
        assert_eq!(mask_address(0x2_0300), 0x300);
        assert_eq!(mask_address(u32::MAX), 0x1_FFFF);
    }

    #[test]
    fn byte_access_masks_address() {
        let mut memory = zeroed_address_space();
        write_byte_raw(&mut memory, 0x4_0010, 0xAB);
        assert_eq!(read_byte_raw(&memory, 0x10), 0xAB);
    }

    #[test]
    fn word_access_is_little_endian() {
        let mut memory = zeroed_address_space();
        write_word_raw(&mut memory, 0x300, 0x12_3456);
        assert_eq!(memory[0x300..0x303], [0x56, 0x34, 0x12]);
        assert_eq!(read_word_raw(&memory, 0x300), 0x12_3456);
    }

    #[test]
    fn word_access_drops_high_byte() {
        let mut memory = zeroed_address_space();
        memory[0x303] = 0xEE;
        write_word_raw(&mut memory, 0x300, 0xFF12_3456);
        assert_eq!(read_word_raw(&memory, 0x300), 0x12_3456);
        assert_eq!(memory[0x303], 0xEE);
    }

    #[test]
    fn word_access_wraps_at_top_of_memory() {
        let mut memory = zeroed_address_space();
        write_word_raw(&mut memory, 0x1_FFFF, 0xAA_BBCC);
        assert_eq!(memory[0x1_FFFF], 0xCC);
        assert_eq!(memory[0], 0xBB);
        assert_eq!(memory[1], 0xAA);
        assert_eq!(read_word_raw(&memory, 0x1_FFFF), 0xAA_BBCC);
    }

    #[test]
    fn short_slice_reads_zero_past_end() {
        let mut memory = [0x11, 0x22];
        assert_eq!(read_word_raw(&memory, 0), 0x00_2211);
        assert_eq!(read_byte_raw(&memory, 0x1_0000), 0);

        write_word_raw(&mut memory, 1, 0xCC_BBAA);
        assert_eq!(memory, [0x11, 0xAA]);
        assert_eq!(read_byte_raw(&[], 5), 0);
    }
}
