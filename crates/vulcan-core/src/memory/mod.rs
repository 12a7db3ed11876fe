//! Memory model primitives and fixed address-space layout.

/// Raw masked byte and word access to backing memory.
pub mod access;
/// Fixed memory-region map and address decoder.
pub mod map;

pub use access::{mask_address, read_byte_raw, read_word_raw, write_byte_raw, write_word_raw};
pub use map::{
    decode_memory_region, MemoryRegion, RegionDescriptor, BOOT_PC, CALL_STACK_TOP,
    DATA_STACK_BASE, FIXED_MEMORY_REGIONS, GENERAL_END, GENERAL_START, PROGRAM_START,
    RESERVED_END, RESERVED_START, STACK_END, STACK_START,
};

use rand::RngCore;

/// Size in bytes of the flat address space (128 KiB).
pub const ADDRESS_SPACE_BYTES: usize = 0x2_0000;

/// Mask applied to every address before it touches memory or a device.
pub const ADDRESS_MASK: u32 = 0x1_FFFF;

/// Allocates an address-space backing store filled from `rng`.
///
/// Memory that no program has written holds noise, so programs must not
/// rely on zeroed storage.
#[must_use]
pub fn new_address_space<R: RngCore + ?Sized>(rng: &mut R) -> Box<[u8]> {
    let mut memory = zeroed_address_space();
    rng.fill_bytes(&mut memory);
    memory
}

/// Allocates a zeroed address-space backing store.
#[must_use]
pub fn zeroed_address_space() -> Box<[u8]> {
    vec![0; ADDRESS_SPACE_BYTES].into_boxed_slice()
}
