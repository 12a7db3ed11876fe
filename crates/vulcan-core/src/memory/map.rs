//! Conventional memory layout and region decoding.
//!
//! The engine enforces none of these boundaries. They describe where reset
//! places the stacks and where loaders put programs.

/// Inclusive start of the low reserved region.
pub const RESERVED_START: u32 = 0x0_0000;
/// Inclusive end of the low reserved region.
pub const RESERVED_END: u32 = 0x0_00FF;
/// Inclusive start of the stack region.
pub const STACK_START: u32 = 0x0_0100;
/// Inclusive end of the stack region.
pub const STACK_END: u32 = 0x0_03FF;
/// Inclusive start of general-purpose memory.
pub const GENERAL_START: u32 = 0x0_0400;
/// Inclusive end of general-purpose memory.
pub const GENERAL_END: u32 = 0x1_FFFF;

/// Reset value of `dp`; the data stack grows upward from here.
pub const DATA_STACK_BASE: u32 = STACK_START;
/// Reset value of `sp`; the call stack grows downward from here.
pub const CALL_STACK_TOP: u32 = STACK_END + 1;
/// Reset value of `pc`.
pub const BOOT_PC: u32 = GENERAL_START;
/// Address programs are loaded at by [`crate::Machine::load_program`].
pub const PROGRAM_START: u32 = GENERAL_START;

/// Descriptor for one conventional region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RegionDescriptor {
    /// Region classification.
    pub region: MemoryRegion,
    /// Inclusive start address.
    pub start: u32,
    /// Inclusive end address.
    pub end: u32,
}

/// Region classification for masked addresses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MemoryRegion {
    /// Reserved low memory (`0x00000..=0x000FF`).
    Reserved,
    /// Shared data/call stack storage (`0x00100..=0x003FF`).
    Stack,
    /// Program, data and device windows (`0x00400..=0x1FFFF`).
    General,
}

impl MemoryRegion {
    /// Returns the inclusive bounds for this region.
    #[must_use]
    pub const fn bounds(self) -> (u32, u32) {
        match self {
            Self::Reserved => (RESERVED_START, RESERVED_END),
            Self::Stack => (STACK_START, STACK_END),
            Self::General => (GENERAL_START, GENERAL_END),
        }
    }

    /// Returns `true` when `addr` belongs to this region.
    #[must_use]
    pub const fn contains(self, addr: u32) -> bool {
        let (start, end) = self.bounds();
        addr >= start && addr <= end
    }

    /// Returns the descriptor for this region.
    #[must_use]
    pub const fn descriptor(self) -> RegionDescriptor {
        let (start, end) = self.bounds();
        RegionDescriptor {
            region: self,
            start,
            end,
        }
    }
}

/// Conventional region layout in ascending address order.
pub const FIXED_MEMORY_REGIONS: [RegionDescriptor; 3] = [
    MemoryRegion::Reserved.descriptor(),
    MemoryRegion::Stack.descriptor(),
    MemoryRegion::General.descriptor(),
];

const _: () = assert_fixed_region_layout();

const fn assert_fixed_region_layout() {
    assert!(
        FIXED_MEMORY_REGIONS[0].start == 0,
        "layout must start at address zero"
    );
    assert!(
        FIXED_MEMORY_REGIONS[0].end + 1 == FIXED_MEMORY_REGIONS[1].start,
        "reserved and stack regions must be contiguous"
    );
    assert!(
        FIXED_MEMORY_REGIONS[1].end + 1 == FIXED_MEMORY_REGIONS[2].start,
        "stack and general regions must be contiguous"
    );
    assert!(
        FIXED_MEMORY_REGIONS[2].end == crate::memory::ADDRESS_MASK,
        "layout must cover the whole address space"
    );
}

/// Classifies an address after masking it into the 17-bit window.
#[must_use]
pub const fn decode_memory_region(addr: u32) -> MemoryRegion {
    let addr = addr & crate::memory::ADDRESS_MASK;
    if addr <= RESERVED_END {
        MemoryRegion::Reserved
    } else if addr <= STACK_END {
        MemoryRegion::Stack
    } else {
        MemoryRegion::General
    }
}
