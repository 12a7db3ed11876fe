//! Memory-mapped device registration and dispatch.
//!
//! A device claims an inclusive address range and exposes any subset of four
//! hooks. The capability set is read once at install time; accesses then
//! scan the table in registration order and the first device whose range
//! matches and which has the needed hook wins. Ranges may overlap.
//!
//! Every hook receives the machine's [`CpuState`], so a device may push
//! words, repoint registers or raise an interrupt from any hook.

use std::fmt;

use log::debug;

use crate::fault::InstallError;
use crate::memory::ADDRESS_MASK;
use crate::state::CpuState;

/// Default number of device slots.
pub const DEFAULT_DEVICE_CAPACITY: usize = 100;

/// Hooks a device provides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    /// Device wants a callback on machine reset.
    pub reset: bool,
    /// Device answers reads in its range.
    pub peek: bool,
    /// Device absorbs writes in its range.
    pub poke: bool,
    /// Device wants a callback after every run-loop cycle.
    pub tick: bool,
}

impl Capabilities {
    /// No hooks.
    pub const NONE: Self = Self {
        reset: false,
        peek: false,
        poke: false,
        tick: false,
    };

    /// Every hook.
    pub const ALL: Self = Self {
        reset: true,
        peek: true,
        poke: true,
        tick: true,
    };

    /// Adds the reset hook.
    #[must_use]
    pub const fn with_reset(mut self) -> Self {
        self.reset = true;
        self
    }

    /// Adds the peek hook.
    #[must_use]
    pub const fn with_peek(mut self) -> Self {
        self.peek = true;
        self
    }

    /// Adds the poke hook.
    #[must_use]
    pub const fn with_poke(mut self) -> Self {
        self.poke = true;
        self
    }

    /// Adds the tick hook.
    #[must_use]
    pub const fn with_tick(mut self) -> Self {
        self.tick = true;
        self
    }
}

/// A memory-mapped peripheral.
///
/// Only hooks advertised by [`Device::capabilities`] are ever called.
pub trait Device {
    /// Hooks this device implements.
    fn capabilities(&self) -> Capabilities;

    /// Called for every device with the reset hook when the machine resets,
    /// after the registers are back at their boot values.
    fn reset(&mut self, cpu: &mut CpuState) {
        let _ = cpu;
    }

    /// Returns the byte at `offset` from the start of the device range.
    fn peek(&mut self, offset: u32, cpu: &mut CpuState) -> u8 {
        let _ = (offset, cpu);
        0
    }

    /// Accepts a byte written at `offset` from the start of the device range.
    fn poke(&mut self, offset: u32, value: u8, cpu: &mut CpuState) {
        let _ = (offset, value, cpu);
    }

    /// Called once per run-loop cycle with full access to registers and
    /// memory.
    fn tick(&mut self, cpu: &mut CpuState) {
        let _ = cpu;
    }
}

/// Inclusive address range claimed by a device, masked to 17 bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DeviceRange {
    start: u32,
    end: u32,
}

impl DeviceRange {
    /// Creates an inclusive range. A range with `start > end` matches nothing.
    #[must_use]
    pub const fn new(start: u32, end: u32) -> Self {
        Self {
            start: start & ADDRESS_MASK,
            end: end & ADDRESS_MASK,
        }
    }

    /// First address of the range.
    #[must_use]
    pub const fn start(self) -> u32 {
        self.start
    }

    /// Last address of the range.
    #[must_use]
    pub const fn end(self) -> u32 {
        self.end
    }

    /// Returns `true` when the masked `addr` lies in the range.
    #[must_use]
    pub const fn contains(self, addr: u32) -> bool {
        let addr = addr & ADDRESS_MASK;
        addr >= self.start && addr <= self.end
    }

    /// Offset of the masked `addr` from the range start.
    #[must_use]
    pub const fn offset_of(self, addr: u32) -> u32 {
        (addr & ADDRESS_MASK).wrapping_sub(self.start)
    }
}

/// Handle returned by a successful install; the device's priority slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DeviceId(usize);

impl DeviceId {
    /// Zero-based registration index. Lower indices win overlaps.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

struct DeviceSlot {
    range: DeviceRange,
    capabilities: Capabilities,
    device: Box<dyn Device>,
}

/// Ordered, fixed-capacity device registry.
pub struct DeviceTable {
    slots: Vec<DeviceSlot>,
    capacity: usize,
}

impl fmt::Debug for DeviceTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeviceTable")
            .field("installed", &self.slots.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl Default for DeviceTable {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_DEVICE_CAPACITY)
    }
}

impl DeviceTable {
    /// Creates an empty table holding at most `capacity` devices.
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            capacity,
        }
    }

    /// Number of installed devices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Returns `true` when no device is installed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Maximum number of devices.
    #[must_use]
    pub const fn capacity(&self) -> usize {
        self.capacity
    }

    /// Registers `device` for `range` at the lowest remaining priority.
    ///
    /// # Errors
    ///
    /// Returns [`InstallError::TableFull`] when every slot is taken; the table
    /// is left unchanged.
    pub fn install(
        &mut self,
        range: DeviceRange,
        device: Box<dyn Device>,
    ) -> Result<DeviceId, InstallError> {
        if self.slots.len() >= self.capacity {
            return Err(InstallError::TableFull {
                capacity: self.capacity,
            });
        }

        let capabilities = device.capabilities();
        let id = DeviceId(self.slots.len());
        debug!(
            "device {} installed at {:#07x}..={:#07x} with {:?}",
            id.index(),
            range.start(),
            range.end(),
            capabilities
        );
        self.slots.push(DeviceSlot {
            range,
            capabilities,
            device,
        });
        Ok(id)
    }

    /// Range claimed by an installed device.
    #[must_use]
    pub fn range(&self, id: DeviceId) -> Option<DeviceRange> {
        self.slots.get(id.index()).map(|slot| slot.range)
    }

    /// Reads `addr` from the first matching device with a peek hook.
    ///
    /// `None` means the access falls through to backing memory.
    pub fn peek(&mut self, addr: u32, cpu: &mut CpuState) -> Option<u8> {
        self.slots
            .iter_mut()
            .find(|slot| slot.capabilities.peek && slot.range.contains(addr))
            .map(|slot| slot.device.peek(slot.range.offset_of(addr), cpu))
    }

    /// Writes `addr` to the first matching device with a poke hook.
    ///
    /// Returns `false` when the access falls through to backing memory.
    pub fn poke(&mut self, addr: u32, value: u8, cpu: &mut CpuState) -> bool {
        match self
            .slots
            .iter_mut()
            .find(|slot| slot.capabilities.poke && slot.range.contains(addr))
        {
            Some(slot) => {
                slot.device.poke(slot.range.offset_of(addr), value, cpu);
                true
            }
            None => false,
        }
    }

    /// Calls every reset hook in registration order.
    pub fn reset_all(&mut self, cpu: &mut CpuState) {
        self.slots
            .iter_mut()
            .filter(|slot| slot.capabilities.reset)
            .for_each(|slot| slot.device.reset(cpu));
    }

    /// Calls every tick hook in registration order.
    pub fn tick_all(&mut self, cpu: &mut CpuState) {
        self.slots
            .iter_mut()
            .filter(|slot| slot.capabilities.tick)
            .for_each(|slot| slot.device.tick(cpu));
    }
}

type PeekHook = Box<dyn FnMut(u32, &mut CpuState) -> u8>;
type PokeHook = Box<dyn FnMut(u32, u8, &mut CpuState)>;
type TickHook = Box<dyn FnMut(&mut CpuState)>;
type ResetHook = Box<dyn FnMut(&mut CpuState)>;

/// Device assembled from optional closures.
///
/// Each hook that is set becomes a capability; unset hooks are skipped.
#[derive(Default)]
pub struct HookDevice {
    reset: Option<ResetHook>,
    peek: Option<PeekHook>,
    poke: Option<PokeHook>,
    tick: Option<TickHook>,
}

impl HookDevice {
    /// Creates a device with no hooks.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the reset hook.
    #[must_use]
    pub fn on_reset(mut self, hook: impl FnMut(&mut CpuState) + 'static) -> Self {
        self.reset = Some(Box::new(hook));
        self
    }

    /// Sets the peek hook.
    #[must_use]
    pub fn on_peek(mut self, hook: impl FnMut(u32, &mut CpuState) -> u8 + 'static) -> Self {
        self.peek = Some(Box::new(hook));
        self
    }

    /// Sets the poke hook.
    #[must_use]
    pub fn on_poke(mut self, hook: impl FnMut(u32, u8, &mut CpuState) + 'static) -> Self {
        self.poke = Some(Box::new(hook));
        self
    }

    /// Sets the tick hook.
    #[must_use]
    pub fn on_tick(mut self, hook: impl FnMut(&mut CpuState) + 'static) -> Self {
        self.tick = Some(Box::new(hook));
        self
    }
}

impl Device for HookDevice {
    fn capabilities(&self) -> Capabilities {
        Capabilities {
            reset: self.reset.is_some(),
            peek: self.peek.is_some(),
            poke: self.poke.is_some(),
            tick: self.tick.is_some(),
        }
    }

    fn reset(&mut self, cpu: &mut CpuState) {
        if let Some(hook) = self.reset.as_mut() {
            hook(cpu);
        }
    }

    fn peek(&mut self, offset: u32, cpu: &mut CpuState) -> u8 {
        self.peek.as_mut().map_or(0, |hook| hook(offset, cpu))
    }

    fn poke(&mut self, offset: u32, value: u8, cpu: &mut CpuState) {
        if let Some(hook) = self.poke.as_mut() {
            hook(offset, value, cpu);
        }
    }

    fn tick(&mut self, cpu: &mut CpuState) {
        if let Some(hook) = self.tick.as_mut() {
            hook(cpu);
        }
    }
}
