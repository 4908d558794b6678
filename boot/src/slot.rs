//! Flash slot scanning
//!
//! Each slot of the flash starts with a core header.  Only the first sector
//! of the header is looked at:
//!
//! ```text
//! +-------+----------------------------------------------+
//! | 0x00  | magic, "MEGA65BITSTREAM0"                    |
//! | 0x10  | core name, ASCII, 32 bytes                   |
//! | 0x30  | core version, ASCII, 32 bytes                |
//! | 0x7b  | capabilities                                 |
//! | 0x7c  | flags (which cartridges start this core, and |
//! |       | whether it is the default core)              |
//! +-------+----------------------------------------------+
//! ```
//!
//! A slot without the magic is either empty (the sector is erased) or has
//! unknown content.
//!
//! The flags of a slot are only meaningful for the first slot that sets
//! them.  A later slot repeating a flag has it masked off, so after any scan,
//! a one-slot refresh included, every flag belongs to at most one slot and
//! that slot is the lowest one setting it.

use bitflags::bitflags;
use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use heapless::Vec;
use storage::{ReadFlash, RegisterFile, SECTOR_SIZE};

use crate::hw::Hardware;
use crate::label::Label;
use crate::platform::{Platform, MAX_SLOTS};

/// Every core header starts with this.
pub const BITSTREAM_MAGIC: [u8; 16] = *b"MEGA65BITSTREAM0";

const NAME_OFFSET: usize = 0x10;
const VERSION_OFFSET: usize = 0x30;
const CAPS_OFFSET: usize = 0x7b;
const FLAGS_OFFSET: usize = 0x7c;

/// Right after power up the flash may answer the first read of a sector with
/// this byte over and over.
const FIRST_READ_GARBAGE: u8 = 0xee;
const FIRST_READ_RETRIES: usize = 256;
const FIRST_READ_WAIT_MS: u16 = 50;

const FACTORY_LABEL: &[u8] = b"MEGA65 FACTORY CORE";
const EMPTY_LABEL: &[u8] = b"EMPTY SLOT";
const UNKNOWN_LABEL: &[u8] = b"UNKNOWN CONTENT";

bitflags! {
    /// Capability and flag bits of a core header.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct CoreCaps: u8 {
        const CART_C64     = 0b0000_0001;
        const CART_C128    = 0b0000_0010;
        const CART_M65     = 0b0000_0100;
        /// The core is started when no cartridge asks for another one.
        const SLOT_DEFAULT = 0b1000_0000;

        const CART = Self::CART_C64.bits() | Self::CART_C128.bits() | Self::CART_M65.bits();
        const USED = Self::CART.bits() | Self::SLOT_DEFAULT.bits();
    }
}

/// What is in a slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Validity {
    /// The first sector is erased.
    Empty,
    /// No core header.
    Invalid,
    Valid,
}

/// What the menu knows about one slot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SlotRecord {
    pub index: usize,
    pub name: Label,
    pub version: Label,
    /// Capability byte of the header, masked to the known bits.
    pub capabilities: CoreCaps,
    /// Flags byte of the header, masked to the known bits.
    pub header_flags: CoreCaps,
    /// Header flags, minus those already claimed by an earlier slot.
    pub flags: CoreCaps,
    pub validity: Validity,
}

impl SlotRecord {
    fn new(index: usize) -> SlotRecord {
        SlotRecord {
            index,
            name: Label::blank(),
            version: Label::blank(),
            capabilities: CoreCaps::empty(),
            header_flags: CoreCaps::empty(),
            flags: CoreCaps::empty(),
            validity: Validity::Invalid,
        }
    }
}

/// Which slots a scan visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    AllSlots,
    /// Refresh a single slot, after it was flashed.  Slot 0 can be refreshed
    /// along with it.
    OneSlot { index: usize, also_refresh_slot0: bool },
}

/// A scan of the slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanRequest {
    /// Flags to search for.  A search returns the first slot having any of
    /// them, and leaves names and versions alone.
    pub search: CoreCaps,
    pub target: Target,
}

impl ScanRequest {
    /// Read everything about every slot.
    pub const fn full() -> ScanRequest {
        ScanRequest { search: CoreCaps::empty(), target: Target::AllSlots }
    }

    /// Look for the first slot with any of `flags`.
    pub const fn search(flags: CoreCaps) -> ScanRequest {
        ScanRequest { search: flags, target: Target::AllSlots }
    }

    /// Re-read a single slot.
    pub const fn refresh(index: usize) -> ScanRequest {
        ScanRequest {
            search: CoreCaps::empty(),
            target: Target::OneSlot { index, also_refresh_slot0: false },
        }
    }

    fn searching(&self) -> bool {
        !self.search.is_empty()
    }
}

/// The slots of the flash, and what was last read from them.
pub struct SlotTable {
    platform: &'static Platform,
    slots: Vec<SlotRecord, MAX_SLOTS>,
    /// The first-read workaround has been done.
    primed: bool,
}

impl SlotTable {
    pub fn new(platform: &'static Platform) -> SlotTable {
        let mut slots = Vec::new();
        for index in 0..platform.slot_count.min(MAX_SLOTS) {
            // Capacity was checked just above.
            let _ = slots.push(SlotRecord::new(index));
        }
        SlotTable { platform, slots, primed: false }
    }

    pub fn platform(&self) -> &'static Platform {
        self.platform
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&SlotRecord> {
        self.slots.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SlotRecord> {
        self.slots.iter()
    }

    /// Scan the slots.
    ///
    /// Returns the first slot matching the search flags, if searching, or
    /// else the first slot carrying the default flag.  `None` when neither
    /// exists among the visited slots.
    pub fn scan<R, F, D>(&mut self, hw: &mut Hardware<R, F, D>, req: ScanRequest) -> Option<usize>
    where
        R: RegisterFile,
        F: ReadFlash,
        D: DelayMs<u16> + DelayUs<u16>,
    {
        if !self.primed {
            self.prime(hw);
        }

        let visit = self.plan(req.target);
        let mut sector = [0u8; SECTOR_SIZE];

        for index in visit.iter().copied() {
            let offset = index * self.platform.slot_size() as usize;
            let read_ok = match hw.flash.read(offset, &mut sector) {
                Ok(()) => true,
                Err(_) => {
                    warn!("slot {}: flash read failed", index);
                    false
                }
            };

            let slot = &mut self.slots[index];
            slot.validity = classify_sector(&sector, read_ok);

            if slot.validity == Validity::Valid {
                slot.capabilities = CoreCaps::from_bits_truncate(sector[CAPS_OFFSET]) & CoreCaps::USED;
                slot.header_flags = CoreCaps::from_bits_truncate(sector[FLAGS_OFFSET]) & CoreCaps::USED;
            } else {
                slot.capabilities = CoreCaps::empty();
                slot.header_flags = CoreCaps::empty();
            }

            // Searches have to be fast, names are not needed.
            if req.searching() {
                continue;
            }

            slot.name = Label::blank();
            slot.version = Label::blank();
            if slot.validity == Validity::Valid {
                slot.name = Label::from_ascii(&sector[NAME_OFFSET..NAME_OFFSET + 31]);
                slot.version = Label::from_ascii(&sector[VERSION_OFFSET..VERSION_OFFSET + 31]);
            }

            if index == 0 {
                slot.name = Label::from_ascii(FACTORY_LABEL);
            } else if slot.validity == Validity::Empty {
                slot.name = Label::from_ascii(EMPTY_LABEL);
            } else if slot.validity == Validity::Invalid {
                slot.name = Label::from_ascii(UNKNOWN_LABEL);
            }
        }

        self.assign_flags();

        let mut found = None;
        let mut default_slot = None;
        for slot in self.slots.iter().filter(|s| visit.contains(&s.index)) {
            if req.searching() && found.is_none() && slot.flags.intersects(req.search) {
                found = Some(slot.index);
            }
            if default_slot.is_none() && slot.flags.contains(CoreCaps::SLOT_DEFAULT) {
                default_slot = Some(slot.index);
            }
        }

        found.or(default_slot)
    }

    /// Which slots a scan visits.
    fn plan(&self, target: Target) -> Vec<usize, MAX_SLOTS> {
        let mut visit = Vec::new();
        match target {
            Target::AllSlots => {
                for index in 0..self.slots.len() {
                    let _ = visit.push(index);
                }
            }
            Target::OneSlot { index, also_refresh_slot0 } => {
                if also_refresh_slot0 && index != 0 {
                    let _ = visit.push(0);
                }
                if index < self.slots.len() {
                    let _ = visit.push(index);
                }
            }
        }
        visit
    }

    /// Hand every flag to the lowest slot whose header sets it.
    fn assign_flags(&mut self) {
        let mut available = CoreCaps::USED;
        for slot in self.slots.iter_mut() {
            slot.flags = slot.header_flags & available;
            available.remove(slot.flags);
            debug!("slot {}: flags {:x}", slot.index, slot.flags.bits());
        }
    }

    /// Work around the flash returning garbage on the first read after
    /// power up.  Retry until something else shows up, or we give up.
    fn prime<R, F, D>(&mut self, hw: &mut Hardware<R, F, D>)
    where
        R: RegisterFile,
        F: ReadFlash,
        D: DelayMs<u16> + DelayUs<u16>,
    {
        let mut sector = [0u8; SECTOR_SIZE];
        read_first_sector(hw, &mut sector);
        for _ in 0..FIRST_READ_RETRIES {
            if sector[0] != FIRST_READ_GARBAGE {
                break;
            }
            hw.delay.delay_ms(FIRST_READ_WAIT_MS);
            read_first_sector(hw, &mut sector);
            read_first_sector(hw, &mut sector);
        }
        self.primed = true;
    }
}

/// A failed read counts as garbage, so it is retried.
fn read_first_sector<R, F, D>(hw: &mut Hardware<R, F, D>, sector: &mut [u8; SECTOR_SIZE])
where
    F: ReadFlash,
{
    if hw.flash.read(0, sector).is_err() {
        warn!("slot 0: flash read failed");
        sector[0] = FIRST_READ_GARBAGE;
    }
}

/// Decide what the first sector of a slot holds.
fn classify_sector(sector: &[u8; SECTOR_SIZE], read_ok: bool) -> Validity {
    if !read_ok {
        return Validity::Invalid;
    }
    if sector[..BITSTREAM_MAGIC.len()] == BITSTREAM_MAGIC {
        Validity::Valid
    } else if sector.iter().all(|&b| b == 0xff) {
        Validity::Empty
    } else {
        Validity::Invalid
    }
}
