//! Flash styles
//!
//! The boards carry differently sized QSPI parts.  All of them read in 512
//! byte sectors through the menu's driver and erase in 64k blocks.

use crate::SimFlash;
use anyhow::Result;

const MB: usize = 1024 * 1024;

/// The configuration of a board's QSPI flash.
pub struct AreaLayout {
    pub read_size: usize,
    pub write_size: usize,
    pub erase_size: usize,
    pub sectors: usize,
    /// Size of one core slot.
    pub slot_size: usize,
    /// Model id of the board carrying this flash.
    pub model_id: u8,
}

impl AreaLayout {
    pub fn build(&self) -> Result<SimFlash> {
        SimFlash::new(
            self.read_size,
            self.write_size,
            self.erase_size,
            self.sectors,
        )
    }

    pub fn slot_count(&self) -> usize {
        self.erase_size * self.sectors / self.slot_size
    }

    /// Byte offset of a slot.
    pub fn slot_offset(&self, slot: usize) -> usize {
        slot * self.slot_size
    }
}

/// MEGA65 R2, 32MB in four slots.
pub static MEGA65_R2_QSPI: AreaLayout = AreaLayout {
    read_size: 1,
    write_size: 1,
    erase_size: 64 * 1024,
    sectors: 32 * MB / (64 * 1024),
    slot_size: 8 * MB,
    model_id: 0x02,
};

/// MEGA65 R3, 64MB in eight slots.
pub static MEGA65_R3_QSPI: AreaLayout = AreaLayout {
    read_size: 1,
    write_size: 1,
    erase_size: 64 * 1024,
    sectors: 64 * MB / (64 * 1024),
    slot_size: 8 * MB,
    model_id: 0x03,
};

/// Nexys4 DDR, 16MB in four slots.
pub static NEXYS4DDR_QSPI: AreaLayout = AreaLayout {
    read_size: 1,
    write_size: 1,
    erase_size: 64 * 1024,
    sectors: 16 * MB / (64 * 1024),
    slot_size: 4 * MB,
    model_id: 0x41,
};

/// All of the boards.
pub static ALL_FLASHES: [&AreaLayout; 3] = [
    &MEGA65_R2_QSPI,
    &MEGA65_R3_QSPI,
    &NEXYS4DDR_QSPI,
];

/// An iterator that builds each of the flashes in turn.
pub fn all_flashes() -> impl Iterator<Item = (&'static AreaLayout, Result<SimFlash>)> {
    ALL_FLASHES.iter().map(|layout| (*layout, layout.build()))
}
