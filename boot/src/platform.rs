//! Board layouts
//!
//! The menu runs on several boards, with differing amounts of QSPI flash.
//! The flash is split into equal slots, each holding one core.

use storage::RegisterFile;

use crate::{hw::reg, Error, Result};

/// Most slots any board has.  Slot tables are sized for this.
pub const MAX_SLOTS: usize = 8;

/// Every core starts with a 4k header, the bitstream itself follows it.
pub const CORE_HEADER_SIZE: u32 = 4096;

/// The configuration of one board.
#[derive(Debug, PartialEq, Eq)]
pub struct Platform {
    /// Value of the hardware model register.
    pub model_id: u8,
    pub name: &'static str,
    /// Number of flash slots.  Slot 0 is the factory core.
    pub slot_count: usize,
    /// Slot size, in megabytes.
    pub slot_mb: u32,
    /// Boards without a NO-SCROLL key also enter the menu while TAB is held.
    pub tab_for_menu: bool,
}

impl Platform {
    /// Size of a slot in bytes.
    pub const fn slot_size(&self) -> u32 {
        self.slot_mb * 1024 * 1024
    }

    /// Flash offset the reconfiguration trigger needs to start `slot`.  The
    /// factory core in slot 0 is started from the very beginning of flash.
    pub const fn boot_offset(&self, slot: usize) -> u32 {
        if slot == 0 {
            0
        } else {
            slot as u32 * self.slot_size() + CORE_HEADER_SIZE
        }
    }

    /// Look up a board by its model id.
    pub fn by_model(model_id: u8) -> Result<&'static Platform> {
        ALL_PLATFORMS
            .iter()
            .copied()
            .find(|p| p.model_id == model_id)
            .ok_or(Error::UnknownModel(model_id))
    }

    /// Read the model register and look up the board we are running on.
    pub fn probe<R: RegisterFile>(regs: &mut R) -> Result<&'static Platform> {
        let id = regs.peek(reg::MODEL_ID);
        let platform = Platform::by_model(id)?;
        info!("hardware model {:x}: {} slots of {}MB", id, platform.slot_count, platform.slot_mb);
        Ok(platform)
    }
}

pub static MEGA65_R2: Platform = Platform {
    model_id: 0x02,
    name: "MEGA65 R2",
    slot_count: 4,
    slot_mb: 8,
    tab_for_menu: false,
};

pub static MEGA65_R3: Platform = Platform {
    model_id: 0x03,
    name: "MEGA65 R3",
    slot_count: 8,
    slot_mb: 8,
    tab_for_menu: false,
};

pub static MEGA65_R4: Platform = Platform {
    model_id: 0x04,
    name: "MEGA65 R4",
    slot_count: 8,
    slot_mb: 8,
    tab_for_menu: false,
};

pub static MEGA65_R5: Platform = Platform {
    model_id: 0x05,
    name: "MEGA65 R5",
    slot_count: 8,
    slot_mb: 8,
    tab_for_menu: false,
};

/// Nexys4 DDR.  No NO-SCROLL key on a PC keyboard.
pub static NEXYS4DDR: Platform = Platform {
    model_id: 0x41,
    name: "NEXYS4DDR",
    slot_count: 4,
    slot_mb: 4,
    tab_for_menu: true,
};

pub static NEXYS4DDR_WIDGET: Platform = Platform {
    model_id: 0x42,
    name: "NEXYS4DDRWIDGET",
    slot_count: 4,
    slot_mb: 4,
    tab_for_menu: true,
};

pub static ALL_PLATFORMS: [&Platform; 6] = [
    &MEGA65_R2,
    &MEGA65_R3,
    &MEGA65_R4,
    &MEGA65_R5,
    &NEXYS4DDR,
    &NEXYS4DDR_WIDGET,
];
