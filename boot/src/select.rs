//! Boot slot selection.
//!
//! The cartridge decides first: the first slot whose flags include the
//! cartridge's kind is started.  Without a cartridge, the first slot flagged
//! as default is.  When no slot claims either, DIP switch 4 picks slot 1 or
//! slot 2.

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use storage::{ReadFlash, RegisterFile};

use crate::cart::{self, CartId, Cartridge, ControlLines};
use crate::hw::Hardware;
use crate::slot::{ScanRequest, SlotTable};

/// The outcome of boot slot selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootChoice {
    pub cart_id: CartId,
    pub cartridge: Cartridge,
    pub slot: usize,
    /// The slot came from the DIP switch, no slot flags decided.
    pub by_dip_switch: bool,
}

/// Decide which slot to boot.
///
/// Runs the same way for the automatic start and for the diagnostics view,
/// so both always agree.
pub fn select_boot_slot<R, F, D>(
    hw: &mut Hardware<R, F, D>,
    slots: &mut SlotTable,
    lines: ControlLines,
) -> BootChoice
where
    R: RegisterFile,
    F: ReadFlash,
    D: DelayMs<u16> + DelayUs<u16>,
{
    let (cart_id, cartridge) = cart::classify(&mut hw.regs, lines);
    let found = slots.scan(hw, ScanRequest::search(cartridge.capability()));

    let choice = match found {
        Some(slot) => BootChoice { cart_id, cartridge, slot, by_dip_switch: false },
        None => BootChoice { cart_id, cartridge, slot: hw.dip4_slot(), by_dip_switch: true },
    };
    info!("cartridge {}, boot slot {}", cartridge.name(), choice.slot);
    choice
}
