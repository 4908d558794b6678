//! Text output.
//!
//! Drawing is left to the board, the menu only says what is to be shown.

use heapless::Vec;

use crate::diag::{BootDebug, Diagnostics};
use crate::label::Label;

/// Width of a cartridge badge, like `[C64]`.
pub const BADGE_LEN: usize = 5;

/// A badge, already in screen codes, as it goes straight to screen memory.
pub type Badge = [u8; BADGE_LEN];

/// One slot line of the menu.
#[derive(Debug)]
pub struct SlotRow<'a> {
    pub index: usize,
    pub name: &'a Label,
    /// Only shown for valid cores outside slot 0.
    pub version: Option<&'a Label>,
    /// Shown as `>n<` instead of `(n)`.
    pub default_slot: bool,
    pub badges: Vec<Badge, 3>,
    /// Colour of the highlight bar, if this is the selected slot.
    pub highlight: Option<u8>,
}

/// Messages, warnings and prompts.  The wording belongs to the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Notice {
    /// The core was started through JTAG, other cores can not be started.
    JtagBoot,
    /// No attic RAM, flashing is disabled.
    NoAtticRam,
    /// The slot selected for booting has unknown content.
    SlotDamaged(usize),
    PressAnyKey,
    UnknownModel(u8),
    /// Slot 1 holds no MEGA65 core to recover with.  Asks for CONFIRM.
    NoFallbackCore,
    /// The risks of replacing slot 0.  Asks for CONFIRM.
    Slot0Risk,
    /// Asks for CONFIRM before replacing the given slot.
    ConfirmReflash(usize),
    /// A launch was refused as reconfiguration does not work.
    CannotReconfigure,
}

/// The display.
pub trait Screen {
    fn clear(&mut self);
    fn slot_row(&mut self, row: &SlotRow<'_>);
    /// Key help below the slot list.
    fn footer(&mut self, slot_count: usize);
    fn notice(&mut self, notice: Notice);
    /// Echo a character typed at a prompt.  `INST/DEL` erases one.
    fn echo(&mut self, key: u8);
    fn diagnostics(&mut self, diag: &Diagnostics);
    fn boot_debug(&mut self, debug: &BootDebug);
}
