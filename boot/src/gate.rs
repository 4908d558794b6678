//! Reflash safety checks.
//!
//! Replacing a slot can not be undone, and replacing slot 0 can leave the
//! machine unable to start without a JTAG adapter.  Before any slot is
//! written:
//!
//! - the attic RAM must have passed its test, as the flasher stages the core
//!   there;
//! - slot 0 needs two confirmations, a first one only when slot 1 does not
//!   hold a MEGA65 core that could be used for recovery;
//! - any other slot needs one.
//!
//! A confirmation is the word `CONFIRM` typed exactly, followed by RETURN.

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use heapless::{String, Vec};
use storage::{ReadFlash, RegisterFile};

use crate::hw::{key, Hardware};
use crate::label::Label;
use crate::screen::{Notice, Screen};
use crate::slot::SlotTable;
use crate::startup::Warnings;
use crate::Error;

/// What has to be typed to confirm, RETURN included.
pub const CONFIRM_TEXT: &[u8] = b"CONFIRM\r";

/// Name prefix of a slot 1 core that can bring back a broken slot 0.
pub const RECOVERY_CORE_PREFIX: &[u8] = b"MEGA65   ";

/// Slot 0 is only ever written from this file.
pub const FACTORY_UPGRADE_FILE: &str = "UPGRADE0.COR";

/// Longest input a prompt takes, one screen line.
const PROMPT_MAX: usize = 40;

/// A core file on the SD card.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileChoice {
    pub name: String<32>,
}

impl FileChoice {
    pub fn new(name: &str) -> Option<FileChoice> {
        let mut s = String::new();
        s.push_str(name).ok()?;
        Some(FileChoice { name: s })
    }
}

/// Picks core files and writes them to flash.
pub trait Reflasher {
    /// Let the user pick a core file for `slot`.  `None` when they cancel.
    fn select_file(&mut self, slot: usize) -> Option<FileChoice>;

    /// Erase `slot` and write the file into it.  The slot 0 version goes into
    /// the flasher's log.
    fn reflash(
        &mut self,
        slot: usize,
        file: &FileChoice,
        slot0_version: &Label,
    ) -> core::result::Result<(), Error>;
}

/// The outcome of a reflash request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    /// Go ahead and write this file.
    Granted(FileChoice),
    /// The user did not confirm, or cancelled file selection.
    Declined,
    /// Flashing is not possible at all.
    Rejected,
}

/// Run the checks for reflashing `slot`.  Nothing is written here.
pub fn authorize<R, F, D, S, X>(
    hw: &mut Hardware<R, F, D>,
    screen: &mut S,
    flasher: &mut X,
    slots: &SlotTable,
    warnings: Warnings,
    slot: usize,
) -> Decision
where
    R: RegisterFile,
    F: ReadFlash,
    D: DelayMs<u16> + DelayUs<u16>,
    S: Screen,
    X: Reflasher,
{
    if slot >= slots.len() {
        return Decision::Rejected;
    }

    if warnings.attic_ram_bad {
        warn!("reflash of slot {} refused, no attic RAM", slot);
        hw.error_flash();
        return Decision::Rejected;
    }

    if slot == 0 {
        if !confirm_slot0(hw, screen, slots) {
            return Decision::Declined;
        }
        // Only ever written from the upgrade file, no file selection.
        return match FileChoice::new(FACTORY_UPGRADE_FILE) {
            Some(file) => Decision::Granted(file),
            None => Decision::Rejected,
        };
    }

    screen.clear();
    screen.notice(Notice::ConfirmReflash(slot));
    if !confirm(hw, screen, CONFIRM_TEXT) {
        return Decision::Declined;
    }

    match flasher.select_file(slot) {
        Some(file) => Decision::Granted(file),
        None => Decision::Declined,
    }
}

/// The two stage confirmation for slot 0.
fn confirm_slot0<R, F, D, S>(hw: &mut Hardware<R, F, D>, screen: &mut S, slots: &SlotTable) -> bool
where
    R: RegisterFile,
    F: ReadFlash,
    D: DelayMs<u16> + DelayUs<u16>,
    S: Screen,
{
    let recoverable = slots
        .get(1)
        .map(|s| s.name.starts_with_ascii(RECOVERY_CORE_PREFIX))
        .unwrap_or(false);

    if !recoverable {
        screen.clear();
        screen.notice(Notice::NoFallbackCore);
        if !confirm(hw, screen, CONFIRM_TEXT) {
            return false;
        }
    }

    screen.clear();
    screen.notice(Notice::Slot0Risk);
    confirm(hw, screen, CONFIRM_TEXT)
}

/// Read a line of input and compare it to `expected`, RETURN included.
///
/// Case matters, only printable characters are taken.  RUN/STOP or ESC give
/// up at once.
pub fn confirm<R, F, D, S>(hw: &mut Hardware<R, F, D>, screen: &mut S, expected: &[u8]) -> bool
where
    R: RegisterFile,
    F: ReadFlash,
    D: DelayMs<u16> + DelayUs<u16>,
    S: Screen,
{
    let mut typed: Vec<u8, PROMPT_MAX> = Vec::new();
    loop {
        let press = hw.wait_key();
        match press.code {
            key::RUN_STOP | key::ESC => return false,
            key::RETURN => {
                if typed.push(press.code).is_err() {
                    return false;
                }
                return typed.as_slice() == expected;
            }
            key::INST_DEL => {
                if typed.pop().is_some() {
                    screen.echo(key::INST_DEL);
                }
            }
            c @ 0x20..=0x7e => {
                if typed.push(c).is_ok() {
                    screen.echo(c);
                }
            }
            _ => {}
        }
    }
}
