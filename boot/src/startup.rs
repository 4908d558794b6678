//! Power up sequence.
//!
//! The menu core is the first thing the FPGA loads.  Unless the user asks
//! for the menu, it looks at the cartridge and the slot flags, and starts the
//! chosen core without showing anything:
//!
//! - ESC held: hand back to the hypervisor at once.
//! - NO-SCROLL held (or TAB, on boards without NO-SCROLL): show the menu.
//! - FPGA already reconfigured: this is a reset, not a power up, so hand back.
//! - Otherwise start the selected slot.  An empty slot hands back, a slot
//!   with unknown content warns and shows the menu.
//!
//! Before the menu is shown, the parts needed for launching and flashing are
//! tested, and a warning is shown for each one that is missing.

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use storage::{ReadFlash, RegisterFile};

use crate::cart::ControlLines;
use crate::gate::Reflasher;
use crate::hw::{key, modifier, reg, Hardware};
use crate::menu::{Menu, MenuExit};
use crate::platform::Platform;
use crate::screen::{Notice, Screen};
use crate::select::select_boot_slot;
use crate::slot::{ScanRequest, SlotTable, Validity};
use crate::{Error, Result};

/// Patterns written to the attic RAM to see it is there.
const ATTIC_PATTERNS: [u8; 4] = [0x55, 0xaa, 0xff, 0x00];

/// How the menu was built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Variant {
    /// The menu core, started by the hypervisor at power up.  Chooses a core
    /// to boot before anything else.
    Embedded,
    /// A program started by hand, only shows the menu.
    Standalone,
}

/// Configuration of a menu session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Options {
    pub variant: Variant,
    /// Allow replacing slot 0 from the menu.
    pub slot0_reflash: bool,
}

impl Default for Options {
    fn default() -> Self {
        Options { variant: Variant::Embedded, slot0_reflash: false }
    }
}

/// Things found missing at power up.  They stay for the whole session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Warnings {
    /// No attic RAM, flashing is not possible.
    pub attic_ram_bad: bool,
    /// The core came in through JTAG, starting other cores will not work.
    pub reconfig_disabled: bool,
}

impl Warnings {
    /// Test the hardware, show a notice for everything missing, and wait for
    /// a key if there was any.
    pub fn probe<R, F, D, S>(hw: &mut Hardware<R, F, D>, screen: &mut S) -> Warnings
    where
        R: RegisterFile,
        F: ReadFlash,
        D: DelayMs<u16> + DelayUs<u16>,
        S: Screen,
    {
        let warnings = Warnings {
            attic_ram_bad: !attic_ram_ok(&mut hw.regs),
            // BOOTSTS reads all ones when started through JTAG.
            reconfig_disabled: hw.regs.peek(reg::BOOTSTS_STATUS) == 0xff,
        };

        if warnings.reconfig_disabled {
            warn!("BOOTSTS stuck, launching cores disabled");
            screen.notice(Notice::JtagBoot);
        }
        if warnings.attic_ram_bad {
            warn!("no attic RAM, flashing disabled");
            screen.notice(Notice::NoAtticRam);
        }
        if warnings.reconfig_disabled || warnings.attic_ram_bad {
            screen.notice(Notice::PressAnyKey);
            hw.press_any_key();
        }
        warnings
    }
}

/// Write and read back a few patterns in the attic RAM.
pub fn attic_ram_ok<R: RegisterFile>(regs: &mut R) -> bool {
    ATTIC_PATTERNS.iter().all(|&p| {
        regs.poke(reg::ATTIC_RAM, p);
        regs.peek(reg::ATTIC_RAM) == p
    })
}

/// Result of the automatic start.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AutoBoot {
    /// Start the core at this flash offset.
    Launch(u32),
    /// Return to the hypervisor.
    HandOff,
    /// Show the menu.
    Menu,
}

/// Decide, without user interaction, what to start.
pub fn auto_boot<R, F, D, S>(
    hw: &mut Hardware<R, F, D>,
    slots: &mut SlotTable,
    screen: &mut S,
    lines: ControlLines,
) -> AutoBoot
where
    R: RegisterFile,
    F: ReadFlash,
    D: DelayMs<u16> + DelayUs<u16>,
    S: Screen,
{
    let held = hw.regs.peek(reg::KEY);
    if held == key::ESC {
        return AutoBoot::HandOff;
    }

    let platform = slots.platform();
    let menu_requested = hw.regs.peek(reg::MODIFIERS) & modifier::NO_SCROLL != 0
        || (platform.tab_for_menu && held == key::TAB);
    if menu_requested {
        info!("menu requested");
        return AutoBoot::Menu;
    }

    if hw.reconfigured() {
        return AutoBoot::HandOff;
    }

    let choice = select_boot_slot(hw, slots, lines);
    match slots.get(choice.slot).map(|s| s.validity) {
        Some(Validity::Valid) => AutoBoot::Launch(platform.boot_offset(choice.slot)),
        Some(Validity::Empty) => AutoBoot::HandOff,
        _ => {
            warn!("boot slot {} has unknown content", choice.slot);
            screen.notice(Notice::SlotDamaged(choice.slot));
            screen.notice(Notice::PressAnyKey);
            hw.press_any_key();
            screen.clear();
            AutoBoot::Menu
        }
    }
}

/// How a session ends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    /// Reconfigure the FPGA from this flash offset.
    Launch(u32),
    /// Leave through the variant's exit vector.
    HandOff,
}

/// A full session: power up checks, automatic start, then the menu.
///
/// `lines` must be sampled before anything else touches the machine, as a
/// cartridge may change them once it runs.
pub fn run<R, F, D, S, X>(
    hw: &mut Hardware<R, F, D>,
    screen: &mut S,
    flasher: &mut X,
    options: Options,
    lines: ControlLines,
) -> Result<Exit>
where
    R: RegisterFile,
    F: ReadFlash,
    D: DelayMs<u16> + DelayUs<u16>,
    S: Screen,
    X: Reflasher,
{
    screen.clear();

    let platform = match Platform::probe(&mut hw.regs) {
        Ok(platform) => platform,
        Err(Error::UnknownModel(id)) => {
            warn!("unknown hardware model {:x}", id);
            if options.variant == Variant::Standalone {
                screen.notice(Notice::UnknownModel(id));
                screen.notice(Notice::PressAnyKey);
                hw.press_any_key();
            }
            return Ok(Exit::HandOff);
        }
        Err(e) => return Err(e),
    };
    let mut slots = SlotTable::new(platform);

    if options.variant == Variant::Embedded {
        match auto_boot(hw, &mut slots, screen, lines) {
            AutoBoot::Launch(offset) => return Ok(Exit::Launch(offset)),
            AutoBoot::HandOff => return Ok(Exit::HandOff),
            AutoBoot::Menu => {}
        }
    }

    let warnings = Warnings::probe(hw, screen);
    slots.scan(hw, ScanRequest::full());

    let mut menu = Menu::new(options, warnings, lines);
    match menu.run(hw, &mut slots, screen, flasher) {
        MenuExit::Launch(offset) => Ok(Exit::Launch(offset)),
        MenuExit::Leave => Ok(Exit::HandOff),
    }
}
