//! The diagnostics view behind the HELP key.

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use storage::{ReadFlash, RegisterFile};

use crate::cart::ControlLines;
use crate::hw::{key, reg, Hardware};
use crate::label::Label;
use crate::platform::Platform;
use crate::screen::Screen;
use crate::select::{select_boot_slot, BootChoice};
use crate::slot::SlotTable;
use crate::startup::{Variant, Warnings};

/// What the diagnostics view shows.
#[derive(Debug)]
pub struct Diagnostics {
    pub core_hash: u32,
    /// The running core was loaded through JTAG.
    pub jtag_boot: bool,
    pub slot0_version: Label,
    pub platform: &'static Platform,
    /// Cartridge and boot slot, only known to the menu core itself.
    pub boot: Option<BootChoice>,
}

/// Extra information about the boot slot decision, shown on F1.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootDebug {
    pub dip4_slot: usize,
    /// Cartridge lines as sampled at power up.
    pub latched_lines: ControlLines,
    /// Cartridge lines now.
    pub current_lines: ControlLines,
    pub window: [u8; 9],
}

/// Show the diagnostics view until ESC or RUN/STOP.
pub fn show<R, F, D, S>(
    hw: &mut Hardware<R, F, D>,
    slots: &mut SlotTable,
    screen: &mut S,
    variant: Variant,
    warnings: Warnings,
    lines: ControlLines,
) where
    R: RegisterFile,
    F: ReadFlash,
    D: DelayMs<u16> + DelayUs<u16>,
    S: Screen,
{
    let boot = match variant {
        Variant::Embedded => Some(select_boot_slot(hw, slots, lines)),
        Variant::Standalone => None,
    };
    let slot0_version = slots.get(0).map(|s| s.version).unwrap_or_default();

    screen.clear();
    screen.diagnostics(&Diagnostics {
        core_hash: hw.core_hash(),
        jtag_boot: warnings.reconfig_disabled,
        slot0_version,
        platform: slots.platform(),
        boot,
    });

    let mut debug_shown = false;
    loop {
        let press = hw.wait_key();
        match press.code {
            key::ESC | key::RUN_STOP => break,
            key::F1 if !debug_shown => {
                // Boot debugging is only of use in the menu core.
                if let Some(choice) = boot {
                    let current_lines = ControlLines(hw.regs.peek(reg::CART_LINES));
                    screen.boot_debug(&BootDebug {
                        dip4_slot: hw.dip4_slot(),
                        latched_lines: lines,
                        current_lines,
                        window: choice.cart_id.window,
                    });
                    debug_shown = true;
                }
            }
            _ => {}
        }
    }

    screen.clear();
}
