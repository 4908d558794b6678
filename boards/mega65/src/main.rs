//! Flash slot menu for the MEGA65.
//!
//! Built as the menu core by default, which the hypervisor starts at power
//! up and which hands control back through `$CF7F`.  With the `standalone`
//! feature it is a program started by hand, which leaves through `$FFFA`.

#![no_main]
#![no_std]

#[cfg(not(feature = "rtt"))]
use panic_halt as _;
#[cfg(feature = "rtt")]
use {defmt_rtt as _, panic_probe as _};

mod delay;
mod mmio;
mod qspi;
mod screen;

use megaflash::hw::reg;
use megaflash::startup::{self, Exit, Options, Variant};
use megaflash::{ControlLines, Hardware, Platform};
use storage::RegisterFile;

use crate::delay::Delay;
use crate::mmio::Mmio;
use crate::qspi::{Flasher, Qspi};
use crate::screen::TextScreen;

#[cfg(not(feature = "standalone"))]
const VARIANT: Variant = Variant::Embedded;
#[cfg(feature = "standalone")]
const VARIANT: Variant = Variant::Standalone;

/// Where the hypervisor waits to be resumed.
const HYPERVISOR_RESUME: u16 = 0xCF7F;
/// The NMI vector.
const NMI_VECTOR: u16 = 0xFFFA;
const JMP_ABS: u8 = 0x4C;

#[no_mangle]
pub extern "C" fn main() -> ! {
    let mut regs = Mmio::init();
    // Before anything else, a cartridge may change them once it runs.
    let lines = ControlLines::sample(&mut regs);
    regs.full_speed();

    let capacity = match Platform::by_model(regs.peek(reg::MODEL_ID)) {
        Ok(p) => p.slot_count * p.slot_size() as usize,
        // The session notices, and leaves before reading anything.
        Err(_) => 0,
    };

    let mut hw = Hardware::new(regs, Qspi::new(capacity), Delay);
    let mut screen = TextScreen::new(Mmio);
    let mut flasher = Flasher::default();
    let options = Options {
        variant: VARIANT,
        slot0_reflash: cfg!(feature = "slot0-reflash"),
    };

    match startup::run(&mut hw, &mut screen, &mut flasher, options, lines) {
        Ok(Exit::Launch(offset)) => {
            qspi::reconfigure(offset);
            // Still here, the FPGA did not take it.
            hard_exit(&mut hw.regs)
        }
        Ok(Exit::HandOff) | Err(_) => hard_exit(&mut hw.regs),
    }
}

fn hard_exit(regs: &mut Mmio) -> ! {
    regs.restore();
    let target = match VARIANT {
        Variant::Embedded => {
            regs.poke(u32::from(HYPERVISOR_RESUME), JMP_ABS);
            HYPERVISOR_RESUME
        }
        Variant::Standalone => NMI_VECTOR,
    };
    let exit: extern "C" fn() -> ! = unsafe { core::mem::transmute(target as usize) };
    exit()
}
