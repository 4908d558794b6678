//! Hardware access.
//!
//! The menu reaches the machine through three capabilities, bundled here: the
//! register file, the QSPI flash, and a busy-wait delay.  The register
//! addresses and bit meanings match the MEGA65 I/O map.

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use storage::{ReadFlash, RegisterFile};

/// Register addresses.
pub mod reg {
    /// Border colour.
    pub const BORDER: u32 = 0xD020;
    /// Screen background colour.
    pub const BACKGROUND: u32 = 0xD021;
    /// ASCII key of the hardware keyboard queue.  Writing anything pops it.
    pub const KEY: u32 = 0xD610;
    /// Modifier keys currently held.
    pub const MODIFIERS: u32 = 0xD611;
    /// Hardware model id.
    pub const MODEL_ID: u32 = 0xD629;
    /// First of four bytes of the running core's git hash, low byte first.
    pub const CORE_HASH: u32 = 0xD632;
    /// Cartridge port /EXROM and /GAME lines.
    pub const CART_LINES: u32 = 0xD67E;
    /// DIP switch state.
    pub const DIP_SWITCHES: u32 = 0xD69D;
    /// Selects which FPGA configuration register `BOOTSTS_DATA` shows.
    pub const BOOTSTS_SELECT: u32 = 0xD6C4;
    pub const BOOTSTS_DATA: u32 = 0xD6C5;
    /// Reads all ones when the ICAPE2 interface is not answering.
    pub const BOOTSTS_STATUS: u32 = 0xD6C7;
    /// Attic RAM, used as the staging buffer while flashing.
    pub const ATTIC_RAM: u32 = 0x800_0000;
    /// Cartridge ROM at `$8004`, covering the CBM80 and `$8007` signatures.
    pub const CART_ROM_LO: u32 = 0x400_8004;
    /// Cartridge ROM at `$C007`.
    pub const CART_ROM_HI: u32 = 0x400_C007;
}

/// Modifier bits in [`reg::MODIFIERS`].
pub mod modifier {
    pub const CTRL: u8 = 0x04;
    pub const NO_SCROLL: u8 = 0x20;
}

/// Bit of [`reg::DIP_SWITCHES`] holding DIP switch 4.
pub const DIP4: u8 = 0x08;

/// BOOTSTS register selector.
pub const BOOTSTS_REG: u8 = 0x16;
/// Bit of BOOTSTS set when the FPGA has been reconfigured since power up.
pub const BOOTSTS_IPROG: u8 = 0x01;

/// Colour codes used by the menu.
pub mod colour {
    pub const BLACK: u8 = 0;
    pub const WHITE: u8 = 1;
    pub const RED: u8 = 2;
    pub const BLUE: u8 = 6;
    pub const YELLOW: u8 = 7;
}

/// Raw key codes, as the keyboard queue presents them.
pub mod key {
    pub const RUN_STOP: u8 = 0x03;
    pub const TAB: u8 = 0x09;
    pub const RETURN: u8 = 0x0d;
    pub const CRSR_DOWN: u8 = 0x11;
    pub const INST_DEL: u8 = 0x14;
    pub const ESC: u8 = 0x1b;
    pub const CRSR_RIGHT: u8 = 0x1d;
    pub const HELP: u8 = 0x1f;
    pub const TILDE: u8 = 0x7e;
    pub const CRSR_UP: u8 = 0x91;
    pub const CRSR_LEFT: u8 = 0x9d;
    pub const F1: u8 = 0xf1;
}

/// How long the border stays red after a refused action.
const ERROR_FLASH_MS: u16 = 150;

/// A key taken from the keyboard queue, with the modifiers held at the time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPress {
    pub code: u8,
    pub modifiers: u8,
}

impl KeyPress {
    pub fn ctrl(&self) -> bool {
        self.modifiers & modifier::CTRL != 0
    }
}

/// The machine, as seen by the menu.
pub struct Hardware<R, F, D> {
    pub regs: R,
    pub flash: F,
    pub delay: D,
}

impl<R, F, D> Hardware<R, F, D>
where
    R: RegisterFile,
    F: ReadFlash,
    D: DelayMs<u16> + DelayUs<u16>,
{
    pub fn new(regs: R, flash: F, delay: D) -> Self {
        Hardware { regs, flash, delay }
    }

    /// Block until a key is in the queue, then pop it.
    pub fn wait_key(&mut self) -> KeyPress {
        loop {
            let code = self.regs.peek(reg::KEY);
            let modifiers = self.regs.peek(reg::MODIFIERS);
            if code != 0 {
                self.regs.poke(reg::KEY, 0);
                return KeyPress { code, modifiers };
            }
        }
    }

    /// Empty the keyboard queue.
    pub fn drain_keys(&mut self) {
        while self.regs.peek(reg::KEY) != 0 {
            self.regs.poke(reg::KEY, 0);
        }
    }

    /// Wait for almost any key.  TAB is ignored, as it might still be held
    /// from requesting the menu.
    pub fn press_any_key(&mut self) {
        self.drain_keys();
        loop {
            match self.regs.peek(reg::KEY) {
                0 => {}
                key::TAB => self.regs.poke(reg::KEY, 0),
                _ => break,
            }
        }
        self.drain_keys();
    }

    /// Flash border and background red, to show that something was refused.
    pub fn error_flash(&mut self) {
        self.regs.poke(reg::BORDER, colour::RED);
        self.regs.poke(reg::BACKGROUND, colour::RED);
        self.delay.delay_ms(ERROR_FLASH_MS);
        self.regs.poke(reg::BORDER, colour::BLACK);
        self.regs.poke(reg::BACKGROUND, colour::BLUE);
    }

    /// Slot the DIP switch 4 asks for when no cartridge decides: 1 when off,
    /// 2 when on.
    pub fn dip4_slot(&mut self) -> usize {
        1 + usize::from(self.regs.peek(reg::DIP_SWITCHES) & DIP4 != 0)
    }

    /// True when the FPGA has been reconfigured since power up, meaning this
    /// is not the first pass through the menu core.
    pub fn reconfigured(&mut self) -> bool {
        self.regs.poke(reg::BOOTSTS_SELECT, BOOTSTS_REG);
        // The value takes about 40 cycles to be fetched.
        self.delay.delay_us(10);
        self.regs.peek(reg::BOOTSTS_DATA) & BOOTSTS_IPROG != 0
    }

    /// The core's git hash, as shown by the diagnostics view.
    pub fn core_hash(&mut self) -> u32 {
        let mut bytes = [0u8; 4];
        self.regs.copy_out(reg::CORE_HASH, &mut bytes);
        u32::from_le_bytes(bytes)
    }
}
