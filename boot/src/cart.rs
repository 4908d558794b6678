//! Cartridge detection
//!
//! A cartridge in the expansion port decides which core is started.  There
//! are three kinds of cartridges we know about, each recognized by a
//! signature in its ROM:
//!
//! - MEGA65 cartridges carry `m65` at `$8007`.
//! - C64 cartridges carry `CBM80` at `$8004`.  Plenty of C64 cartridges have
//!   no signature at all, and are only seen because they pull /EXROM or /GAME
//!   low.
//! - C128 cartridges carry `cbm` at `$8007` or `$C007`.
//!
//! The signatures are PETSCII.

use storage::RegisterFile;

use crate::hw::reg;
use crate::slot::CoreCaps;

/// `CBM80`, with the shifted letters of the C64 signature.
pub const C64_MAGIC: [u8; 5] = [0xc3, 0xc2, 0xcd, 0x38, 0x30];
/// `cbm`.
pub const C128_MAGIC: [u8; 3] = [0x43, 0x42, 0x4d];
/// `m65`.
pub const M65_MAGIC: [u8; 3] = [0x4d, 0x36, 0x35];

/// Kind of cartridge in the expansion port.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Cartridge {
    /// No cartridge, the slot marked as default may start.
    None,
    C64,
    C128,
    M65,
}

impl Cartridge {
    /// The capability a core needs to be started for this cartridge.
    pub fn capability(self) -> CoreCaps {
        match self {
            Cartridge::None => CoreCaps::SLOT_DEFAULT,
            Cartridge::C64 => CoreCaps::CART_C64,
            Cartridge::C128 => CoreCaps::CART_C128,
            Cartridge::M65 => CoreCaps::CART_M65,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Cartridge::None => "none",
            Cartridge::C64 => "C64",
            Cartridge::C128 => "C128",
            Cartridge::M65 => "M65",
        }
    }
}

/// The /EXROM and /GAME lines of the cartridge port, as sampled at power up.
///
/// Cartridges may change them once they run, so they are read once, before
/// anything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlLines(pub u8);

impl ControlLines {
    /// Both lines, active low.
    const MASK: u8 = 0x60;

    pub fn sample<R: RegisterFile>(regs: &mut R) -> ControlLines {
        ControlLines(regs.peek(reg::CART_LINES))
    }

    /// Neither line is pulled low.
    pub fn idle(self) -> bool {
        self.0 & Self::MASK == Self::MASK
    }
}

/// Identification bytes read from the cartridge ROM.
///
/// Bytes 0..6 come from `$8004`, bytes 6..9 from `$C007`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CartId {
    pub window: [u8; 9],
    pub lines: ControlLines,
}

impl CartId {
    /// Copy the signature window out of the cartridge ROM.
    pub fn read<R: RegisterFile>(regs: &mut R, lines: ControlLines) -> CartId {
        let mut window = [0u8; 9];
        regs.copy_out(reg::CART_ROM_LO, &mut window[..6]);
        regs.copy_out(reg::CART_ROM_HI, &mut window[6..]);
        CartId { window, lines }
    }

    /// Decide the cartridge type.  The order of the checks matters.
    pub fn classify(&self) -> Cartridge {
        let w = &self.window;

        // A MEGA65 cartridge wins, whatever the lines say.
        if w[3..6] == M65_MAGIC {
            return Cartridge::M65;
        }

        // Some C64 cartridges play tricks with the lines, trust the magic.
        if w[0..5] == C64_MAGIC {
            return Cartridge::C64;
        }

        // Anything pulling /EXROM or /GAME is treated as a C64 cartridge.
        if !self.lines.idle() {
            return Cartridge::C64;
        }

        if w[3..6] == C128_MAGIC || w[6..9] == C128_MAGIC {
            return Cartridge::C128;
        }

        Cartridge::None
    }
}

/// Read and classify the cartridge in one go.
pub fn classify<R: RegisterFile>(regs: &mut R, lines: ControlLines) -> (CartId, Cartridge) {
    let id = CartId::read(regs, lines);
    let cart = id.classify();
    debug!("cartridge lines {:x}: {}", lines.0, cart.name());
    (id, cart)
}
