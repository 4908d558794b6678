//! The 40 column text screen.

use core::fmt::Write;

use heapless::String;
use megaflash::charmap::ascii_to_screen;
use megaflash::diag::{BootDebug, Diagnostics};
use megaflash::hw::{colour, key, reg};
use megaflash::screen::SlotRow;
use megaflash::{Notice, Screen};
use storage::RegisterFile;

const SCREEN_RAM: u32 = 0x0400;
const COLOUR_RAM: u32 = 0xD800;
const COLUMNS: u8 = 40;
const ROWS: u8 = 25;

const BADGE_COLUMN: u8 = 35;

/// Screen code of a space.
const BLANK: u8 = 0x20;

type Line = String<40>;

pub struct TextScreen<R> {
    regs: R,
    x: u8,
    y: u8,
    ink: u8,
}

impl<R: RegisterFile> TextScreen<R> {
    pub fn new(regs: R) -> Self {
        TextScreen { regs, x: 0, y: 0, ink: colour::WHITE }
    }

    fn put(&mut self, x: u8, y: u8, code: u8, ink: u8) {
        if x >= COLUMNS || y >= ROWS {
            return;
        }
        let cell = u32::from(y) * u32::from(COLUMNS) + u32::from(x);
        self.regs.poke(SCREEN_RAM + cell, code);
        self.regs.poke(COLOUR_RAM + cell, ink);
    }

    /// Write ASCII text at a position, without moving the cursor.
    fn text_at(&mut self, x: u8, y: u8, text: &[u8], ink: u8) {
        for (i, &a) in text.iter().enumerate() {
            self.put(x + i as u8, y, ascii_to_screen(a), ink);
        }
    }

    /// Write screen codes at a position.
    fn codes_at(&mut self, x: u8, y: u8, codes: &[u8], ink: u8) {
        for (i, &c) in codes.iter().enumerate() {
            self.put(x + i as u8, y, c, ink);
        }
    }

    /// Write PETSCII text, as the labels are.
    fn petscii_at(&mut self, x: u8, y: u8, text: &[u8], ink: u8) {
        for (i, &p) in text.iter().enumerate() {
            self.put(x + i as u8, y, petscii_to_screen(p), ink);
        }
    }

    /// Write ASCII text at the cursor, wrapping at the screen edge.
    fn print(&mut self, text: &[u8]) {
        for &a in text {
            if a == b'\n' || self.x >= COLUMNS {
                self.newline();
                if a == b'\n' {
                    continue;
                }
            }
            self.put(self.x, self.y, ascii_to_screen(a), self.ink);
            self.x += 1;
        }
    }

    fn println(&mut self, text: &[u8]) {
        self.print(text);
        self.newline();
    }

    fn newline(&mut self) {
        self.x = 0;
        if self.y + 1 < ROWS {
            self.y += 1;
        }
    }

    fn highlight_line(&mut self, y: u8, ink: u8) {
        for x in 0..COLUMNS {
            let cell = u32::from(y) * u32::from(COLUMNS) + u32::from(x);
            self.regs.poke(COLOUR_RAM + cell, ink | REVERSE);
        }
    }
}

/// Colour RAM bit shown as reverse video.
const REVERSE: u8 = 0x20;

/// Labels are PETSCII, the screen wants screen codes.
fn petscii_to_screen(p: u8) -> u8 {
    match p {
        0x40..=0x5f => p - 0x40,
        0x60..=0x7f => p - 0x20,
        0xa0..=0xbf => p - 0x40,
        0xc0..=0xfe => p - 0x80,
        0xff => 0x5e,
        _ => p,
    }
}

impl<R: RegisterFile> Screen for TextScreen<R> {
    fn clear(&mut self) {
        for y in 0..ROWS {
            for x in 0..COLUMNS {
                self.put(x, y, BLANK, colour::WHITE);
            }
        }
        self.regs.poke(reg::BORDER, colour::BLACK);
        self.regs.poke(reg::BACKGROUND, colour::BLUE);
        self.x = 0;
        self.y = 0;
        self.ink = colour::WHITE;
    }

    fn slot_row(&mut self, row: &SlotRow<'_>) {
        let y = row.index as u8 * 3;
        let digit = b'0' + row.index as u8;
        let number = if row.default_slot { [b'>', digit, b'<'] } else { [b'(', digit, b')'] };

        self.text_at(1, y, &number, colour::WHITE);
        self.petscii_at(5, y, row.name.as_bytes(), colour::WHITE);
        if let Some(version) = row.version {
            self.petscii_at(5, y + 1, version.as_bytes(), colour::WHITE);
        }
        for (i, badge) in row.badges.iter().enumerate() {
            self.codes_at(BADGE_COLUMN, y + i as u8, badge, colour::YELLOW);
        }
        if let Some(ink) = row.highlight {
            self.highlight_line(y, ink);
            self.highlight_line(y + 1, ink);
        }
    }

    fn footer(&mut self, slot_count: usize) {
        let last = slot_count.saturating_sub(1);
        let mut line = Line::new();
        let _ = write!(line, "0-{} = Launch Core.  CTRL 1-{} = Edit Slot", last, last);
        self.text_at(0, ROWS - 1, line.as_bytes(), colour::WHITE);
        self.highlight_line(ROWS - 1, colour::WHITE);
    }

    fn notice(&mut self, notice: Notice) {
        let mut line = Line::new();
        match notice {
            Notice::JtagBoot => {
                self.println(b"WARNING: This core was started via");
                self.println(b"JTAG. Other cores can not be launched");
                self.println(b"from this menu, flashing still works.");
                self.newline();
            }
            Notice::NoAtticRam => {
                self.println(b"WARNING: No attic RAM found. The");
                self.println(b"flasher needs it, so flashing has");
                self.println(b"been disabled.");
                self.newline();
            }
            Notice::SlotDamaged(slot) => {
                let _ = write!(line, "WARNING: Flash slot {} seems to be", slot);
                self.println(line.as_bytes());
                self.println(b"messed up. Erase or re-flash the slot");
                self.println(b"to avoid seeing this message again.");
                self.newline();
            }
            Notice::PressAnyKey => self.println(b"Press almost any key to continue..."),
            Notice::UnknownModel(id) => {
                let _ = write!(line, "Unknown hardware model id ${:02X}", id);
                self.newline();
                self.println(line.as_bytes());
            }
            Notice::NoFallbackCore => {
                self.println(b" ** No MEGA65 core in slot 1 found! **");
                self.newline();
                self.println(b"A failed slot 0 update can only be");
                self.println(b"undone with a JTAG adapter or a MEGA65");
                self.println(b"core in slot 1.");
                self.newline();
                self.print(b"Type CONFIRM, or <RUN/STOP> to abort: ");
            }
            Notice::Slot0Risk => {
                self.println(b" ** You are about to replace slot 0! **");
                self.newline();
                self.println(b"If this fails or is interrupted, the");
                self.println(b"MEGA65 needs the JTAG recovery, or the");
                self.println(b"core in slot 1, to start again.");
                self.newline();
                self.print(b"Type CONFIRM, or <RUN/STOP> to abort: ");
            }
            Notice::ConfirmReflash(slot) => {
                let _ = write!(line, "Replace the content of slot {}?", slot);
                self.println(line.as_bytes());
                self.newline();
                self.print(b"Type CONFIRM, or <RUN/STOP> to abort: ");
            }
            Notice::CannotReconfigure => {
                self.println(b"Can not launch cores, the FPGA can");
                self.println(b"not be reconfigured from this core.");
                self.newline();
            }
        }
    }

    fn echo(&mut self, code: u8) {
        if code == key::INST_DEL {
            if self.x > 0 {
                self.x -= 1;
                self.put(self.x, self.y, BLANK, self.ink);
            }
            return;
        }
        self.print(&[code]);
    }

    fn diagnostics(&mut self, diag: &Diagnostics) {
        let mut line = Line::new();
        self.newline();
        self.println(b"  Core hash:");
        let jtag: &str = if diag.jtag_boot { " (booted via JTAG)" } else { "" };
        let _ = write!(line, "    {:08x}{}", diag.core_hash, jtag);
        self.println(line.as_bytes());
        self.println(b"  Slot 0 Version:");
        self.print(b"    ");
        let (x, y) = (self.x, self.y);
        self.petscii_at(x, y, diag.slot0_version.as_bytes(), self.ink);
        self.newline();
        self.newline();

        let p = diag.platform;
        self.println(b"  Hardware information");
        line.clear();
        let _ = write!(line, "    Model ID:   ${:02X}", p.model_id);
        self.println(line.as_bytes());
        line.clear();
        let _ = write!(line, "    Model name: {}", p.name);
        self.println(line.as_bytes());
        line.clear();
        let _ = write!(line, "    Slots:      {} (each {}MB)", p.slot_count, p.slot_mb);
        self.println(line.as_bytes());

        if let Some(boot) = diag.boot {
            self.newline();
            line.clear();
            let _ = write!(line, "  Cartridge: {}", boot.cartridge.name());
            self.println(line.as_bytes());
            line.clear();
            let _ = write!(line, "  Boot Slot: {}", boot.slot);
            self.println(line.as_bytes());
        }
    }

    fn boot_debug(&mut self, debug: &BootDebug) {
        let mut line = Line::new();
        let w = &debug.window;
        self.newline();
        let _ = write!(line, "   DIP4: {}", debug.dip4_slot);
        self.println(line.as_bytes());
        line.clear();
        let _ = write!(
            line,
            "  $D67E: ${:02X} (now ${:02X})",
            debug.latched_lines.0, debug.current_lines.0
        );
        self.println(line.as_bytes());
        line.clear();
        let _ = write!(
            line,
            "  $8004: {:02X} {:02X} {:02X} {:02X} {:02X} {:02X}",
            w[0], w[1], w[2], w[3], w[4], w[5]
        );
        self.println(line.as_bytes());
        line.clear();
        let _ = write!(line, "  $C007:          {:02X} {:02X} {:02X}", w[6], w[7], w[8]);
        self.println(line.as_bytes());
    }
}
