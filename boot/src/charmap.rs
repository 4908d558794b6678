//! Character remapping.
//!
//! Core headers carry their name and version as ASCII.  The menu keeps text
//! as PETSCII, which is what the text renderer prints, and writes badges
//! straight into screen memory as screen codes.  Both mappings are fixed
//! 256-entry tables.

/// Marks a table entry without a PETSCII equivalent.
const UNMAPPED: u8 = 0x00;

/// ASCII to PETSCII, for the lower/upper case character set.  Only the
/// printable range is mapped.
pub static ASCII_TO_PETSCII: [u8; 256] = build_petscii();

/// ASCII to screen codes, for the lower/upper case character set.  Every
/// input has a screen code.
pub static ASCII_TO_SCREEN: [u8; 256] = build_screen();

const fn build_petscii() -> [u8; 256] {
    let mut t = [UNMAPPED; 256];
    let mut c = 0x20;
    while c < 0x7f {
        t[c] = match c as u8 {
            // Swap the cases: PETSCII upper case lives at $C1.
            b'A'..=b'Z' => c as u8 + 0x80,
            b'a'..=b'z' => c as u8 - 0x20,
            b'\\' => 0xbf,
            b'_' => 0xa4,
            b'`' => 0xad,
            b'{' => 0xb3,
            b'|' => 0xdd,
            b'}' => 0xab,
            b'~' => 0xb1,
            other => other,
        };
        c += 1;
    }
    t
}

const fn build_screen() -> [u8; 256] {
    let mut t = [0u8; 256];
    let mut c = 0;
    while c < 256 {
        let b = c as u8;
        t[c] = match b {
            0x00 => 0x80,
            0x01..=0x1a => b + 0xc0,
            0x1b..=0x1f => b + 0x80,
            0x20..=0x3f => b,
            0x40 => 0x00,
            0x41..=0x5a => b,
            0x5b..=0x5f => b - 0x40,
            0x60 => 0x40,
            0x61..=0x7a => b - 0x60,
            0x7b..=0x7f => b - 0x20,
            0x80 => 0xc0,
            0x81..=0x9a => b,
            0x9b..=0x9f => b + 0x40,
            0xa0..=0xbf => b - 0x40,
            0xc0 => 0x40,
            0xc1..=0xda => b - 0xc0,
            0xdb..=0xff => b - 0x80,
        };
        c += 1;
    }
    t
}

/// Map one ASCII byte to PETSCII, using `fallback` for bytes that have no
/// PETSCII form.
pub fn ascii_to_petscii(a: u8, fallback: u8) -> u8 {
    match ASCII_TO_PETSCII[a as usize] {
        UNMAPPED => fallback,
        p => p,
    }
}

/// Map one ASCII byte to a screen code.
pub fn ascii_to_screen(a: u8) -> u8 {
    ASCII_TO_SCREEN[a as usize]
}

/// Map an ASCII literal into a fixed buffer of screen codes.
pub fn screen_codes<const N: usize>(text: &[u8; N]) -> [u8; N] {
    let mut out = [0u8; N];
    for (o, &a) in out.iter_mut().zip(text.iter()) {
        *o = ascii_to_screen(a);
    }
    out
}
