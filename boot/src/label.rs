//! Fixed length display text.

use core::fmt;

use crate::charmap::ascii_to_petscii;

/// Number of characters a label shows.
pub const LABEL_CHARS: usize = 31;

/// A slot name or version, in PETSCII.
///
/// Always [`LABEL_CHARS`] characters, padded with spaces, followed by a NUL.
/// Text longer than that is cut off.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Label([u8; LABEL_CHARS + 1]);

impl Label {
    /// All spaces.
    pub const fn blank() -> Label {
        let mut raw = [b' '; LABEL_CHARS + 1];
        raw[LABEL_CHARS] = 0;
        Label(raw)
    }

    /// Convert ASCII from a core header.  Bytes without a PETSCII form show as
    /// spaces.
    pub fn from_ascii(text: &[u8]) -> Label {
        let mut label = Label::blank();
        for (dst, &src) in label.0[..LABEL_CHARS].iter_mut().zip(text) {
            *dst = ascii_to_petscii(src, b' ');
        }
        label
    }

    /// The characters, without the terminator.
    pub fn as_bytes(&self) -> &[u8] {
        &self.0[..LABEL_CHARS]
    }

    /// The characters including the NUL terminator, as the text renderer
    /// wants them.
    pub fn as_cstr_bytes(&self) -> &[u8; LABEL_CHARS + 1] {
        &self.0
    }

    /// Does the label start with the given ASCII text?
    pub fn starts_with_ascii(&self, prefix: &[u8]) -> bool {
        prefix.len() <= LABEL_CHARS
            && self
                .as_bytes()
                .iter()
                .zip(prefix)
                .all(|(&have, &want)| have == ascii_to_petscii(want, b' '))
    }
}

impl Default for Label {
    fn default() -> Self {
        Label::blank()
    }
}

impl fmt::Debug for Label {
    // Show it as text, upper case PETSCII comes out as ASCII upper case.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("\"")?;
        for &b in self.as_bytes() {
            let c = match b {
                0xc1..=0xda => (b - 0x80) as char,
                0x41..=0x5a => (b + 0x20) as char,
                0x20..=0x40 | 0x5b | 0x5d | 0x5e => b as char,
                _ => '.',
            };
            write!(f, "{}", c)?;
        }
        f.write_str("\"")
    }
}
