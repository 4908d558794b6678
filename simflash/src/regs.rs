//! Simulated register file.
//!
//! Plain memory, with a few addresses given behaviour:
//!
//! - `$D610`/`$D611` are fed from a keyboard script.  A scripted key only
//!   shows up for a poll that directly follows an empty poll, the way a
//!   waiting loop reads the queue.  A single look at the queue, or draining
//!   it, never takes a key meant for a later prompt.  Keys held at power up
//!   are visible at once.
//! - The attic RAM can be left out, it then reads back all ones.
//! - Every write is logged.

use std::collections::{BTreeMap, VecDeque};

use storage::RegisterFile;

const KEY: u32 = 0xD610;
const MODIFIERS: u32 = 0xD611;
const BORDER: u32 = 0xD020;
const MODEL_ID: u32 = 0xD629;
const CART_LINES: u32 = 0xD67E;
const BOOTSTS_DATA: u32 = 0xD6C5;
const ATTIC_RAM: u32 = 0x800_0000;
const ATTIC_END: u32 = 0x900_0000;

const CTRL: u8 = 0x04;

/// Cartridge lines with nothing plugged in.
pub const LINES_IDLE: u8 = 0x7f;

/// Polls of an empty queue, with nothing left in the script, before the
/// test is considered stuck.
const STUCK_POLLS: usize = 100_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Press {
    code: u8,
    modifiers: u8,
}

pub struct SimRegs {
    memory: BTreeMap<u32, u8>,
    script: VecDeque<Press>,
    /// Key at the head of the queue.
    visible: Option<Press>,
    /// The last access was a poll of `$D610` that found it empty.
    armed: bool,
    held_modifiers: u8,
    empty_polls: usize,
    attic: bool,
    pokes: Vec<(u32, u8)>,
}

impl SimRegs {
    pub fn new(model_id: u8) -> SimRegs {
        let mut regs = SimRegs {
            memory: BTreeMap::new(),
            script: VecDeque::new(),
            visible: None,
            armed: false,
            held_modifiers: 0,
            empty_polls: 0,
            attic: true,
            pokes: Vec::new(),
        };
        regs.set(MODEL_ID, model_id);
        regs.set(CART_LINES, LINES_IDLE);
        regs
    }

    /// Set a register, without logging it as a write.
    pub fn set(&mut self, addr: u32, value: u8) {
        self.memory.insert(addr, value);
    }

    pub fn load(&mut self, addr: u32, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            self.set(addr + i as u32, b);
        }
    }

    pub fn get(&self, addr: u32) -> u8 {
        self.memory.get(&addr).copied().unwrap_or(0)
    }

    pub fn without_attic(mut self) -> SimRegs {
        self.attic = false;
        self
    }

    /// Make the FPGA look reconfigured since power up.
    pub fn reconfigured(mut self) -> SimRegs {
        self.set(BOOTSTS_DATA, 0x01);
        self
    }

    pub fn cart_lines(mut self, lines: u8) -> SimRegs {
        self.set(CART_LINES, lines);
        self
    }

    /// A key held down at power up.
    pub fn hold_key(&mut self, code: u8) {
        self.visible = Some(Press { code, modifiers: 0 });
    }

    /// Modifiers held for the whole session.
    pub fn hold_modifiers(&mut self, modifiers: u8) {
        self.held_modifiers = modifiers;
    }

    pub fn press(&mut self, code: u8) {
        self.script.push_back(Press { code, modifiers: 0 });
    }

    pub fn press_ctrl(&mut self, code: u8) {
        self.script.push_back(Press { code, modifiers: CTRL });
    }

    pub fn type_text(&mut self, text: &str) {
        for b in text.bytes() {
            self.press(b);
        }
    }

    /// Scripted keys not taken yet.
    pub fn keys_left(&self) -> usize {
        self.script.len() + usize::from(self.visible.is_some())
    }

    /// Every write, in order.
    pub fn pokes(&self) -> &[(u32, u8)] {
        &self.pokes
    }

    /// Colours written to the border.
    pub fn border_history(&self) -> Vec<u8> {
        self.pokes
            .iter()
            .filter(|(addr, _)| *addr == BORDER)
            .map(|(_, value)| *value)
            .collect()
    }

    fn next_key(&mut self) -> u8 {
        if self.visible.is_none() && self.armed {
            self.visible = self.script.pop_front();
        }
        match self.visible {
            Some(press) => {
                self.empty_polls = 0;
                press.code
            }
            None => {
                self.armed = true;
                if self.script.is_empty() {
                    self.empty_polls += 1;
                    if self.empty_polls > STUCK_POLLS {
                        panic!("waiting for a key, but the keyboard script is used up");
                    }
                }
                0
            }
        }
    }
}

impl RegisterFile for SimRegs {
    fn peek(&mut self, addr: u32) -> u8 {
        match addr {
            KEY => return self.next_key(),
            // Read along with the key, does not count as another access.
            MODIFIERS => return self.held_modifiers | self.visible.map_or(0, |p| p.modifiers),
            _ => {}
        }
        self.armed = false;
        match addr {
            ATTIC_RAM..=ATTIC_END if !self.attic => 0xff,
            _ => self.get(addr),
        }
    }

    fn poke(&mut self, addr: u32, value: u8) {
        self.pokes.push((addr, value));
        self.armed = false;
        match addr {
            KEY => self.visible = None,
            ATTIC_RAM..=ATTIC_END if !self.attic => {}
            _ => self.set(addr, value),
        }
    }
}
