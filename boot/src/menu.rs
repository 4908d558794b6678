//! The slot menu.
//!
//! The menu lists every slot, and waits for a key:
//!
//! - `0`..`n`: start that slot.
//! - cursor keys: move the selection, wrapping at either end.
//! - RETURN: start the selected slot.
//! - RUN/STOP, ESC: leave the menu.
//! - CTRL-1..CTRL-7: replace the content of that slot.
//! - `~`: replace slot 0, when enabled.
//! - HELP: diagnostics.  CTRL-7 and HELP share a key code, CTRL tells them
//!   apart.
//!
//! The menu is a small state machine, see [`Phase`].

use core::mem;

use embedded_hal::blocking::delay::{DelayMs, DelayUs};
use heapless::Vec;
use storage::{ReadFlash, RegisterFile};

use crate::cart::ControlLines;
use crate::charmap::screen_codes;
use crate::diag;
use crate::gate::{self, Decision, FileChoice, Reflasher};
use crate::hw::{colour, key, reg, Hardware, KeyPress};
use crate::screen::{Badge, Notice, Screen, SlotRow};
use crate::slot::{CoreCaps, ScanRequest, SlotTable, Validity};
use crate::startup::{Options, Warnings};

/// Key codes of CTRL-1 to CTRL-7, in slot order.
const CTRL_DIGITS: [u8; 7] = [144, 5, 28, 159, 156, 30, 31];

/// What a key asks the menu to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    /// Start this slot.
    Launch(usize),
    Next,
    Prev,
    LaunchSelected,
    Leave,
    /// Replace the content of this slot.
    Reflash(usize),
    Help,
    Ignored,
}

impl Key {
    /// Map a raw key code.  Slot numbers out of range are ignored.
    pub fn decode(press: KeyPress, slot_count: usize, slot0_reflash: bool) -> Key {
        let code = press.code;
        if code >= b'0' && usize::from(code - b'0') < slot_count {
            return Key::Launch(usize::from(code - b'0'));
        }

        match code {
            key::RUN_STOP | key::ESC => Key::Leave,
            key::CRSR_RIGHT | key::CRSR_DOWN => Key::Next,
            key::CRSR_LEFT | key::CRSR_UP => Key::Prev,
            key::RETURN => Key::LaunchSelected,
            key::TILDE if slot0_reflash => Key::Reflash(0),
            _ => match CTRL_DIGITS.iter().position(|&c| c == code) {
                // A plain digit must never start a reflash, only with CTRL.
                Some(i) if press.ctrl() => {
                    if i + 1 < slot_count {
                        Key::Reflash(i + 1)
                    } else {
                        Key::Ignored
                    }
                }
                _ if code == key::HELP => Key::Help,
                _ => Key::Ignored,
            },
        }
    }
}

/// Where the menu is.
///
/// ```text
/// Rendering -> AwaitingInput -> Rendering
///                            -> ReflashConfirm -> ReflashInProgress -> Rendering
///                                              -> Rendering
///                            -> Exit
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Phase {
    Rendering,
    AwaitingInput,
    /// Running the safety checks for this slot.
    ReflashConfirm(usize),
    /// Writing the file to this slot.
    ReflashInProgress(usize, FileChoice),
    Exit(MenuExit),
}

/// How the menu was left.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuExit {
    /// Start the core at this flash offset.
    Launch(u32),
    Leave,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuState {
    /// Highlighted slot.
    pub selected: usize,
    /// Slot being reflashed.
    pub pending_reflash: Option<usize>,
    pub warnings: Warnings,
}

pub struct Menu {
    options: Options,
    lines: ControlLines,
    state: MenuState,
    phase: Phase,
}

impl Menu {
    pub fn new(options: Options, warnings: Warnings, lines: ControlLines) -> Menu {
        Menu {
            options,
            lines,
            state: MenuState { selected: 0, pending_reflash: None, warnings },
            phase: Phase::Rendering,
        }
    }

    pub fn state(&self) -> &MenuState {
        &self.state
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    /// Run until a core is to be started or the menu is left.
    pub fn run<R, F, D, S, X>(
        &mut self,
        hw: &mut Hardware<R, F, D>,
        slots: &mut SlotTable,
        screen: &mut S,
        flasher: &mut X,
    ) -> MenuExit
    where
        R: RegisterFile,
        F: ReadFlash,
        D: DelayMs<u16> + DelayUs<u16>,
        S: Screen,
        X: Reflasher,
    {
        loop {
            if let Phase::Exit(exit) = self.phase {
                return exit;
            }
            self.step(hw, slots, screen, flasher);
        }
    }

    /// Make one transition.
    pub fn step<R, F, D, S, X>(
        &mut self,
        hw: &mut Hardware<R, F, D>,
        slots: &mut SlotTable,
        screen: &mut S,
        flasher: &mut X,
    ) where
        R: RegisterFile,
        F: ReadFlash,
        D: DelayMs<u16> + DelayUs<u16>,
        S: Screen,
        X: Reflasher,
    {
        self.phase = match mem::replace(&mut self.phase, Phase::Rendering) {
            Phase::Rendering => {
                self.render(slots, screen);
                Phase::AwaitingInput
            }
            Phase::AwaitingInput => {
                let press = hw.wait_key();
                let key = Key::decode(press, slots.len(), self.options.slot0_reflash);
                self.handle(key, hw, slots, screen)
            }
            Phase::ReflashConfirm(slot) => {
                self.state.pending_reflash = Some(slot);
                let decision =
                    gate::authorize(hw, screen, flasher, slots, self.state.warnings, slot);
                match decision {
                    Decision::Granted(file) => Phase::ReflashInProgress(slot, file),
                    Decision::Declined | Decision::Rejected => {
                        info!("reflash of slot {} abandoned", slot);
                        self.finish_reflash(hw, screen)
                    }
                }
            }
            Phase::ReflashInProgress(slot, file) => {
                let slot0_version = slots.get(0).map(|s| s.version).unwrap_or_default();
                if flasher.reflash(slot, &file, &slot0_version).is_err() {
                    warn!("reflash of slot {} failed", slot);
                }
                // Whatever happened, the flash tells what the slot holds now.
                slots.scan(hw, ScanRequest::refresh(slot));
                self.finish_reflash(hw, screen)
            }
            Phase::Exit(exit) => Phase::Exit(exit),
        };
    }

    fn handle<R, F, D, S>(
        &mut self,
        key: Key,
        hw: &mut Hardware<R, F, D>,
        slots: &mut SlotTable,
        screen: &mut S,
    ) -> Phase
    where
        R: RegisterFile,
        F: ReadFlash,
        D: DelayMs<u16> + DelayUs<u16>,
        S: Screen,
    {
        let count = slots.len();
        match key {
            Key::Launch(slot) => self.launch(slot, hw, slots, screen),
            Key::LaunchSelected => self.launch(self.state.selected, hw, slots, screen),
            Key::Next => {
                self.state.selected = (self.state.selected + 1) % count;
                Phase::Rendering
            }
            Key::Prev => {
                self.state.selected = match self.state.selected {
                    0 => count - 1,
                    n => n - 1,
                };
                Phase::Rendering
            }
            Key::Leave => Phase::Exit(MenuExit::Leave),
            Key::Reflash(slot) => Phase::ReflashConfirm(slot),
            Key::Help => {
                diag::show(hw, slots, screen, self.options.variant, self.state.warnings, self.lines);
                Phase::Rendering
            }
            Key::Ignored => Phase::AwaitingInput,
        }
    }

    fn launch<R, F, D, S>(
        &mut self,
        slot: usize,
        hw: &mut Hardware<R, F, D>,
        slots: &SlotTable,
        screen: &mut S,
    ) -> Phase
    where
        R: RegisterFile,
        F: ReadFlash,
        D: DelayMs<u16> + DelayUs<u16>,
        S: Screen,
    {
        let empty = slots.get(slot).map(|s| s.validity == Validity::Empty).unwrap_or(true);
        // Slot 0 always holds the factory core.
        if slot != 0 && empty {
            hw.error_flash();
            return Phase::AwaitingInput;
        }

        if self.state.warnings.reconfig_disabled {
            hw.error_flash();
            screen.notice(Notice::CannotReconfigure);
            screen.notice(Notice::PressAnyKey);
            hw.press_any_key();
            screen.clear();
            return Phase::Rendering;
        }

        info!("launching slot {}", slot);
        Phase::Exit(MenuExit::Launch(slots.platform().boot_offset(slot)))
    }

    fn finish_reflash<R, F, D, S>(&mut self, hw: &mut Hardware<R, F, D>, screen: &mut S) -> Phase
    where
        R: RegisterFile,
        F: ReadFlash,
        D: DelayMs<u16> + DelayUs<u16>,
        S: Screen,
    {
        self.state.pending_reflash = None;
        screen.clear();
        hw.regs.poke(reg::BORDER, colour::BLACK);
        Phase::Rendering
    }

    fn render<S: Screen>(&self, slots: &SlotTable, screen: &mut S) {
        for slot in slots.iter() {
            let show_version = slot.index > 0 && slot.validity == Validity::Valid;
            let highlight = (slot.index == self.state.selected).then(|| match slot.validity {
                Validity::Valid => colour::WHITE,
                Validity::Invalid => colour::RED,
                Validity::Empty => colour::YELLOW,
            });
            screen.slot_row(&SlotRow {
                index: slot.index,
                name: &slot.name,
                version: show_version.then_some(&slot.version),
                default_slot: slot.flags.contains(CoreCaps::SLOT_DEFAULT),
                badges: if show_version { badges(slot.flags) } else { Vec::new() },
                highlight,
            });
        }
        screen.footer(slots.len());
    }
}

/// Cartridge badges for a slot's flags.
pub fn badges(flags: CoreCaps) -> Vec<Badge, 3> {
    let mut out = Vec::new();
    if flags.contains(CoreCaps::CART) {
        let _ = out.push(screen_codes(b"[ALL]"));
        return out;
    }
    let tags = [
        (CoreCaps::CART_C64, b"[C64]"),
        (CoreCaps::CART_C128, b"[128]"),
        (CoreCaps::CART_M65, b"[M65]"),
    ];
    for (flag, tag) in tags {
        if flags.contains(flag) {
            let _ = out.push(screen_codes(tag));
        }
    }
    out
}
