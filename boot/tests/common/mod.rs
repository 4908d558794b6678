//! Simulated machine for the integration tests.

#![allow(dead_code)]

use megaflash::diag::{BootDebug, Diagnostics};
use megaflash::screen::SlotRow;
use megaflash::{Error, FileChoice, Hardware, Label, Notice, Reflasher, Screen};
use simflash::delay::SimDelay;
use simflash::gen::GenBuilder;
use simflash::media::SdCard;
use simflash::regs::SimRegs;
use simflash::styles::AreaLayout;
use simflash::SharedFlash;

pub type SimHardware = Hardware<SimRegs, SharedFlash, SimDelay>;

/// A machine with the given flash, and nothing in it.
pub fn machine(layout: &AreaLayout) -> (SimHardware, SharedFlash) {
    let flash = SharedFlash::new(layout.build().unwrap());
    let hw = Hardware::new(SimRegs::new(layout.model_id), flash.clone(), SimDelay::new());
    (hw, flash)
}

/// Put a core with the given name and flags into a slot.
pub fn install_core(flash: &SharedFlash, layout: &AreaLayout, slot: usize, name: &str, flags: u8) {
    let core = GenBuilder::default()
        .name(name)
        .flags(flags)
        .seed(slot as u64)
        .build()
        .unwrap();
    flash.borrow_mut().install(&core.data, layout.slot_offset(slot)).unwrap();
}

/// Put something that is not a core into a slot.
pub fn install_junk(flash: &SharedFlash, layout: &AreaLayout, slot: usize) {
    let junk = GenBuilder::default().without_magic().build().unwrap();
    flash.borrow_mut().install(&junk.data, layout.slot_offset(slot)).unwrap();
}

/// A slot row, as it was drawn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Row {
    pub index: usize,
    pub name: Label,
    pub version: Option<Label>,
    pub default_slot: bool,
    pub badges: usize,
    pub highlight: Option<u8>,
}

#[derive(Debug, Default)]
pub struct SimScreen {
    /// Rows of the last drawn menu.
    pub rows: Vec<Row>,
    pub renders: usize,
    pub clears: usize,
    pub notices: Vec<Notice>,
    pub echoed: Vec<u8>,
    pub diagnostics: Vec<(u32, bool, Option<usize>)>,
    pub boot_debug: Vec<BootDebug>,
}

impl SimScreen {
    pub fn new() -> SimScreen {
        SimScreen::default()
    }

    pub fn highlighted(&self) -> Option<usize> {
        self.rows.iter().find(|r| r.highlight.is_some()).map(|r| r.index)
    }
}

impl Screen for SimScreen {
    fn clear(&mut self) {
        self.clears += 1;
    }

    fn slot_row(&mut self, row: &SlotRow<'_>) {
        if row.index == 0 {
            self.rows.clear();
        }
        self.rows.push(Row {
            index: row.index,
            name: *row.name,
            version: row.version.copied(),
            default_slot: row.default_slot,
            badges: row.badges.len(),
            highlight: row.highlight,
        });
    }

    fn footer(&mut self, _slot_count: usize) {
        self.renders += 1;
    }

    fn notice(&mut self, notice: Notice) {
        self.notices.push(notice);
    }

    fn echo(&mut self, key: u8) {
        self.echoed.push(key);
    }

    fn diagnostics(&mut self, diag: &Diagnostics) {
        self.diagnostics
            .push((diag.core_hash, diag.jtag_boot, diag.boot.map(|b| b.slot)));
    }

    fn boot_debug(&mut self, debug: &BootDebug) {
        self.boot_debug.push(*debug);
    }
}

/// The flasher, writing files from a simulated SD card.
pub struct SimReflasher {
    pub card: SdCard,
    flash: SharedFlash,
    slot_size: usize,
    /// What the file browser answers.
    pub choice: Option<String>,
    pub selections: Vec<usize>,
    pub flashed: Vec<(usize, String)>,
}

impl SimReflasher {
    pub fn new(flash: &SharedFlash, layout: &AreaLayout) -> SimReflasher {
        SimReflasher {
            card: SdCard::new().unwrap(),
            flash: flash.clone(),
            slot_size: layout.slot_size,
            choice: None,
            selections: Vec::new(),
            flashed: Vec::new(),
        }
    }
}

impl Reflasher for SimReflasher {
    fn select_file(&mut self, slot: usize) -> Option<FileChoice> {
        self.selections.push(slot);
        self.choice.as_deref().and_then(FileChoice::new)
    }

    fn reflash(&mut self, slot: usize, file: &FileChoice, _slot0_version: &Label) -> Result<(), Error> {
        let data = self.card.read(&file.name).map_err(|_| Error::Reflash)?;
        self.flash
            .borrow_mut()
            .program_slot(slot * self.slot_size, self.slot_size, &data)
            .map_err(|_| Error::Reflash)?;
        self.flashed.push((slot, file.name.to_string()));
        Ok(())
    }
}
