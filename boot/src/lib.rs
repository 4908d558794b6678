//! MEGA65 flash slot manager.
//!
//! The flash holds a fixed number of slots, each the size of one FPGA core.
//! This crate decides which of them to start on power-up, and runs the slot
//! menu that lets the user start a core by hand or replace the content of a
//! slot.  All hardware is reached through [`storage::ReadFlash`],
//! [`storage::RegisterFile`] and a delay provider, which makes every path
//! reachable from the simulator.

#![cfg_attr(not(any(feature = "std", test)), no_std)]

#[macro_use]
mod log;

pub mod cart;
pub mod charmap;
pub mod diag;
pub mod gate;
pub mod hw;
pub mod label;
pub mod menu;
pub mod platform;
pub mod screen;
pub mod select;
pub mod slot;
pub mod startup;

pub use cart::{CartId, Cartridge, ControlLines};
pub use gate::{FileChoice, Reflasher};
pub use hw::{Hardware, KeyPress};
pub use label::Label;
pub use menu::{Menu, MenuExit};
pub use platform::Platform;
pub use screen::{Notice, Screen};
pub use slot::{CoreCaps, ScanRequest, SlotRecord, SlotTable, Target, Validity};
pub use startup::{Exit, Options, Variant, Warnings};

pub type Result<T> = core::result::Result<T, Error>;

// Use the error kind to avoid this depending on the particular flash.
#[derive(Debug)]
pub enum Error {
    Flash(storage::Error),
    /// The machine reported a model id we have no slot layout for.
    UnknownModel(u8),
    /// The reflash collaborator gave up before the slot was rewritten.
    Reflash,
}

/// Convert the flash error into our error type.
impl From<storage::Error> for Error {
    fn from(e: storage::Error) -> Self {
        Error::Flash(e)
    }
}
