//! Storage and register access types.
//!
//! The flash slot manager never talks to hardware directly.  Flash contents
//! are reached through [`ReadFlash`] (and [`Flash`] for the writer side, which
//! only the reflash collaborator and the simulator use), and everything else
//! on the machine, I/O registers as well as far memory reached by DMA, is
//! reached through a [`RegisterFile`].

#![cfg_attr(not(any(feature = "std", test)), no_std)]

/// Size of the sector the QSPI driver transfers in one read.
pub const SECTOR_SIZE: usize = 512;

#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum Error {
    NotAligned,
    OutOfBounds,
    NotWritten,
    NotErased,
    /// The device did not answer the read.
    ReadFailed,
}

pub type Result<T> = core::result::Result<T, Error>;

/// Read only interface into flash.
pub trait ReadFlash {
    /// What is the read size (alignment and size multiple).
    fn read_size(&self) -> usize;
    fn read(&mut self, offset: usize, bytes: &mut [u8]) -> Result<()>;
    fn capacity(&self) -> usize;
}

/// Flash that can be written to.
pub trait Flash: ReadFlash {
    /// Write size (alignment and size multiple).
    fn write_size(&self) -> usize;
    /// Erase size (alignment and size multiple).
    fn erase_size(&self) -> usize;

    fn erase(&mut self, from: usize, to: usize) -> Result<()>;
    fn write(&mut self, offset: usize, bytes: &[u8]) -> Result<()>;
}

/// Byte wide access to the machine's address space.
///
/// Addresses below `$10000` are CPU addresses with the I/O area banked in
/// (`$D610` is the keyboard register).  Anything above is a 28-bit far
/// address reached by DMA, such as the attic RAM at `$8000000` or the
/// cartridge ROM window at `$4008000`.
pub trait RegisterFile {
    fn peek(&mut self, addr: u32) -> u8;
    fn poke(&mut self, addr: u32, value: u8);

    /// Read `bytes.len()` consecutive bytes starting at `addr`.
    fn copy_out(&mut self, addr: u32, bytes: &mut [u8]) {
        for (i, b) in bytes.iter_mut().enumerate() {
            *b = self.peek(addr + i as u32);
        }
    }
}

impl<T: RegisterFile + ?Sized> RegisterFile for &mut T {
    fn peek(&mut self, addr: u32) -> u8 {
        (**self).peek(addr)
    }

    fn poke(&mut self, addr: u32, value: u8) {
        (**self).poke(addr, value)
    }
}

// Utilities taken from embedded-storage for validating arguments.
pub fn check_read<T: ReadFlash>(
    flash: &T,
    offset: usize,
    length: usize,
) -> Result<()> {
    check_slice(flash, flash.read_size(), offset, length)
}

pub fn check_erase<T: Flash>(
    flash: &T,
    from: usize,
    to: usize,
) -> Result<()> {
    if from > to || to > flash.capacity() {
        return Err(Error::OutOfBounds);
    }
    if from % flash.erase_size() != 0 || to % flash.erase_size() != 0 {
        return Err(Error::NotAligned);
    }
    Ok(())
}

pub fn check_write<T: Flash>(
    flash: &T,
    offset: usize,
    length: usize,
) -> Result<()> {
    check_slice(flash, flash.write_size(), offset, length)
}

pub fn check_slice<T: ReadFlash>(
    flash: &T,
    align: usize,
    offset: usize,
    length: usize,
) -> Result<()> {
    if length > flash.capacity() || offset > flash.capacity() - length {
        return Err(Error::OutOfBounds);
    }
    if offset % align != 0 || length % align != 0 {
        return Err(Error::NotAligned);
    }
    Ok(())
}
