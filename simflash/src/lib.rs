//! Simulated MEGA65 hardware
//!
//! The slot menu only reaches the machine through the `storage` traits and a
//! delay, so everything it touches can be simulated:
//!
//! - [`SimFlash`], a QSPI flash.  Storage is sparse, as the real parts are
//!   32 to 64MB, and mostly erased.  The flash can be made to answer the
//!   first reads after power up with garbage, as the real part does, and
//!   individual sectors can be made to fail.
//! - [`regs::SimRegs`], the register file, with a scripted keyboard and an
//!   optional attic RAM.
//! - [`delay::SimDelay`], a delay that only counts.
//! - [`media::SdCard`], a directory of core files.
//! - [`gen::GenBuilder`], which builds core files.
//!
//! Flash writes follow NOR rules: bytes must be erased before they are
//! written, and erases are whole erase blocks.

use std::cell::{Ref, RefCell, RefMut};
use std::collections::{BTreeMap, BTreeSet};
use std::rc::Rc;

use anyhow::{anyhow, Result};
use sha2::{Digest, Sha256};
use storage::{Flash, ReadFlash};

pub mod delay;
pub mod gen;
pub mod media;
pub mod regs;
pub mod styles;

/// What the flash returns for its first reads after power up.
pub const GARBAGE: u8 = 0xee;

const ERASED: u8 = 0xff;

pub struct SimFlash {
    read_size: usize,
    write_size: usize,
    erase_size: usize,
    sectors: usize,
    /// Contents of each erase block that is not fully erased.
    blocks: BTreeMap<usize, Vec<u8>>,
    /// Reads still to be answered with garbage.
    garbage_reads: usize,
    /// Offsets whose reads fail.
    bad_reads: BTreeSet<usize>,
    reads: usize,
}

impl SimFlash {
    pub fn new(read_size: usize, write_size: usize, erase_size: usize, sectors: usize) -> Result<SimFlash> {
        for (what, size) in [("read", read_size), ("write", write_size), ("erase", erase_size)] {
            if !size.is_power_of_two() {
                return Err(anyhow!("{} size {} is not a power of two", what, size));
            }
        }
        if erase_size % write_size != 0 {
            return Err(anyhow!("erase size must be a multiple of the write size"));
        }
        Ok(SimFlash {
            read_size,
            write_size,
            erase_size,
            sectors,
            blocks: BTreeMap::new(),
            garbage_reads: 0,
            bad_reads: BTreeSet::new(),
            reads: 0,
        })
    }

    /// Answer the next `count` reads with [`GARBAGE`].
    pub fn garbage_first_reads(&mut self, count: usize) {
        self.garbage_reads = count;
    }

    /// Make reads starting at `offset` fail.
    pub fn fail_reads_at(&mut self, offset: usize) {
        self.bad_reads.insert(offset);
    }

    /// Number of reads so far.
    pub fn reads(&self) -> usize {
        self.reads
    }

    /// Erase whatever is needed and write `data` at `offset`.
    pub fn install(&mut self, data: &[u8], offset: usize) -> Result<()> {
        let from = offset - offset % self.erase_size;
        let end = offset + data.len();
        let to = end.div_ceil(self.erase_size) * self.erase_size;
        self.erase(from, to).map_err(|e| anyhow!("erase: {:?}", e))?;

        // Pad to the write size with erased bytes.
        let mut padded = data.to_vec();
        padded.resize(data.len().div_ceil(self.write_size) * self.write_size, ERASED);
        self.write(offset, &padded).map_err(|e| anyhow!("write: {:?}", e))?;
        Ok(())
    }

    /// Write `data` into a slot the way the flasher does: erase the whole
    /// slot, write, then read back and compare the digests.
    pub fn program_slot(&mut self, offset: usize, slot_size: usize, data: &[u8]) -> Result<()> {
        if data.len() > slot_size {
            return Err(anyhow!("core of {} bytes does not fit a {} byte slot", data.len(), slot_size));
        }
        self.erase(offset, offset + slot_size).map_err(|e| anyhow!("erase: {:?}", e))?;
        self.install(data, offset)?;

        let written = self.digest(offset, data.len())?;
        let wanted: [u8; 32] = Sha256::digest(data).into();
        if written != wanted {
            return Err(anyhow!("verify failed at 0x{:x}", offset));
        }
        Ok(())
    }

    /// SHA-256 of a range of flash.
    pub fn digest(&self, offset: usize, len: usize) -> Result<[u8; 32]> {
        let mut hasher = Sha256::new();
        let mut buf = vec![0u8; len];
        self.peek(offset, &mut buf);
        hasher.update(&buf);
        Ok(hasher.finalize().into())
    }

    /// Copy out flash contents, without any of the read quirks.
    pub fn peek(&self, offset: usize, bytes: &mut [u8]) {
        for (i, b) in bytes.iter_mut().enumerate() {
            let pos = offset + i;
            *b = match self.blocks.get(&(pos / self.erase_size)) {
                Some(block) => block[pos % self.erase_size],
                None => ERASED,
            };
        }
    }
}

/// A flash shared between the menu, which only reads it, and the flasher.
#[derive(Clone)]
pub struct SharedFlash(Rc<RefCell<SimFlash>>);

impl SharedFlash {
    pub fn new(flash: SimFlash) -> SharedFlash {
        SharedFlash(Rc::new(RefCell::new(flash)))
    }

    pub fn borrow(&self) -> Ref<'_, SimFlash> {
        self.0.borrow()
    }

    pub fn borrow_mut(&self) -> RefMut<'_, SimFlash> {
        self.0.borrow_mut()
    }
}

impl ReadFlash for SharedFlash {
    fn read_size(&self) -> usize {
        self.0.borrow().read_size()
    }

    fn read(&mut self, offset: usize, bytes: &mut [u8]) -> storage::Result<()> {
        self.0.borrow_mut().read(offset, bytes)
    }

    fn capacity(&self) -> usize {
        self.0.borrow().capacity()
    }
}

impl ReadFlash for SimFlash {
    fn read_size(&self) -> usize {
        self.read_size
    }

    fn read(&mut self, offset: usize, bytes: &mut [u8]) -> storage::Result<()> {
        storage::check_read(self, offset, bytes.len())?;
        self.reads += 1;
        if self.bad_reads.contains(&offset) {
            return Err(storage::Error::ReadFailed);
        }
        if self.garbage_reads > 0 {
            self.garbage_reads -= 1;
            bytes.fill(GARBAGE);
            return Ok(());
        }
        self.peek(offset, bytes);
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.erase_size * self.sectors
    }
}

impl Flash for SimFlash {
    fn write_size(&self) -> usize {
        self.write_size
    }

    fn erase_size(&self) -> usize {
        self.erase_size
    }

    fn erase(&mut self, from: usize, to: usize) -> storage::Result<()> {
        storage::check_erase(self, from, to)?;
        for block in from / self.erase_size..to / self.erase_size {
            self.blocks.remove(&block);
        }
        Ok(())
    }

    fn write(&mut self, offset: usize, bytes: &[u8]) -> storage::Result<()> {
        storage::check_write(self, offset, bytes.len())?;
        let mut check = vec![0u8; bytes.len()];
        self.peek(offset, &mut check);
        if check.iter().any(|&b| b != ERASED) {
            return Err(storage::Error::NotErased);
        }
        for (i, &b) in bytes.iter().enumerate() {
            let pos = offset + i;
            let erase_size = self.erase_size;
            let block = self
                .blocks
                .entry(pos / erase_size)
                .or_insert_with(|| vec![ERASED; erase_size]);
            block[pos % erase_size] = b;
        }
        Ok(())
    }
}
