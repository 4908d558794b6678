//! QSPI flash driver bindings.
//!
//! Reading, flashing and reconfiguration are done by the C driver shared by
//! the flash tools.  Reads go through its 512 byte sector buffer.  Flashing
//! runs its own UI: file browser, progress and verification.

use megaflash::gate::FACTORY_UPGRADE_FILE;
use megaflash::{Error, FileChoice, Label, Reflasher};
use storage::{ReadFlash, SECTOR_SIZE};

extern "C" {
    static mut data_buffer: [u8; SECTOR_SIZE];
    /// Name of the file picked by the browser, NUL terminated.
    static mut disk_name_return: [u8; 32];

    fn read_data(start_address: u32);
    fn reconfig_fpga(addr: u32);
    fn select_bitstream_file(slot: u8) -> u8;
    fn reflash_slot(slot: u8, selected_file: u8, slot0_version: *const u8);
}

/// Browser results, as defined by the driver.
const SELECTED_FILE_INVALID: u8 = 0xfe;
const SELECTED_FILE_VALID: u8 = 0xff;

pub struct Qspi {
    capacity: usize,
}

impl Qspi {
    pub fn new(capacity: usize) -> Qspi {
        Qspi { capacity }
    }
}

impl ReadFlash for Qspi {
    fn read_size(&self) -> usize {
        1
    }

    fn read(&mut self, offset: usize, bytes: &mut [u8]) -> storage::Result<()> {
        storage::check_read(self, offset, bytes.len())?;

        let mut pos = offset;
        let mut done = 0;
        while done < bytes.len() {
            let sector = pos - pos % SECTOR_SIZE;
            let skip = pos - sector;
            let count = (SECTOR_SIZE - skip).min(bytes.len() - done);
            unsafe {
                read_data(sector as u32);
                let buffer = &*core::ptr::addr_of!(data_buffer);
                bytes[done..done + count].copy_from_slice(&buffer[skip..skip + count]);
            }
            pos += count;
            done += count;
        }
        Ok(())
    }

    fn capacity(&self) -> usize {
        self.capacity
    }
}

/// Start the core at `offset`.  Only comes back if the FPGA refused.
pub fn reconfigure(offset: u32) {
    unsafe { reconfig_fpga(offset) }
}

/// The driver's file browser and flasher.
#[derive(Default)]
pub struct Flasher {
    selected: Option<u8>,
}

impl Reflasher for Flasher {
    fn select_file(&mut self, slot: usize) -> Option<FileChoice> {
        let selected = unsafe { select_bitstream_file(slot as u8) };
        if selected == SELECTED_FILE_INVALID {
            return None;
        }
        let name = unsafe { &*core::ptr::addr_of!(disk_name_return) };
        let len = name.iter().position(|&b| b == 0).unwrap_or(name.len());
        let choice = core::str::from_utf8(&name[..len]).ok().and_then(FileChoice::new)?;
        self.selected = Some(selected);
        Some(choice)
    }

    fn reflash(&mut self, slot: usize, file: &FileChoice, slot0_version: &Label) -> Result<(), Error> {
        let selected = if slot == 0 && file.name.as_str() == FACTORY_UPGRADE_FILE {
            // Slot 0 skips the browser, hand the name over directly.
            let mut name = [0u8; 32];
            name[..file.name.len()].copy_from_slice(file.name.as_bytes());
            unsafe { *core::ptr::addr_of_mut!(disk_name_return) = name };
            SELECTED_FILE_VALID
        } else {
            self.selected.take().ok_or(Error::Reflash)?
        };

        unsafe { reflash_slot(slot as u8, selected, slot0_version.as_cstr_bytes().as_ptr()) };
        Ok(())
    }
}
