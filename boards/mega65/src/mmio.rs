//! Register access on the real machine.
//!
//! Addresses below `$10000` are in the CPU's view, and are read and written
//! directly.  Everything above is a 28-bit address, reached through the DMA
//! helpers of mega65-libc.

use storage::RegisterFile;

extern "C" {
    fn lpeek(address: u32) -> u8;
    fn lpoke(address: u32, value: u8);
    fn lcopy(source: u32, destination: u32, count: u16);
    fn mega65_io_enable();
}

const CPU_SPACE: u32 = 0x1_0000;

/// CPU port register, selects the CPU speed.
const CPU_SPEED: u16 = 0x0000;
const SPEED_FULL: u8 = 65;
const SPEED_NORMAL: u8 = 64;

/// Keyboard buffer length of the KERNAL.
const KEYBUFFER_LEN: u16 = 0x00c6;

#[derive(Clone, Copy, Default)]
pub struct Mmio;

impl Mmio {
    /// Unlock the MEGA65 registers.
    pub fn init() -> Mmio {
        unsafe { mega65_io_enable() };
        Mmio
    }

    pub fn full_speed(&mut self) {
        self.poke(u32::from(CPU_SPEED), SPEED_FULL);
    }

    /// Leave things the way the hypervisor wants them.
    pub fn restore(&mut self) {
        self.poke(u32::from(KEYBUFFER_LEN), 0);
        self.poke(u32::from(CPU_SPEED), SPEED_NORMAL);
    }
}

impl RegisterFile for Mmio {
    fn peek(&mut self, addr: u32) -> u8 {
        if addr < CPU_SPACE {
            unsafe { core::ptr::read_volatile(addr as usize as *const u8) }
        } else {
            unsafe { lpeek(addr) }
        }
    }

    fn poke(&mut self, addr: u32, value: u8) {
        if addr < CPU_SPACE {
            unsafe { core::ptr::write_volatile(addr as usize as *mut u8, value) }
        } else {
            unsafe { lpoke(addr, value) }
        }
    }

    fn copy_out(&mut self, addr: u32, bytes: &mut [u8]) {
        if addr < CPU_SPACE {
            for (i, b) in bytes.iter_mut().enumerate() {
                *b = self.peek(addr + i as u32);
            }
        } else {
            // The buffer sits in the CPU's view, which is bank 0.
            let destination = bytes.as_mut_ptr() as usize as u32;
            unsafe { lcopy(addr, destination, bytes.len() as u16) }
        }
    }
}
