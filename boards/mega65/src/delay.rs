//! Busy-wait delays.

use embedded_hal::blocking::delay::{DelayMs, DelayUs};

extern "C" {
    fn usleep(micros: u32);
}

/// Waits using the libc timer loop, calibrated for full speed.
pub struct Delay;

impl DelayUs<u16> for Delay {
    fn delay_us(&mut self, us: u16) {
        unsafe { usleep(u32::from(us)) }
    }
}

impl DelayMs<u16> for Delay {
    fn delay_ms(&mut self, ms: u16) {
        unsafe { usleep(u32::from(ms) * 1000) }
    }
}
