//! A delay that does not wait.

use embedded_hal::blocking::delay::{DelayMs, DelayUs};

/// Counts the time it was asked to wait.
#[derive(Debug, Default)]
pub struct SimDelay {
    pub total_us: u64,
    pub calls: usize,
}

impl SimDelay {
    pub fn new() -> SimDelay {
        SimDelay::default()
    }

    pub fn total_ms(&self) -> u64 {
        self.total_us / 1000
    }
}

impl DelayMs<u16> for SimDelay {
    fn delay_ms(&mut self, ms: u16) {
        self.total_us += u64::from(ms) * 1000;
        self.calls += 1;
    }
}

impl DelayUs<u16> for SimDelay {
    fn delay_us(&mut self, us: u16) {
        self.total_us += u64::from(us);
        self.calls += 1;
    }
}
