//! Core file generation.
//!
//! A core file is a 4k header followed by the bitstream.  The bitstream here
//! is random data, nothing looks at it past the header.

use rand::{RngCore, SeedableRng};
use rand_xoshiro::Xoshiro256Plus;

use anyhow::{anyhow, Result};

pub const HEADER_SIZE: usize = 4096;

const MAGIC: &[u8; 16] = b"MEGA65BITSTREAM0";
const NAME_OFFSET: usize = 0x10;
const VERSION_OFFSET: usize = 0x30;
const TEXT_LEN: usize = 32;
const CAPS_OFFSET: usize = 0x7b;
const FLAGS_OFFSET: usize = 0x7c;

pub struct GeneratedCore {
    pub data: Vec<u8>,
}

pub struct GenBuilder {
    name: String,
    version: String,
    caps: u8,
    flags: u8,
    /// Total size of the core, header included.
    size: usize,
    /// Seed for the PRNG
    seed: u64,
    /// Leave out the magic, for slots with unknown content.
    magic: bool,
}

impl Default for GenBuilder {
    fn default() -> Self {
        GenBuilder {
            name: "MEGA65 TEST CORE".to_string(),
            version: "v0.1.0".to_string(),
            caps: 0,
            flags: 0,
            size: 24_576,
            seed: 1,
            magic: true,
        }
    }
}

impl GenBuilder {
    pub fn name(&mut self, name: &str) -> &mut Self {
        self.name = name.to_string();
        self
    }

    pub fn version(&mut self, version: &str) -> &mut Self {
        self.version = version.to_string();
        self
    }

    pub fn caps(&mut self, caps: u8) -> &mut Self {
        self.caps = caps;
        self
    }

    pub fn flags(&mut self, flags: u8) -> &mut Self {
        self.flags = flags;
        self
    }

    pub fn size(&mut self, size: usize) -> &mut Self {
        self.size = size;
        self
    }

    pub fn seed(&mut self, seed: u64) -> &mut Self {
        self.seed = seed;
        self
    }

    pub fn without_magic(&mut self) -> &mut Self {
        self.magic = false;
        self
    }

    pub fn build(&self) -> Result<GeneratedCore> {
        if self.size < HEADER_SIZE {
            return Err(anyhow!("core of {} bytes has no room for its header", self.size));
        }
        for (what, text) in [("name", &self.name), ("version", &self.version)] {
            if text.len() > TEXT_LEN {
                return Err(anyhow!("{} {:?} is longer than {} bytes", what, text, TEXT_LEN));
            }
        }

        let mut rng = Xoshiro256Plus::seed_from_u64(self.seed);
        let mut data = vec![0u8; self.size];
        rng.fill_bytes(&mut data[HEADER_SIZE..]);

        // The header is zeros apart from the fields below.
        if self.magic {
            data[..MAGIC.len()].copy_from_slice(MAGIC);
        }
        data[NAME_OFFSET..NAME_OFFSET + self.name.len()].copy_from_slice(self.name.as_bytes());
        data[VERSION_OFFSET..VERSION_OFFSET + self.version.len()]
            .copy_from_slice(self.version.as_bytes());
        data[CAPS_OFFSET] = self.caps;
        data[FLAGS_OFFSET] = self.flags;

        Ok(GeneratedCore { data })
    }
}
