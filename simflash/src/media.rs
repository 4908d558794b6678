//! The SD card, as a temporary directory of core files.

use std::fs;

use anyhow::{anyhow, Result};
use temp_dir::TempDir;

pub struct SdCard {
    dir: TempDir,
}

impl SdCard {
    pub fn new() -> Result<SdCard> {
        Ok(SdCard { dir: TempDir::new()? })
    }

    /// Put a file on the card.  The card is FAT, so names are kept upper
    /// case.
    pub fn add(&self, name: &str, data: &[u8]) -> Result<()> {
        fs::write(self.dir.path().join(name.to_ascii_uppercase()), data)?;
        Ok(())
    }

    pub fn read(&self, name: &str) -> Result<Vec<u8>> {
        let path = self.dir.path().join(name.to_ascii_uppercase());
        fs::read(&path).map_err(|e| anyhow!("{}: {}", name, e))
    }

    /// Names of the `.COR` files, sorted.
    pub fn cores(&self) -> Result<Vec<String>> {
        let mut names = Vec::new();
        for entry in fs::read_dir(self.dir.path())? {
            let name = entry?.file_name().to_string_lossy().into_owned();
            if name.ends_with(".COR") {
                names.push(name);
            }
        }
        names.sort();
        Ok(names)
    }
}
