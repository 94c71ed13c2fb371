//! Linear memory.

use snek_core::{RuntimeTrap, WORD_SIZE};

/// Bytes per memory page.
pub const PAGE_SIZE: usize = 64 * 1024;

/// A zero-initialized byte array addressed by unsigned 32-bit addresses.
/// Words are little-endian.
#[derive(Debug, Clone)]
pub struct Memory {
    bytes: Vec<u8>,
}

impl Memory {
    pub fn new(pages: u32) -> Self {
        Self {
            bytes: vec![0; pages as usize * PAGE_SIZE],
        }
    }

    /// Size in bytes.
    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn load(&self, address: i32) -> Result<i32, RuntimeTrap> {
        let range = self.word(address)?;
        let mut word = [0u8; WORD_SIZE as usize];
        word.copy_from_slice(&self.bytes[range]);
        Ok(i32::from_le_bytes(word))
    }

    pub fn store(&mut self, address: i32, value: i32) -> Result<(), RuntimeTrap> {
        let range = self.word(address)?;
        self.bytes[range].copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    fn word(&self, address: i32) -> Result<std::ops::Range<usize>, RuntimeTrap> {
        // Addresses are reinterpreted as unsigned, so the -8 sentinel lands
        // near the top of the address space.
        let start = address as u32 as usize;
        let end = start + WORD_SIZE as usize;
        if end > self.bytes.len() {
            return Err(RuntimeTrap::OutOfBounds {
                address: i64::from(address as u32),
                size: self.bytes.len(),
            });
        }
        Ok(start..end)
    }
}
