//! Local Memory Model.
//!
//! This module implements the synchronous memory the processor model fetches from and
//! stores to. It provides:
//! 1. **Store:** A word-organised, byte-addressable backing store with byte-enable writes.
//! 2. **Service:** Registered read ports that delay read data by one cycle, the way a
//!    block RAM with an output register behaves.
//!
//! Addresses on the memory interfaces are word indices; image loading works in bytes.

/// Per-cycle servicing of the instruction and data interfaces.
pub mod service;

pub use service::{MemoryService, RegisteredPort};

use crate::common::constants::WORD_SHIFT;
use crate::common::{BYTE_ENABLE_ALL, SimError, SimResult, WORD_BYTES};

/// Word-organised backing store.
///
/// Words are little-endian: byte lane `i` of a word holds byte `4 * addr + i`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryModel {
    words: Vec<u32>,
}

impl MemoryModel {
    /// Creates a zeroed store of `size_bytes`, rounded down to whole words.
    pub fn new(size_bytes: usize) -> Self {
        Self {
            words: vec![0; size_bytes / WORD_BYTES],
        }
    }

    /// Capacity in bytes.
    pub fn size_bytes(&self) -> usize {
        self.words.len() * WORD_BYTES
    }

    /// Capacity in words.
    pub fn len(&self) -> usize {
        self.words.len()
    }

    /// True if the store holds no words.
    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Reads the word at index `addr`.
    ///
    /// Out-of-range reads return zero.
    pub fn read(&self, addr: u32) -> u32 {
        match self.words.get(addr as usize) {
            Some(word) => *word,
            None => {
                tracing::warn!("memory read outside store at word {addr:#x}");
                0
            }
        }
    }

    /// Writes the byte lanes of `data` selected by `byte_enable` at word index `addr`.
    ///
    /// Out-of-range writes are dropped.
    pub fn write(&mut self, addr: u32, data: u32, byte_enable: u8) {
        if byte_enable & BYTE_ENABLE_ALL == 0 {
            return;
        }
        let Some(word) = self.words.get_mut(addr as usize) else {
            tracing::warn!("memory write outside store at word {addr:#x}");
            return;
        };
        let mask = lane_mask(byte_enable);
        *word = (*word & !mask) | (data & mask);
    }

    /// Copies `bytes` into the store starting at byte `offset`.
    ///
    /// # Arguments
    ///
    /// * `bytes` - Little-endian image contents.
    /// * `offset` - Byte offset of the first byte; need not be word aligned.
    ///
    /// # Returns
    ///
    /// `SimError::ImageTooLarge` without modifying the store if the image does not fit.
    pub fn load(&mut self, bytes: &[u8], offset: u64) -> SimResult<()> {
        let capacity = self.size_bytes();
        let too_large = SimError::ImageTooLarge {
            len: bytes.len(),
            offset,
            capacity,
        };
        let Ok(start) = usize::try_from(offset) else {
            return Err(too_large);
        };
        match start.checked_add(bytes.len()) {
            Some(end) if end <= capacity => {}
            _ => return Err(too_large),
        }

        for (i, &byte) in bytes.iter().enumerate() {
            let at = start + i;
            let word = &mut self.words[at >> WORD_SHIFT];
            let shift = (at % WORD_BYTES) * 8;
            *word = (*word & !(0xFF << shift)) | (u32::from(byte) << shift);
        }
        Ok(())
    }
}

/// Expands a 4-bit byte-enable into a 32-bit lane mask.
fn lane_mask(byte_enable: u8) -> u32 {
    (0..WORD_BYTES)
        .filter(|lane| byte_enable & (1 << lane) != 0)
        .fold(0, |mask, lane| mask | (0xFF << (lane * 8)))
}
