//! Global Constants.
//!
//! This module defines constants shared by the memory model, loader, and driver. It includes:
//! 1. **Bus Constants:** Word width and byte-enable layout of the memory interfaces.
//! 2. **Image Constants:** Magic numbers used to classify program images.
//! 3. **Clock Constants:** Counter increments per simulated clock cycle.

/// Width of one memory-interface word in bytes.
pub const WORD_BYTES: usize = 4;

/// Number of bits to shift to convert between bytes and words.
pub const WORD_SHIFT: u32 = 2;

/// Byte-enable value selecting every byte lane of a word.
pub const BYTE_ENABLE_ALL: u8 = 0b1111;

/// Leading bytes of an ELF file.
pub const ELF_MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];

/// Largest span an ELF image may flatten to (1 GiB).
pub const MAX_IMAGE_BYTES: usize = 1 << 30;

/// Half-phases per full clock cycle; `cycle_count` advances by this much per tick.
pub const PHASES_PER_CYCLE: u64 = 2;
