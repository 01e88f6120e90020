//! Program Image Loader.
//!
//! This module turns a file on disk into the bytes placed in memory before the first tick:
//! 1. **Raw images:** Used byte-for-byte.
//! 2. **ELF images:** Loadable segments are flattened into one contiguous image starting
//!    at the lowest segment address; gaps and `.bss` are zero-filled.
//! 3. **Placement:** The image is copied into the local memory model at the configured
//!    offset and, when a DDR peripheral is configured, into its store as well.
//!
//! Every failure here happens before simulation starts.

use std::fs;
use std::path::{Path, PathBuf};

use object::{Object, ObjectSegment};

use crate::common::constants::{ELF_MAGIC, MAX_IMAGE_BYTES};
use crate::common::{SimError, SimResult};
use crate::config::DdrConfig;
use crate::memory::MemoryModel;
use crate::peripheral::{DdrModel, controller};

/// A validated, flattened program image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProgramImage {
    bytes: Vec<u8>,
    base_address: Option<u64>,
    source: Option<PathBuf>,
}

impl ProgramImage {
    /// Builds an image from raw or ELF bytes.
    ///
    /// # Arguments
    ///
    /// * `bytes` - File contents. Anything starting with the ELF magic is parsed as ELF.
    ///
    /// # Returns
    ///
    /// The flattened image, or an error if it is empty, malformed, or spans more
    /// than `MAX_IMAGE_BYTES`.
    pub fn from_bytes(bytes: Vec<u8>) -> SimResult<Self> {
        if bytes.starts_with(&ELF_MAGIC) {
            let (base, flat) = flatten_elf(&bytes)?;
            return Self::checked(flat, Some(base), None);
        }
        Self::checked(bytes, None, None)
    }

    /// Reads an image from disk.
    pub fn from_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let bytes = fs::read(path).map_err(|e| SimError::io(path, e))?;
        let mut image = Self::from_bytes(bytes)?;
        image.source = Some(path.to_path_buf());
        Ok(image)
    }

    fn checked(
        bytes: Vec<u8>,
        base_address: Option<u64>,
        source: Option<PathBuf>,
    ) -> SimResult<Self> {
        if bytes.is_empty() {
            return Err(SimError::EmptyImage);
        }
        Ok(Self {
            bytes,
            base_address,
            source,
        })
    }

    /// Image contents.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Image length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; empty images are rejected on construction.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Lowest segment address, for images flattened from ELF.
    pub const fn base_address(&self) -> Option<u64> {
        self.base_address
    }

    /// File the image was read from, if any.
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Copies the image into `memory` at byte `offset`.
    ///
    /// # Arguments
    ///
    /// * `memory` - Target store; left untouched if the image does not fit.
    /// * `offset` - Byte offset of the first image byte.
    pub fn load_into(&self, memory: &mut MemoryModel, offset: u64) -> SimResult<()> {
        memory.load(&self.bytes, offset)?;
        tracing::info!(
            bytes = self.bytes.len(),
            offset,
            "program image loaded into local memory"
        );
        Ok(())
    }
}

/// Flattens the loadable segments of an ELF file.
///
/// Segments that wrap the address space, or that together span more than
/// `MAX_IMAGE_BYTES`, are rejected before anything is allocated.
fn flatten_elf(data: &[u8]) -> SimResult<(u64, Vec<u8>)> {
    let file = object::File::parse(data)?;

    let mut segments = Vec::new();
    for segment in file.segments() {
        let contents = segment.data()?;
        let span = segment.size().max(contents.len() as u64);
        if span == 0 {
            continue;
        }
        let addr = segment.address();
        let end = addr
            .checked_add(span)
            .ok_or_else(|| span_too_large(u64::MAX, addr))?;
        segments.push((addr, end, contents));
    }

    let Some(base) = segments.iter().map(|&(addr, _, _)| addr).min() else {
        return Err(SimError::EmptyImage);
    };
    let end = segments
        .iter()
        .map(|&(_, end, _)| end)
        .max()
        .unwrap_or(base);
    let len = usize::try_from(end - base)
        .ok()
        .filter(|&len| len <= MAX_IMAGE_BYTES)
        .ok_or_else(|| span_too_large(end - base, base))?;

    let mut flat = vec![0u8; len];
    for (addr, _, contents) in segments {
        let start = usize::try_from(addr - base).map_err(|_| span_too_large(end - base, base))?;
        flat[start..start + contents.len()].copy_from_slice(contents);
    }
    Ok((base, flat))
}

fn span_too_large(span: u64, base: u64) -> SimError {
    SimError::ImageTooLarge {
        len: usize::try_from(span).unwrap_or(usize::MAX),
        offset: base,
        capacity: MAX_IMAGE_BYTES,
    }
}

/// Builds the peripheral-side DDR store described by `config`.
///
/// The store is filled from `config.init_file` when set, otherwise from `image`,
/// truncated to `config.num_bytes` and placed at `config.file_offset`.
pub fn build_ddr(config: &DdrConfig, image: &ProgramImage) -> SimResult<DdrModel> {
    let backing;
    let contents = match &config.init_file {
        Some(path) => {
            backing = ProgramImage::from_file(path)?;
            backing.bytes()
        }
        None => image.bytes(),
    };
    let contents = match config.num_bytes {
        Some(n) => &contents[..n.min(contents.len())],
        None => contents,
    };

    let mut ddr = DdrModel::new(config.size_bytes, config.base, controller::from_config(config));
    ddr.load(contents, config.file_offset)?;
    tracing::info!(
        bytes = contents.len(),
        offset = config.file_offset,
        separate_file = config.init_file.is_some(),
        "ddr backing store loaded"
    );
    Ok(ddr)
}
