//! # Program Image Loading Tests
//!
//! This module contains unit tests for program image loading: raw and ELF images,
//! placement in local memory, DDR backing stores, and rejection of bad images.

use std::io::Write;

use cosim_core::common::SimError;
use cosim_core::config::DdrConfig;
use cosim_core::memory::MemoryModel;
use cosim_core::sim::ProgramImage;
use cosim_core::sim::loader::build_ddr;
use tempfile::NamedTempFile;

/// Helper function to create a temporary binary file for testing.
fn create_temp_binary(data: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(data).unwrap();
    file.flush().unwrap();
    file
}

/// Minimal 32-bit little-endian RISC-V executable with one loadable segment.
///
/// The segment carries `payload` in the file and extends to `mem_size` bytes in memory.
fn minimal_elf(vaddr: u32, payload: &[u8], mem_size: u32) -> Vec<u8> {
    const EHDR: u32 = 52;
    const PHDR: u32 = 32;

    let mut elf = Vec::new();
    elf.extend_from_slice(&[0x7F, b'E', b'L', b'F', 1, 1, 1, 0]);
    elf.extend_from_slice(&[0; 8]);
    elf.extend_from_slice(&2u16.to_le_bytes()); // ET_EXEC
    elf.extend_from_slice(&0xF3u16.to_le_bytes()); // EM_RISCV
    elf.extend_from_slice(&1u32.to_le_bytes());
    elf.extend_from_slice(&vaddr.to_le_bytes());
    elf.extend_from_slice(&EHDR.to_le_bytes());
    elf.extend_from_slice(&0u32.to_le_bytes());
    elf.extend_from_slice(&0u32.to_le_bytes());
    elf.extend_from_slice(&(EHDR as u16).to_le_bytes());
    elf.extend_from_slice(&(PHDR as u16).to_le_bytes());
    elf.extend_from_slice(&1u16.to_le_bytes());
    elf.extend_from_slice(&40u16.to_le_bytes());
    elf.extend_from_slice(&0u16.to_le_bytes());
    elf.extend_from_slice(&0u16.to_le_bytes());
    assert_eq!(elf.len(), EHDR as usize);

    let offset = EHDR + PHDR;
    elf.extend_from_slice(&1u32.to_le_bytes()); // PT_LOAD
    elf.extend_from_slice(&offset.to_le_bytes());
    elf.extend_from_slice(&vaddr.to_le_bytes());
    elf.extend_from_slice(&vaddr.to_le_bytes());
    elf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    elf.extend_from_slice(&mem_size.to_le_bytes());
    elf.extend_from_slice(&5u32.to_le_bytes());
    elf.extend_from_slice(&4u32.to_le_bytes());
    assert_eq!(elf.len(), offset as usize);

    elf.extend_from_slice(payload);
    elf
}

/// 64-bit little-endian RISC-V executable whose `PT_LOAD` segments carry no file data.
///
/// Each entry in `segments` is a `(vaddr, mem_size)` pair.
fn elf64_with_segments(segments: &[(u64, u64)]) -> Vec<u8> {
    const EHDR: u16 = 64;
    const PHDR: u16 = 56;

    let mut elf = Vec::new();
    elf.extend_from_slice(&[0x7F, b'E', b'L', b'F', 2, 1, 1, 0]);
    elf.extend_from_slice(&[0; 8]);
    elf.extend_from_slice(&2u16.to_le_bytes()); // ET_EXEC
    elf.extend_from_slice(&0xF3u16.to_le_bytes()); // EM_RISCV
    elf.extend_from_slice(&1u32.to_le_bytes());
    elf.extend_from_slice(&segments[0].0.to_le_bytes());
    elf.extend_from_slice(&u64::from(EHDR).to_le_bytes());
    elf.extend_from_slice(&0u64.to_le_bytes());
    elf.extend_from_slice(&0u32.to_le_bytes());
    elf.extend_from_slice(&EHDR.to_le_bytes());
    elf.extend_from_slice(&PHDR.to_le_bytes());
    elf.extend_from_slice(&(segments.len() as u16).to_le_bytes());
    elf.extend_from_slice(&64u16.to_le_bytes());
    elf.extend_from_slice(&0u16.to_le_bytes());
    elf.extend_from_slice(&0u16.to_le_bytes());
    assert_eq!(elf.len(), usize::from(EHDR));

    for &(vaddr, mem_size) in segments {
        elf.extend_from_slice(&1u32.to_le_bytes()); // PT_LOAD
        elf.extend_from_slice(&6u32.to_le_bytes());
        elf.extend_from_slice(&0u64.to_le_bytes());
        elf.extend_from_slice(&vaddr.to_le_bytes());
        elf.extend_from_slice(&vaddr.to_le_bytes());
        elf.extend_from_slice(&0u64.to_le_bytes());
        elf.extend_from_slice(&mem_size.to_le_bytes());
        elf.extend_from_slice(&8u64.to_le_bytes());
    }
    elf
}

#[test]
fn raw_image_used_verbatim() {
    let image = ProgramImage::from_bytes(vec![0x13, 0x00, 0x00, 0x00]).unwrap();
    assert_eq!(image.bytes(), &[0x13, 0x00, 0x00, 0x00]);
    assert_eq!(image.len(), 4);
    assert_eq!(image.base_address(), None);
}

#[test]
fn empty_image_rejected() {
    assert!(matches!(
        ProgramImage::from_bytes(Vec::new()),
        Err(SimError::EmptyImage)
    ));
}

#[test]
fn load_from_file() {
    let data: Vec<u8> = (0..1024).map(|i| (i % 256) as u8).collect();
    let file = create_temp_binary(&data);

    let image = ProgramImage::from_file(file.path()).unwrap();

    assert_eq!(image.bytes(), data.as_slice());
    assert_eq!(image.source(), Some(file.path()));
}

#[test]
fn empty_file_rejected() {
    let file = create_temp_binary(&[]);
    assert!(matches!(
        ProgramImage::from_file(file.path()),
        Err(SimError::EmptyImage)
    ));
}

#[test]
fn missing_file_reports_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("missing.bin");

    match ProgramImage::from_file(&path) {
        Err(SimError::Io { path: reported, .. }) => assert_eq!(reported, path),
        other => panic!("expected I/O error, got {other:?}"),
    }
}

#[test]
fn elf_segments_flattened_with_bss() {
    let payload = [0x13, 0x05, 0x10, 0x00, 0x6F, 0x00, 0x00, 0x00];
    let elf = minimal_elf(0x8000_0000, &payload, 16);

    let image = ProgramImage::from_bytes(elf).unwrap();

    assert_eq!(image.base_address(), Some(0x8000_0000));
    assert_eq!(image.len(), 16);
    assert_eq!(&image.bytes()[..8], &payload);
    assert_eq!(&image.bytes()[8..], &[0; 8]);
}

#[test]
fn elf_segment_wrapping_address_space_rejected() {
    let elf = elf64_with_segments(&[(0xFFFF_FFFF_FFFF_F000, 0x2000)]);
    assert!(matches!(
        ProgramImage::from_bytes(elf),
        Err(SimError::ImageTooLarge { .. })
    ));
}

#[test]
fn elf_segments_spanning_too_far_rejected() {
    let elf = elf64_with_segments(&[(0, 0x100), (0xFFFF_0000, 0x100)]);
    assert!(matches!(
        ProgramImage::from_bytes(elf),
        Err(SimError::ImageTooLarge { offset: 0, .. })
    ));
}

#[test]
fn elf64_bss_only_segments_flattened() {
    let elf = elf64_with_segments(&[(0x1000, 0x10), (0x1020, 0x8)]);
    let image = ProgramImage::from_bytes(elf).unwrap();
    assert_eq!(image.base_address(), Some(0x1000));
    assert_eq!(image.bytes(), &[0u8; 0x28][..]);
}

#[test]
fn truncated_elf_rejected() {
    let mut elf = minimal_elf(0x1000, &[1, 2, 3, 4], 4);
    elf.truncate(20);

    assert!(matches!(
        ProgramImage::from_bytes(elf),
        Err(SimError::Elf(_))
    ));
}

#[test]
fn load_into_places_bytes_little_endian() {
    let image = ProgramImage::from_bytes(vec![0x11, 0x22, 0x33, 0x44, 0x55]).unwrap();
    let mut memory = MemoryModel::new(64);

    image.load_into(&mut memory, 6).unwrap();

    assert_eq!(memory.read(1), 0x2211_0000);
    assert_eq!(memory.read(2), 0x0055_4433);
}

#[test]
fn oversized_image_rejected_without_partial_write() {
    let image = ProgramImage::from_bytes(vec![0xFF; 60]).unwrap();
    let mut memory = MemoryModel::new(64);

    let err = image.load_into(&mut memory, 8).unwrap_err();

    assert!(matches!(
        err,
        SimError::ImageTooLarge {
            len: 60,
            offset: 8,
            capacity: 64
        }
    ));
    assert_eq!(memory.read(2), 0);
}

#[test]
fn ddr_filled_from_image_by_default() {
    let image = ProgramImage::from_bytes((1u8..=8).collect()).unwrap();
    let config = DdrConfig {
        enabled: true,
        size_bytes: 32,
        file_offset: 4,
        ..DdrConfig::default()
    };

    let ddr = build_ddr(&config, &image).unwrap();

    assert_eq!(ddr.len(), 32);
    assert_eq!(ddr.read_u32(0), 0);
    assert_eq!(ddr.read_u32(4), u32::from_le_bytes([1, 2, 3, 4]));
    assert_eq!(ddr.read_u32(8), u32::from_le_bytes([5, 6, 7, 8]));
}

#[test]
fn ddr_separate_file_truncated() {
    let image = ProgramImage::from_bytes(vec![0xEE; 8]).unwrap();
    let file = create_temp_binary(&[0xA1, 0xA2, 0xA3, 0xA4, 0xA5, 0xA6, 0xA7, 0xA8]);
    let config = DdrConfig {
        enabled: true,
        init_file: Some(file.path().to_path_buf()),
        num_bytes: Some(6),
        size_bytes: 16,
        ..DdrConfig::default()
    };

    let ddr = build_ddr(&config, &image).unwrap();

    assert_eq!(ddr.read_u32(0), 0xA4A3_A2A1);
    assert_eq!(ddr.read_u32(4), 0x0000_A6A5);
}

#[test]
fn ddr_rejects_contents_past_end() {
    let image = ProgramImage::from_bytes(vec![0; 16]).unwrap();
    let config = DdrConfig {
        enabled: true,
        size_bytes: 16,
        file_offset: 4,
        ..DdrConfig::default()
    };

    assert!(matches!(
        build_ddr(&config, &image),
        Err(SimError::ImageTooLarge { .. })
    ));
}
