//! DDR Peripheral Unit Tests.
//!
//! Verifies request acceptance, latency from the memory controller, the
//! one-step response window, and byte-strobed writes.

use cosim_core::peripheral::{DdrModel, DdrPort, DdrRequest, DdrResponse, Idle, Peripheral};
use mockall::predicate::eq;

use crate::common::mocks::controller::{FixedController, MockController};

fn read(addr: u64) -> DdrRequest {
    DdrRequest {
        addr,
        data: 0,
        strobe: 0,
    }
}

fn loaded(latency: u64) -> DdrModel {
    let mut ddr = DdrModel::new(64, 0, Box::new(FixedController::new(latency)));
    ddr.load(&(0u8..32).collect::<Vec<_>>(), 0).unwrap();
    ddr
}

#[test]
fn controller_consulted_once_per_request() {
    let mut controller = MockController::new();
    controller
        .expect_access_latency()
        .with(eq(0x40))
        .times(1)
        .return_const(3u64);
    let mut ddr = DdrModel::new(128, 0, Box::new(controller));
    let mut port = DdrPort {
        request: Some(read(0x40)),
        response: None,
    };

    for _ in 0..6 {
        ddr.step(Some(&mut port));
    }

    assert_eq!(ddr.completed(), 1);
}

#[test]
fn response_after_latency_for_one_step() {
    let mut ddr = loaded(3);
    let mut port = DdrPort {
        request: Some(read(4)),
        response: None,
    };

    ddr.step(Some(&mut port));
    assert!(port.request.is_none());
    assert!(ddr.busy());

    ddr.step(Some(&mut port));
    ddr.step(Some(&mut port));
    assert!(port.response.is_none());

    ddr.step(Some(&mut port));
    assert_eq!(
        port.response,
        Some(DdrResponse {
            addr: 4,
            data: u32::from_le_bytes([4, 5, 6, 7]),
        })
    );
    assert!(!ddr.busy());

    ddr.step(Some(&mut port));
    assert!(port.response.is_none());
}

#[test]
fn zero_latency_still_takes_a_step() {
    let mut ddr = loaded(0);
    let mut port = DdrPort {
        request: Some(read(0)),
        response: None,
    };

    ddr.step(Some(&mut port));
    assert!(port.response.is_none());
    ddr.step(Some(&mut port));
    assert!(port.response.is_some());
}

#[test]
fn second_request_waits_for_first() {
    let mut ddr = loaded(2);
    let mut port = DdrPort {
        request: Some(read(0)),
        response: None,
    };

    ddr.step(Some(&mut port));
    port.request = Some(read(8));
    ddr.step(Some(&mut port));
    assert_eq!(port.request, Some(read(8)));

    ddr.step(Some(&mut port));
    assert_eq!(port.response.map(|r| r.addr), Some(0));
    assert_eq!(port.request, Some(read(8)));

    ddr.step(Some(&mut port));
    assert!(port.request.is_none());
}

#[test]
fn write_applies_strobe_and_returns_old_data() {
    let mut ddr = loaded(1);
    let mut port = DdrPort {
        request: Some(DdrRequest {
            addr: 8,
            data: 0xAABB_CCDD,
            strobe: 0b0101,
        }),
        response: None,
    };

    ddr.step(Some(&mut port));
    ddr.step(Some(&mut port));

    assert_eq!(port.response.map(|r| r.data), Some(u32::from_le_bytes([8, 9, 10, 11])));
    assert_eq!(ddr.read_u32(8), u32::from_le_bytes([0xDD, 9, 0xBB, 11]));
}

#[test]
fn base_address_offsets_store() {
    let mut ddr = DdrModel::new(16, 0x8000_0000, Box::new(FixedController::new(1)));
    ddr.write_u32(0x8000_0004, 0x1234_5678, 0b1111);
    assert_eq!(ddr.read_u32(0x8000_0004), 0x1234_5678);
    assert_eq!(ddr.read_u32(0x4), 0);
    assert_eq!(ddr.read_u32(0x8000_000D), 0);
}

#[test]
fn load_rejects_overflow() {
    let mut ddr = DdrModel::new(8, 0, Box::new(FixedController::new(1)));
    assert!(ddr.load(&[0; 4], 6).is_err());
    assert!(ddr.load(&[0; 4], 4).is_ok());
}

#[test]
fn no_port_means_no_work() {
    let mut ddr = loaded(1);
    ddr.step(None);
    assert!(!ddr.busy());
    assert_eq!(ddr.completed(), 0);
}

#[test]
fn idle_peripheral_leaves_port_alone() {
    let mut port = DdrPort {
        request: Some(read(0)),
        response: None,
    };
    Idle.step(Some(&mut port));
    assert_eq!(port.request, Some(read(0)));
}
