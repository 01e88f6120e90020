//! Peripheral models stepped alongside the processor.
//!
//! The driver steps exactly one peripheral once per tick, after the clock edge and
//! before statistics, UART, and memory service. This module provides:
//! 1. **Peripheral:** The stepping interface.
//! 2. **Idle:** A peripheral that does nothing, for models without an external bus.
//! 3. **DdrModel:** A peripheral-side memory behind a request/response port with modeled latency.

/// Access-latency models for the DDR peripheral.
pub mod controller;

/// Peripheral-side memory model.
pub mod ddr;

pub use controller::{DramController, MemoryController, SimpleController};
pub use ddr::{DdrModel, DdrPort, DdrRequest, DdrResponse};

/// An auxiliary model advanced once per simulated cycle.
pub trait Peripheral {
    /// Advances the peripheral by one step.
    ///
    /// `port` is the model's bus port, or `None` if the model has no such port.
    fn step(&mut self, port: Option<&mut DdrPort>);
}

/// Peripheral that never responds.
#[derive(Debug, Default, Clone, Copy)]
pub struct Idle;

impl Peripheral for Idle {
    fn step(&mut self, _port: Option<&mut DdrPort>) {}
}
