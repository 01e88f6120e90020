//! Access-latency models for the peripheral-side memory.
//!
//! This module provides:
//! 1. **SimpleController:** Every request completes after the same number of steps.
//! 2. **DramController:** Row-buffer-aware latency (CAS, RAS, precharge).

use crate::config::{DdrConfig, DdrTiming};

/// Reports how many peripheral steps a request to `addr` takes to complete.
pub trait MemoryController {
    /// Returns the latency in steps for an access to the given byte address.
    ///
    /// May update internal state (e.g. which DRAM row is open).
    fn access_latency(&mut self, addr: u64) -> u64;
}

/// Builds the controller selected by the configuration.
///
/// # Arguments
///
/// * `config` - DDR section; `controller` picks the model and the `t_*` fields its timing.
///
/// # Returns
///
/// A boxed `SimpleController` or `DramController`.
pub fn from_config(config: &DdrConfig) -> Box<dyn MemoryController> {
    match config.controller {
        DdrTiming::Simple => Box::new(SimpleController::new(config.latency)),
        DdrTiming::Dram => Box::new(DramController::new(
            config.t_cas,
            config.t_ras,
            config.t_pre,
            config.row_bytes,
        )),
    }
}

/// Fixed-latency controller.
#[derive(Debug, Clone)]
pub struct SimpleController {
    latency: u64,
}

impl SimpleController {
    /// Creates a controller where every access takes `latency` steps.
    pub const fn new(latency: u64) -> Self {
        Self { latency }
    }
}

impl MemoryController for SimpleController {
    fn access_latency(&mut self, _addr: u64) -> u64 {
        self.latency
    }
}

/// DRAM-style controller that tracks the open row.
///
/// A hit on the open row costs `t_cas`; opening a row on an idle bank costs
/// `t_ras + t_cas`; switching rows adds a precharge on top.
#[derive(Debug, Clone)]
pub struct DramController {
    open_row: Option<u64>,
    t_cas: u64,
    t_ras: u64,
    t_pre: u64,
    row_shift: u32,
}

impl DramController {
    /// Creates a controller with no row open.
    ///
    /// # Arguments
    ///
    /// * `t_cas` - Column access latency.
    /// * `t_ras` - Row activation latency.
    /// * `t_pre` - Precharge latency.
    /// * `row_bytes` - Row size; rounded up to a power of two.
    pub fn new(t_cas: u64, t_ras: u64, t_pre: u64, row_bytes: u64) -> Self {
        Self {
            open_row: None,
            t_cas,
            t_ras,
            t_pre,
            row_shift: row_bytes.max(1).next_power_of_two().trailing_zeros(),
        }
    }
}

impl MemoryController for DramController {
    fn access_latency(&mut self, addr: u64) -> u64 {
        let row = addr >> self.row_shift;
        match self.open_row.replace(row) {
            Some(open) if open == row => self.t_cas,
            Some(_) => self.t_pre + self.t_ras + self.t_cas,
            None => self.t_ras + self.t_cas,
        }
    }
}
