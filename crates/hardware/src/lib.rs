//! Cycle-accurate co-simulation driver library.
//!
//! This crate clocks an opaque processor model against the environment it expects to see:
//! 1. **DUT:** The fixed signal surface any model implements, plus a trace-replay model.
//! 2. **Memory:** A word-addressed store served through one-cycle registered reads.
//! 3. **Peripherals:** A DDR model stepped once per cycle behind a request/response port.
//! 4. **Verdicts:** Sentinel-instruction termination and a stall watchdog.
//! 5. **Statistics:** Event counters gated by sentinel-bracketed benchmark regions.
//! 6. **Simulation:** Configuration, program loading, the tick loop, and run reports.

/// Common types and constants (errors, bus widths, clock phases).
pub mod common;
/// Driver configuration (defaults, hierarchical config structures, validation).
pub mod config;
/// Device-under-test signal surface and the trace-replay model.
pub mod dut;
/// Local memory model and registered-read service.
pub mod memory;
/// Peripheral stepping and the DDR model.
pub mod peripheral;
/// Reserved sentinel instruction encodings.
pub mod sentinel;
/// Driver, verdicts, loader, and reports.
pub mod sim;
/// Benchmark-region event counters.
pub mod stats;
/// UART capture sink.
pub mod uart;

/// Root configuration type; use `Config::default()` or parse from JSON.
pub use crate::config::Config;
/// Signal surface implemented by processor models.
pub use crate::dut::DeviceUnderTest;
/// The per-cycle driver.
pub use crate::sim::SimulationDriver;
