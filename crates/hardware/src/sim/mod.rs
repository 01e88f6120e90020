//! Simulation driver and run lifecycle.
//!
//! This module ties the device-under-test to its environment. It provides:
//! 1. **Driver:** The per-cycle clocking and servicing loop.
//! 2. **Verdicts:** Sentinel termination and the stall watchdog.
//! 3. **Loading:** Program images for local memory and the DDR peripheral.
//! 4. **Reporting:** Outcome, counters, and UART capture of a finished run.

/// Per-cycle driver.
pub mod driver;

/// Program image loading.
pub mod loader;

/// Terminal reasons.
pub mod outcome;

/// End-of-run report.
pub mod report;

/// Sentinel-driven termination.
pub mod termination;

/// Stall watchdog.
pub mod watchdog;

pub use driver::{SimulationDriver, SimulationState};
pub use loader::ProgramImage;
pub use outcome::{RunOutcome, StopReason};
pub use report::RunReport;
pub use termination::{Termination, TerminationDetector};
pub use watchdog::StallWatchdog;
