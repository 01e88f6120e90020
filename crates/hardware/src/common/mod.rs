//! Common utilities and types used throughout the co-simulation driver.
//!
//! This module provides the building blocks shared by every component:
//! 1. **Constants:** Bus widths, image magic numbers, and clock-phase counts.
//! 2. **Error Handling:** Configuration-time errors and the `SimResult` alias.

/// Common constants used throughout the driver.
pub mod constants;

/// Error types for configuration-time failures.
pub mod error;

pub use constants::{BYTE_ENABLE_ALL, PHASES_PER_CYCLE, WORD_BYTES};
pub use error::{SimError, SimResult};
