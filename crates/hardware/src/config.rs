//! Configuration system for the co-simulation driver.
//!
//! This module defines the configuration structures used to parameterize a run. It provides:
//! 1. **Defaults:** Baseline constants (reset length, stall budget, memory size, DDR timing).
//! 2. **Structures:** Hierarchical config for general, memory, DDR, UART, and event settings.
//! 3. **Loading:** JSON parsing and validation before the first tick.
//!
//! Every field has a default, so `{}` is a valid configuration.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::common::{SimError, SimResult, WORD_BYTES};
use crate::stats::DEFAULT_EVENT_NAMES;

/// Default configuration constants.
mod defaults {
    /// Cycles the reset line is held before release.
    pub const RESET_CYCLES: u64 = 64;

    /// Consecutive cycles without retirement before a stall is reported.
    pub const STALL_LIMIT: u64 = 2000;

    /// Size of the local instruction/data memory (128 KiB).
    pub const MEMORY_SIZE: usize = 128 * 1024;

    /// Size of the peripheral-side DDR store (1 MiB).
    pub const DDR_SIZE: usize = 1024 * 1024;

    /// Fixed latency of the simple DDR controller, in steps.
    pub const DDR_LATENCY: u64 = 4;

    /// CAS latency in steps.
    pub const T_CAS: u64 = 14;

    /// RAS latency in steps.
    pub const T_RAS: u64 = 14;

    /// Precharge latency in steps.
    pub const T_PRE: u64 = 14;

    /// DRAM row size in bytes.
    pub const ROW_BYTES: u64 = 2048;
}

/// Root configuration.
///
/// # Examples
///
/// ```
/// use cosim_core::config::{Config, DdrTiming};
///
/// let config = Config::from_json(r#"{
///     "general": { "stall_limit": 1000, "max_cycles": 500000 },
///     "memory": { "size_bytes": 65536 },
///     "ddr": { "enabled": true, "controller": "Dram" }
/// }"#).unwrap();
///
/// assert_eq!(config.general.stall_limit, 1000);
/// assert_eq!(config.general.reset_cycles, 64);
/// assert_eq!(config.ddr.controller, DdrTiming::Dram);
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Clocking and verdict settings.
    pub general: GeneralConfig,
    /// Local memory model settings.
    pub memory: MemoryConfig,
    /// Peripheral-side memory settings.
    pub ddr: DdrConfig,
    /// UART capture settings.
    pub uart: UartConfig,
    /// Event counter names, index-aligned with the model's event vector.
    pub events: Option<Vec<String>>,
}

impl Config {
    /// Parses and validates a JSON configuration.
    ///
    /// # Arguments
    ///
    /// * `json` - Configuration text; omitted sections and fields take their defaults.
    ///
    /// # Returns
    ///
    /// The configuration, `SimError::Json` if it does not parse, or
    /// `SimError::InvalidConfig` if validation fails.
    pub fn from_json(json: &str) -> SimResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses, and validates a JSON configuration file.
    pub fn from_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
        Self::from_json(&json)
    }

    /// Rejects values that would make the run meaningless.
    pub fn validate(&self) -> SimResult<()> {
        if self.memory.size_bytes < WORD_BYTES || self.memory.size_bytes % WORD_BYTES != 0 {
            return Err(SimError::InvalidConfig(format!(
                "memory.size_bytes must be a non-zero multiple of {WORD_BYTES}, got {}",
                self.memory.size_bytes
            )));
        }
        if self.ddr.enabled && self.ddr.size_bytes == 0 {
            return Err(SimError::InvalidConfig("ddr.size_bytes must be non-zero".into()));
        }
        if let Some(names) = &self.events {
            if names.is_empty() {
                return Err(SimError::InvalidConfig("events must name at least one counter".into()));
            }
        }
        Ok(())
    }

    /// Event counter names, falling back to the built-in list.
    pub fn event_names(&self) -> Vec<String> {
        self.events.clone().unwrap_or_else(|| {
            DEFAULT_EVENT_NAMES.iter().map(|s| (*s).to_string()).collect()
        })
    }
}

/// Clocking and verdict settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct GeneralConfig {
    /// Cycles the reset line is held before release.
    #[serde(default = "GeneralConfig::default_reset_cycles")]
    pub reset_cycles: u64,

    /// Stall budget in cycles; a stall is reported when the count first exceeds it.
    #[serde(default = "GeneralConfig::default_stall_limit")]
    pub stall_limit: u64,

    /// Hard cap on cycles per run, independent of retirement activity.
    #[serde(default)]
    pub max_cycles: Option<u64>,
}

impl GeneralConfig {
    const fn default_reset_cycles() -> u64 {
        defaults::RESET_CYCLES
    }

    const fn default_stall_limit() -> u64 {
        defaults::STALL_LIMIT
    }
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            reset_cycles: defaults::RESET_CYCLES,
            stall_limit: defaults::STALL_LIMIT,
            max_cycles: None,
        }
    }
}

/// Local memory model settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryConfig {
    /// Size in bytes; must be a multiple of the word size.
    #[serde(default = "MemoryConfig::default_size")]
    pub size_bytes: usize,

    /// Byte offset at which the program image is placed.
    #[serde(default)]
    pub load_offset: u64,
}

impl MemoryConfig {
    const fn default_size() -> usize {
        defaults::MEMORY_SIZE
    }
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            size_bytes: defaults::MEMORY_SIZE,
            load_offset: 0,
        }
    }
}

/// Latency model used by the DDR peripheral.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub enum DdrTiming {
    /// Fixed latency per request.
    #[default]
    Simple,
    /// Row-buffer model with CAS, RAS, and precharge latencies.
    #[serde(alias = "DRAM")]
    Dram,
}

/// Peripheral-side memory settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DdrConfig {
    /// Attach a DDR model to the peripheral slot.
    #[serde(default)]
    pub enabled: bool,

    /// Separate backing file; when absent the program image is reused.
    #[serde(default)]
    pub init_file: Option<PathBuf>,

    /// Byte address at which the store is mapped.
    #[serde(default)]
    pub base: u64,

    /// Byte offset within the store where the contents are placed.
    #[serde(default)]
    pub file_offset: u64,

    /// Truncate the loaded contents to this many bytes.
    #[serde(default)]
    pub num_bytes: Option<usize>,

    /// Store size in bytes.
    #[serde(default = "DdrConfig::default_size")]
    pub size_bytes: usize,

    /// Latency model.
    #[serde(default)]
    pub controller: DdrTiming,

    /// Fixed latency for [`DdrTiming::Simple`].
    #[serde(default = "DdrConfig::default_latency")]
    pub latency: u64,

    /// CAS latency for [`DdrTiming::Dram`].
    #[serde(default = "DdrConfig::default_t_cas")]
    pub t_cas: u64,

    /// RAS latency for [`DdrTiming::Dram`].
    #[serde(default = "DdrConfig::default_t_ras")]
    pub t_ras: u64,

    /// Precharge latency for [`DdrTiming::Dram`].
    #[serde(default = "DdrConfig::default_t_pre")]
    pub t_pre: u64,

    /// Row size in bytes for [`DdrTiming::Dram`].
    #[serde(default = "DdrConfig::default_row_bytes")]
    pub row_bytes: u64,
}

impl DdrConfig {
    const fn default_size() -> usize {
        defaults::DDR_SIZE
    }
    const fn default_latency() -> u64 {
        defaults::DDR_LATENCY
    }
    const fn default_t_cas() -> u64 {
        defaults::T_CAS
    }
    const fn default_t_ras() -> u64 {
        defaults::T_RAS
    }
    const fn default_t_pre() -> u64 {
        defaults::T_PRE
    }
    const fn default_row_bytes() -> u64 {
        defaults::ROW_BYTES
    }
}

impl Default for DdrConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            init_file: None,
            base: 0,
            file_offset: 0,
            num_bytes: None,
            size_bytes: defaults::DDR_SIZE,
            controller: DdrTiming::Simple,
            latency: defaults::DDR_LATENCY,
            t_cas: defaults::T_CAS,
            t_ras: defaults::T_RAS,
            t_pre: defaults::T_PRE,
            row_bytes: defaults::ROW_BYTES,
        }
    }
}

/// UART capture settings.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UartConfig {
    /// Append every captured byte to this file.
    #[serde(default)]
    pub log_file: Option<PathBuf>,

    /// Echo captured bytes to stdout as they arrive.
    #[serde(default = "UartConfig::default_echo")]
    pub echo: bool,
}

impl UartConfig {
    const fn default_echo() -> bool {
        true
    }
}

impl Default for UartConfig {
    fn default() -> Self {
        Self {
            log_file: None,
            echo: true,
        }
    }
}
