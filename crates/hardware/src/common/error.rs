//! Configuration-time error definitions.
//!
//! Everything that can go wrong before the first tick is reported through [`SimError`]:
//! 1. **Image errors:** Unreadable, empty, malformed, or oversized program images.
//! 2. **Configuration errors:** Unparseable JSON or values that fail validation.
//! 3. **Wiring errors:** A device-under-test whose event vector does not match the counter table.
//!
//! The per-cycle loop never returns errors; terminal conditions are polled verdicts
//! (see [`StopReason`](crate::sim::StopReason)).

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building or configuring a simulation.
#[derive(Debug, Error)]
pub enum SimError {
    /// A file could not be opened, read, or written.
    #[error("could not access '{path}': {source}")]
    Io {
        /// Path of the file that failed.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The program image contains no bytes.
    #[error("program image is empty")]
    EmptyImage,

    /// The image does not fit in the target store at the requested offset.
    #[error("image of {len} bytes at offset {offset:#x} exceeds store capacity of {capacity} bytes")]
    ImageTooLarge {
        /// Image length in bytes.
        len: usize,
        /// Load offset in bytes.
        offset: u64,
        /// Capacity of the target store in bytes.
        capacity: usize,
    },

    /// The image looked like an ELF file but could not be parsed.
    #[error("malformed ELF image: {0}")]
    Elf(#[from] object::read::Error),

    /// A configuration, trace, or report document could not be (de)serialized.
    #[error("malformed JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// The configuration parsed but holds an unusable value.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The DUT exposes a different number of event signals than there are counters.
    #[error("event vector width mismatch: {counters} counters but the model drives {signals} signals")]
    EventWidthMismatch {
        /// Number of named counters.
        counters: usize,
        /// Number of event signals exposed by the model.
        signals: usize,
    },
}

impl SimError {
    /// Wraps an I/O error together with the path that caused it.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result alias used by every fallible configuration-time operation.
pub type SimResult<T> = Result<T, SimError>;
