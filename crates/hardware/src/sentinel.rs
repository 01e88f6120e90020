//! Reserved sentinel instruction encodings.
//!
//! Test programs signal the driver out-of-band by retiring `addi x0, x0, imm` with a
//! reserved immediate. Normal code never produces these words: writes to `x0` with a
//! non-zero immediate are architecturally dead and compilers do not emit them.
//!
//! The table is fixed at build time and shared read-only by the termination detector
//! and the statistics collector.

use std::fmt;

/// Action signalled by a sentinel instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Sentinel {
    /// The program failed; stop immediately.
    ErrorTerminate,
    /// The program finished; stop once the store queue drains.
    SuccessTerminate,
    /// Zero the event counters and begin a benchmark region.
    StatsStart,
    /// Continue accumulating into the existing counters.
    StatsResume,
    /// Stop accumulating.
    StatsEnd,
}

/// Every sentinel paired with its instruction word.
pub const SENTINEL_TABLE: [(Sentinel, u32); 5] = [
    (Sentinel::SuccessTerminate, 0x00A0_0013),
    (Sentinel::StatsStart, 0x00C0_0013),
    (Sentinel::StatsEnd, 0x00D0_0013),
    (Sentinel::StatsResume, 0x00E0_0013),
    (Sentinel::ErrorTerminate, 0x00F0_0013),
];

impl Sentinel {
    /// Returns the reserved instruction word for this sentinel.
    pub const fn encoding(self) -> u32 {
        match self {
            Self::SuccessTerminate => 0x00A0_0013,
            Self::StatsStart => 0x00C0_0013,
            Self::StatsEnd => 0x00D0_0013,
            Self::StatsResume => 0x00E0_0013,
            Self::ErrorTerminate => 0x00F0_0013,
        }
    }

    /// Maps an instruction word back to its sentinel, if it is one.
    pub fn decode(word: u32) -> Option<Self> {
        SENTINEL_TABLE
            .iter()
            .find(|(_, encoding)| *encoding == word)
            .map(|(sentinel, _)| *sentinel)
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::ErrorTerminate => "ERROR_TERMINATE",
            Self::SuccessTerminate => "SUCCESS_TERMINATE",
            Self::StatsStart => "STATS_START",
            Self::StatsResume => "STATS_RESUME",
            Self::StatsEnd => "STATS_END",
        };
        write!(f, "{name} ({:#010x})", self.encoding())
    }
}
