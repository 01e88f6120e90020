//! Terminal verdicts of a run.

use std::fmt;

use serde::Serialize;

/// Why `run_until` returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StopReason {
    /// Success sentinel retired and the store queue drained.
    Success,
    /// Error sentinel retired.
    Error,
    /// No instruction retired for longer than the stall limit.
    Stall,
    /// The configured cycle cap was reached.
    CycleLimit,
    /// The caller's stop predicate returned true.
    Predicate,
}

impl StopReason {
    /// True for [`StopReason::Success`].
    pub const fn is_success(self) -> bool {
        matches!(self, Self::Success)
    }

    /// True for outcomes that count as a failed run.
    ///
    /// A caller-requested stop is neither success nor failure.
    pub const fn is_failure(self) -> bool {
        matches!(self, Self::Error | Self::Stall | Self::CycleLimit)
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Self::Success => "success",
            Self::Error => "error sentinel",
            Self::Stall => "stall",
            Self::CycleLimit => "cycle limit",
            Self::Predicate => "stopped by caller",
        };
        f.write_str(text)
    }
}

/// Result of a `run_until` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RunOutcome {
    /// Terminal reason.
    pub reason: StopReason,
    /// Monotonic half-phase counter at the time of return.
    pub cycle_count: u64,
    /// Ticks since reset was last released.
    pub cycles: u64,
}
