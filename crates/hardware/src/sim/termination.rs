//! Program termination detection.
//!
//! Termination is signalled by sentinel instructions at retirement:
//! 1. **Error:** The error sentinel ends the run on the cycle it retires, whatever the
//!    state of the store queue.
//! 2. **Success:** The success sentinel latches `program_complete`. The run ends on the
//!    first cycle, this one or later, where the store queue is also empty. The sentinel
//!    does not need to retire again while the queue drains.

use serde::Serialize;

use crate::dut::Retirement;
use crate::sentinel::Sentinel;

/// How a program terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Termination {
    /// The error sentinel retired.
    Error,
    /// The success sentinel retired and the store queue drained.
    Success,
}

/// Sentinel-driven termination state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TerminationDetector {
    program_complete: bool,
}

impl TerminationDetector {
    /// Creates a detector with no success latched.
    pub const fn new() -> Self {
        Self {
            program_complete: false,
        }
    }

    /// Evaluates one cycle's retirements and store-queue state.
    pub fn evaluate(
        &mut self,
        retirement: Retirement<'_>,
        store_queue_empty: bool,
    ) -> Option<Termination> {
        if retirement.retired(Sentinel::ErrorTerminate) {
            return Some(Termination::Error);
        }
        self.program_complete |= retirement.retired(Sentinel::SuccessTerminate);
        (self.program_complete && store_queue_empty).then_some(Termination::Success)
    }

    /// True once the success sentinel has retired.
    pub const fn program_complete(&self) -> bool {
        self.program_complete
    }

    /// Forgets any latched success.
    pub const fn reset(&mut self) {
        self.program_complete = false;
    }
}
