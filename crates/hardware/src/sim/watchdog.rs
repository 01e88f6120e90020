//! Stall watchdog.
//!
//! Counts consecutive cycles in which nothing retired. Any retirement clears the count,
//! whatever the number of instructions. When the count first exceeds the limit the
//! watchdog trips once and starts counting again from zero.

/// Consecutive-idle-cycle counter with a trip limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StallWatchdog {
    limit: u64,
    count: u64,
}

impl StallWatchdog {
    /// Creates a watchdog that trips after more than `limit` idle cycles.
    pub const fn new(limit: u64) -> Self {
        Self { limit, count: 0 }
    }

    /// Records one cycle. Returns `true` on the cycle the watchdog trips.
    pub const fn observe(&mut self, progress: bool) -> bool {
        if progress {
            self.count = 0;
            return false;
        }
        self.count += 1;
        if self.count > self.limit {
            self.count = 0;
            return true;
        }
        false
    }

    /// Clears the idle count.
    pub const fn reset(&mut self) {
        self.count = 0;
    }

    /// Current idle count.
    pub const fn count(&self) -> u64 {
        self.count
    }

    /// Configured limit.
    pub const fn limit(&self) -> u64 {
        self.limit
    }
}
