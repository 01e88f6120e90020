//! Benchmark-region event statistics.
//!
//! This module accumulates hardware event counters for the region of a program
//! bracketed by sentinel instructions. It provides:
//! 1. **Counter table:** Named counters index-aligned with the model's event vector.
//! 2. **Region gating:** A two-state machine (collecting / idle) driven by three sentinels.
//! 3. **Reporting:** Read-only access and a plain-text table.

use serde::Serialize;

use crate::dut::Retirement;
use crate::sentinel::Sentinel;

/// Event names used when the configuration does not supply its own list.
pub const DEFAULT_EVENT_NAMES: &[&str] = &[
    "operand_stall",
    "unit_stall",
    "no_id_stall",
    "no_instruction_stall",
    "other_stall",
    "instruction_issued_dec",
    "branch_operand_stall",
    "alu_operand_stall",
    "ls_operand_stall",
    "div_operand_stall",
    "alu_op",
    "branch_or_jump_op",
    "load_op",
    "store_op",
    "mul_op",
    "div_op",
    "misc_op",
    "branch_correct",
    "branch_misspredict",
    "return_correct",
    "return_misspredict",
    "load_conflict_delay",
    "rs1_forwarding_needed",
    "rs2_forwarding_needed",
    "rs1_and_rs2_forwarding_needed",
];

/// Ordered named counters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EventCounters {
    names: Vec<String>,
    counts: Vec<u64>,
}

impl EventCounters {
    /// Creates a zeroed table with one counter per name.
    pub fn new(names: Vec<String>) -> Self {
        let counts = vec![0; names.len()];
        Self { names, counts }
    }

    /// Number of counters.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    /// True if the table has no counters.
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Zeroes every counter.
    pub fn reset(&mut self) {
        self.counts.fill(0);
    }

    /// Adds an event vector element-wise.
    pub fn accumulate(&mut self, events: &[u32]) {
        for (count, &event) in self.counts.iter_mut().zip(events) {
            *count += u64::from(event);
        }
    }

    /// Counter names in table order.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Counter values in table order.
    pub fn counts(&self) -> &[u64] {
        &self.counts
    }

    /// Looks a counter up by name.
    pub fn get(&self, name: &str) -> Option<u64> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| self.counts[i])
    }

    /// Iterates `(name, count)` pairs in table order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, u64)> + '_ {
        self.names
            .iter()
            .map(String::as_str)
            .zip(self.counts.iter().copied())
    }

    /// Prints the table to stdout.
    pub fn print(&self) {
        let width = self.names.iter().map(String::len).max().unwrap_or(0).max(24);
        println!("\n==========================================================");
        println!("EVENT COUNTERS");
        println!("----------------------------------------------------------");
        for (name, count) in self.iter() {
            println!("  {name:<width$} {count}");
        }
        println!("==========================================================");
    }
}

/// Whether counters are currently accumulating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum Collection {
    /// Outside a benchmark region.
    #[default]
    Idle,
    /// Inside a benchmark region.
    Collecting,
}

/// One row of the region transition table.
#[derive(Debug, Clone, Copy)]
struct Transition {
    trigger: Sentinel,
    reset: bool,
    next: Collection,
}

/// Region transitions in precedence order; the first trigger that retired wins.
const TRANSITIONS: [Transition; 3] = [
    Transition {
        trigger: Sentinel::StatsStart,
        reset: true,
        next: Collection::Collecting,
    },
    Transition {
        trigger: Sentinel::StatsResume,
        reset: false,
        next: Collection::Collecting,
    },
    Transition {
        trigger: Sentinel::StatsEnd,
        reset: false,
        next: Collection::Idle,
    },
];

/// Gated event accumulator.
#[derive(Debug, Clone)]
pub struct StatsCollector {
    counters: EventCounters,
    mode: Collection,
}

impl StatsCollector {
    /// Creates an idle collector over the named counters.
    ///
    /// # Arguments
    ///
    /// * `names` - Counter names, index-aligned with the model's event vector.
    ///
    /// # Returns
    ///
    /// A collector that accumulates nothing until a region-start sentinel retires.
    pub fn new(names: Vec<String>) -> Self {
        Self {
            counters: EventCounters::new(names),
            mode: Collection::Idle,
        }
    }

    /// Applies this cycle's region transition, then accumulates if collecting.
    ///
    /// Returns the sentinel that drove a transition, if any.
    pub fn update(&mut self, retirement: Retirement<'_>, events: &[u32]) -> Option<Sentinel> {
        let fired = TRANSITIONS.iter().find(|t| retirement.retired(t.trigger));
        if let Some(transition) = fired {
            if transition.reset {
                self.counters.reset();
            }
            tracing::debug!(
                sentinel = %transition.trigger,
                from = ?self.mode,
                to = ?transition.next,
                "stats region transition"
            );
            self.mode = transition.next;
        }
        if self.mode == Collection::Collecting {
            self.counters.accumulate(events);
        }
        fired.map(|t| t.trigger)
    }

    /// Zeroes the counters and leaves any region.
    pub fn reset(&mut self) {
        self.counters.reset();
        self.mode = Collection::Idle;
    }

    /// True inside a benchmark region.
    pub fn collecting(&self) -> bool {
        self.mode == Collection::Collecting
    }

    /// Current region state.
    pub const fn mode(&self) -> Collection {
        self.mode
    }

    /// The accumulated counters.
    pub const fn counters(&self) -> &EventCounters {
        &self.counters
    }
}
