//! Co-simulation driver.
//!
//! `SimulationDriver` owns the device-under-test and everything the model talks to,
//! and advances them together one clock cycle at a time. Each [`tick`] performs:
//! 1. **Clocking:** Clock high, eval; clock low, eval; clock high, eval. The counter
//!    advances by one on each of the first two phases. The third eval lets the
//!    verdict logic observe post-edge values.
//! 2. **Peripheral:** The attached peripheral is stepped exactly once.
//! 3. **Statistics:** Sentinel region transitions, then event accumulation.
//! 4. **UART:** A strobed byte is forwarded to the sink.
//! 5. **Memory:** Both interfaces are serviced through their output registers.
//! 6. **Verdicts:** Termination and the stall watchdog are evaluated and held
//!    until the next tick.
//!
//! [`tick`]: SimulationDriver::tick

use std::fmt;

use serde::Serialize;

use super::loader::{ProgramImage, build_ddr};
use super::outcome::{RunOutcome, StopReason};
use super::report::RunReport;
use super::termination::{Termination, TerminationDetector};
use super::watchdog::StallWatchdog;
use crate::common::{PHASES_PER_CYCLE, SimError, SimResult};
use crate::config::Config;
use crate::dut::{DeviceUnderTest, Retirement};
use crate::memory::{MemoryModel, MemoryService};
use crate::peripheral::{Idle, Peripheral};
use crate::stats::{EventCounters, StatsCollector};
use crate::uart::UartSink;

/// Snapshot of the driver's per-run state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SimulationState {
    /// Monotonic half-phase counter.
    pub cycle_count: u64,
    /// Consecutive ticks without a retirement.
    pub stall_count: u64,
    /// Success sentinel has retired since the last reset.
    pub program_complete: bool,
    /// Inside a benchmark region.
    pub collect_stats: bool,
}

/// Verdict computed at the end of the most recent tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Verdict {
    termination: Option<Termination>,
    stalled: bool,
}

/// Clocked co-simulation of a processor model against its environment.
pub struct SimulationDriver<D: DeviceUnderTest> {
    dut: D,
    memory: MemoryModel,
    service: MemoryService,
    peripheral: Box<dyn Peripheral>,
    uart: UartSink,
    stats: StatsCollector,
    watchdog: StallWatchdog,
    termination: TerminationDetector,

    reset_cycles: u64,
    max_cycles: Option<u64>,
    cycle_count: u64,
    cycles_since_reset: u64,
    verdict: Verdict,
}

impl<D: DeviceUnderTest> SimulationDriver<D> {
    /// Wires `dut` to `memory` with an idle peripheral and a capture-only UART.
    ///
    /// # Arguments
    ///
    /// * `dut` - The model to drive; reset is not applied until [`Self::reset`].
    /// * `memory` - Local memory served on the instruction and data interfaces.
    /// * `config` - Reset length, stall limit, cycle cap, and counter names.
    ///
    /// # Returns
    ///
    /// The driver, or `SimError::EventWidthMismatch` if the model's event vector is
    /// not as wide as the configured counter list.
    pub fn new(dut: D, memory: MemoryModel, config: &Config) -> SimResult<Self> {
        let names = config.event_names();
        let signals = dut.events().len();
        if signals != names.len() {
            return Err(SimError::EventWidthMismatch {
                counters: names.len(),
                signals,
            });
        }

        let service = MemoryService::new(&memory, &dut);
        Ok(Self {
            dut,
            memory,
            service,
            peripheral: Box::new(Idle),
            uart: UartSink::new(),
            stats: StatsCollector::new(names),
            watchdog: StallWatchdog::new(config.general.stall_limit),
            termination: TerminationDetector::new(),
            reset_cycles: config.general.reset_cycles,
            max_cycles: config.general.max_cycles,
            cycle_count: 0,
            cycles_since_reset: 0,
            verdict: Verdict::default(),
        })
    }

    /// Builds a driver with memory, peripheral, and UART set up from `config`.
    ///
    /// The image is placed in local memory at `memory.load_offset`. When the DDR
    /// peripheral is enabled its store is filled from the configured backing file,
    /// or from the same image.
    ///
    /// # Arguments
    ///
    /// * `dut` - The model to drive.
    /// * `image` - Program placed in local memory and, by default, in DDR.
    /// * `config` - Full run configuration.
    ///
    /// # Returns
    ///
    /// The driver, or the first placement or I/O error. Nothing is ticked on failure.
    pub fn from_config(dut: D, image: &ProgramImage, config: &Config) -> SimResult<Self> {
        config.validate()?;

        let mut memory = MemoryModel::new(config.memory.size_bytes);
        image.load_into(&mut memory, config.memory.load_offset)?;

        let peripheral: Box<dyn Peripheral> = if config.ddr.enabled {
            Box::new(build_ddr(&config.ddr, image)?)
        } else {
            Box::new(Idle)
        };
        let uart = UartSink::from_config(&config.uart)?;

        Ok(Self::new(dut, memory, config)?
            .with_peripheral(peripheral)
            .with_uart(uart))
    }

    /// Replaces the peripheral stepped each tick.
    #[must_use]
    pub fn with_peripheral(mut self, peripheral: Box<dyn Peripheral>) -> Self {
        self.peripheral = peripheral;
        self
    }

    /// Replaces the UART sink.
    #[must_use]
    pub fn with_uart(mut self, uart: UartSink) -> Self {
        self.uart = uart;
        self
    }

    /// Holds reset for the configured warm-up, releases it, and clears run state.
    pub fn reset(&mut self) {
        self.dut.set_clock(false);
        self.dut.set_reset(true);
        for _ in 0..self.reset_cycles {
            self.tick();
        }
        self.dut.set_reset(false);

        self.stats.reset();
        self.watchdog.reset();
        self.termination.reset();
        self.verdict = Verdict::default();
        self.cycles_since_reset = 0;

        tracing::info!(
            reset_cycles = self.reset_cycles,
            cycle_count = self.cycle_count,
            "reset released"
        );
    }

    /// Advances the model and its environment by one clock cycle.
    pub fn tick(&mut self) {
        self.cycle_count += 1;
        self.dut.set_clock(true);
        self.dut.eval();

        self.cycle_count += 1;
        self.dut.set_clock(false);
        self.dut.eval();

        self.dut.set_clock(true);
        self.dut.eval();

        self.peripheral.step(self.dut.ddr_port());

        let retirement = Retirement::new(self.dut.retire_ports());
        self.stats.update(retirement, self.dut.events());

        if let Some(byte) = self.dut.uart_write() {
            self.uart.push(byte);
        }

        self.service.service(&mut self.memory, &mut self.dut);

        let retirement = Retirement::new(self.dut.retire_ports());
        let termination = self
            .termination
            .evaluate(retirement, self.dut.store_queue_empty());
        let stalled = self.watchdog.observe(retirement.any_valid());
        self.verdict = Verdict {
            termination,
            stalled,
        };

        self.cycles_since_reset += 1;
        tracing::trace!(cycle_count = self.cycle_count, "tick");
    }

    /// Ticks until the program terminates, the watchdog trips, the cycle cap is
    /// reached, or `stop` returns true, checked in that order after every tick.
    ///
    /// At least one tick is always taken.
    ///
    /// # Arguments
    ///
    /// * `stop` - Caller predicate, consulted after the built-in checks.
    ///
    /// # Returns
    ///
    /// Why the run stopped, with the cycle counts at that point.
    pub fn run_until<F>(&mut self, mut stop: F) -> RunOutcome
    where
        F: FnMut(&Self) -> bool,
    {
        let reason = loop {
            self.tick();

            match self.verdict.termination {
                Some(Termination::Success) => break StopReason::Success,
                Some(Termination::Error) => break StopReason::Error,
                None => {}
            }
            if self.verdict.stalled {
                break StopReason::Stall;
            }
            if self
                .max_cycles
                .is_some_and(|cap| self.cycles_since_reset >= cap)
            {
                break StopReason::CycleLimit;
            }
            if stop(self) {
                break StopReason::Predicate;
            }
        };
        self.uart.flush();

        let outcome = RunOutcome {
            reason,
            cycle_count: self.cycle_count,
            cycles: self.cycles_since_reset,
        };
        if reason.is_failure() {
            tracing::warn!(%reason, cycles = outcome.cycles, "run ended");
        } else {
            tracing::info!(%reason, cycles = outcome.cycles, "run ended");
        }
        outcome
    }

    /// Runs until a terminal verdict.
    pub fn run(&mut self) -> RunOutcome {
        self.run_until(|_| false)
    }

    /// Monotonic half-phase counter; two per tick, never reset.
    pub const fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    /// Ticks since reset was last released.
    pub const fn cycles_since_reset(&self) -> u64 {
        self.cycles_since_reset
    }

    /// Full clock cycles represented by the half-phase counter.
    pub const fn full_cycles(&self) -> u64 {
        self.cycle_count / PHASES_PER_CYCLE
    }

    /// True if the last tick ended the program, by either sentinel.
    pub const fn has_terminated(&self) -> bool {
        self.verdict.termination.is_some()
    }

    /// True if the watchdog tripped on the last tick.
    pub const fn has_stalled(&self) -> bool {
        self.verdict.stalled
    }

    /// How the program ended, if it did on the last tick.
    pub const fn termination(&self) -> Option<Termination> {
        self.verdict.termination
    }

    /// Snapshot of the per-run state.
    pub fn state(&self) -> SimulationState {
        SimulationState {
            cycle_count: self.cycle_count,
            stall_count: self.watchdog.count(),
            program_complete: self.termination.program_complete(),
            collect_stats: self.stats.collecting(),
        }
    }

    /// Statistics collector.
    pub const fn stats(&self) -> &StatsCollector {
        &self.stats
    }

    /// Named event counters.
    pub const fn counters(&self) -> &EventCounters {
        self.stats.counters()
    }

    /// UART sink.
    pub const fn uart(&self) -> &UartSink {
        &self.uart
    }

    /// Local memory model.
    pub const fn memory(&self) -> &MemoryModel {
        &self.memory
    }

    /// Memory output registers.
    pub const fn service(&self) -> &MemoryService {
        &self.service
    }

    /// The device-under-test.
    pub const fn dut(&self) -> &D {
        &self.dut
    }

    /// Mutable access to the device-under-test.
    pub const fn dut_mut(&mut self) -> &mut D {
        &mut self.dut
    }

    /// Packages `outcome` with the counters and UART capture.
    pub fn report(&self, outcome: RunOutcome) -> RunReport {
        RunReport::new(outcome, self.counters().clone(), self.uart.captured())
    }
}

impl<D: DeviceUnderTest> fmt::Debug for SimulationDriver<D> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SimulationDriver")
            .field("cycle_count", &self.cycle_count)
            .field("cycles_since_reset", &self.cycles_since_reset)
            .field("reset_cycles", &self.reset_cycles)
            .field("max_cycles", &self.max_cycles)
            .field("watchdog", &self.watchdog)
            .field("termination", &self.termination)
            .field("stats", &self.stats.mode())
            .field("uart", &self.uart)
            .finish_non_exhaustive()
    }
}
