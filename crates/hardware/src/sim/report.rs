//! End-of-run report.
//!
//! Collects the terminal verdict, cycle counts, event counters, and captured UART
//! text into one value that can be printed as a table or exported as JSON.

use std::fs;
use std::path::Path;

use serde::Serialize;

use super::outcome::RunOutcome;
use crate::common::{SimError, SimResult};
use crate::stats::EventCounters;

/// Everything a finished run produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunReport {
    /// Verdict and cycle counts.
    pub outcome: RunOutcome,
    /// Benchmark-region event counters.
    pub counters: EventCounters,
    /// Number of bytes strobed out of the UART.
    pub uart_bytes: usize,
    /// Captured UART output, with invalid UTF-8 replaced.
    pub uart: String,
}

impl RunReport {
    /// Assembles a report.
    ///
    /// # Arguments
    ///
    /// * `outcome` - Verdict and cycle counts from the run.
    /// * `counters` - Benchmark-region event counters.
    /// * `uart` - Raw bytes captured from the UART.
    ///
    /// # Returns
    ///
    /// A report whose byte count reflects the raw capture even when the text
    /// had to replace invalid UTF-8.
    pub fn new(outcome: RunOutcome, counters: EventCounters, uart: &[u8]) -> Self {
        Self {
            outcome,
            counters,
            uart_bytes: uart.len(),
            uart: String::from_utf8_lossy(uart).into_owned(),
        }
    }

    /// Prints the selected sections (`summary`, `counters`, `uart`); all when empty.
    pub fn print_sections(&self, sections: &[String]) {
        let want = |s: &str| sections.is_empty() || sections.iter().any(|x| x == s);

        if want("summary") {
            println!("\n==========================================================");
            println!("CO-SIMULATION SUMMARY");
            println!("==========================================================");
            println!("outcome                  {}", self.outcome.reason);
            println!("sim_cycles               {}", self.outcome.cycles);
            println!("half_phase_count         {}", self.outcome.cycle_count);
            println!("uart_bytes               {}", self.uart_bytes);
            println!("----------------------------------------------------------");
        }
        if want("counters") {
            self.counters.print();
        }
        if want("uart") && !self.uart.is_empty() {
            println!("UART OUTPUT");
            println!("----------------------------------------------------------");
            print!("{}", self.uart);
            if !self.uart.ends_with('\n') {
                println!();
            }
            println!("==========================================================");
        }
    }

    /// Prints every section.
    pub fn print(&self) {
        self.print_sections(&[]);
    }

    /// Serializes the report as pretty-printed JSON.
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the JSON report to `path`.
    pub fn write_json(&self, path: impl AsRef<Path>) -> SimResult<()> {
        let path = path.as_ref();
        fs::write(path, self.to_json()?).map_err(|e| SimError::io(path, e))
    }
}
