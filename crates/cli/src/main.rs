//! Co-simulation driver CLI.
//!
//! This binary runs one co-simulation from the command line. It performs:
//! 1. **Setup:** Loads the configuration, program image, and recorded model trace.
//! 2. **Run:** Holds reset, releases it, and ticks until a terminal verdict.
//! 3. **Report:** Prints the summary, counters, and UART capture, optionally as JSON.
//!
//! The exit code is 0 on success and 1 on any failure outcome or setup error.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use cosim_core::Config;
use cosim_core::common::SimResult;
use cosim_core::dut::TraceDut;
use cosim_core::sim::{ProgramImage, RunReport, SimulationDriver};

#[derive(Parser, Debug)]
#[command(
    name = "cosim",
    author,
    version,
    about = "Cycle-accurate co-simulation driver",
    long_about = "Clock a processor model against local memory, a DDR peripheral, and a UART, \
                  detect sentinel termination and stalls, and report benchmark-region counters.\n\n\
                  Examples:\n  cosim run --trace frames.json --program qsort.bin\n  \
                  cosim run --trace frames.json --program qsort.elf --config cosim.json --report-json out.json"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run a program against a recorded model trace.
    Run {
        /// Recorded model trace (JSON frames).
        #[arg(short, long)]
        trace: PathBuf,

        /// Program image, raw binary or ELF.
        #[arg(short, long)]
        program: PathBuf,

        /// JSON configuration file; built-in defaults otherwise.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Append UART output to this file.
        #[arg(long)]
        uart_log: Option<PathBuf>,

        /// Override the stall budget in cycles.
        #[arg(long)]
        stall_limit: Option<u64>,

        /// Stop after this many cycles.
        #[arg(long)]
        max_cycles: Option<u64>,

        /// Write the report as JSON to this file.
        #[arg(long)]
        report_json: Option<PathBuf>,
    },
}

/// Options collected from the `run` subcommand.
#[derive(Debug)]
struct RunArgs {
    trace: PathBuf,
    program: PathBuf,
    config: Option<PathBuf>,
    uart_log: Option<PathBuf>,
    stall_limit: Option<u64>,
    max_cycles: Option<u64>,
    report_json: Option<PathBuf>,
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let args = match cli.command {
        Commands::Run {
            trace,
            program,
            config,
            uart_log,
            stall_limit,
            max_cycles,
            report_json,
        } => RunArgs {
            trace,
            program,
            config,
            uart_log,
            stall_limit,
            max_cycles,
            report_json,
        },
    };

    match cmd_run(&args) {
        Ok(report) if report.outcome.reason.is_success() => ExitCode::SUCCESS,
        Ok(report) => {
            eprintln!("\n[!] Run failed: {}", report.outcome.reason);
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}

/// Builds the configuration from the file and command-line overrides.
fn load_config(args: &RunArgs) -> SimResult<Config> {
    let mut config = match &args.config {
        Some(path) => Config::from_file(path)?,
        None => Config::default(),
    };
    if let Some(limit) = args.stall_limit {
        config.general.stall_limit = limit;
    }
    if let Some(cap) = args.max_cycles {
        config.general.max_cycles = Some(cap);
    }
    if let Some(path) = &args.uart_log {
        config.uart.log_file = Some(path.clone());
    }
    config.validate()?;
    Ok(config)
}

/// Runs one co-simulation to its terminal verdict and reports it.
fn cmd_run(args: &RunArgs) -> SimResult<RunReport> {
    let config = load_config(args)?;
    let image = ProgramImage::from_file(&args.program)?;
    let dut = TraceDut::from_file(&args.trace)?;

    println!("[*] Program: {} ({} bytes)", args.program.display(), image.len());
    println!("[*] Trace:   {} ({} cycles)", args.trace.display(), dut.len());
    println!(
        "    Reset: {} cycles  Stall limit: {}  Memory: {} KiB  DDR: {}",
        config.general.reset_cycles,
        config.general.stall_limit,
        config.memory.size_bytes / 1024,
        if config.ddr.enabled { "enabled" } else { "disabled" }
    );
    println!();

    let mut driver = SimulationDriver::from_config(dut, &image, &config)?;
    driver.reset();
    let outcome = driver.run();

    let report = driver.report(outcome);
    if config.uart.echo {
        report.print_sections(&["summary".into(), "counters".into()]);
    } else {
        report.print();
    }
    if let Some(path) = &args.report_json {
        report.write_json(path)?;
        println!("[*] Report written to {}", path.display());
    }
    Ok(report)
}
