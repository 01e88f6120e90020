//! Device-under-test signal surface.
//!
//! The processor model is opaque to the driver. This module defines the fixed set of
//! signals the driver reads and drives each cycle:
//! 1. **Clocking:** Clock and reset inputs plus an `eval` that settles combinational logic.
//! 2. **Retirement:** N retirement ports, each an instruction word and a valid bit.
//! 3. **Memory:** Instruction-fetch and data interfaces backed by the driver's memory model.
//! 4. **Side channels:** UART write strobe, store-queue-empty flag, and the event vector.
//!
//! Any processor model (a generated RTL model, a replayed trace, a test double) plugs in
//! by implementing [`DeviceUnderTest`].

/// Trace-replay implementation of the signal surface.
pub mod trace;

use serde::{Deserialize, Serialize};

use crate::peripheral::DdrPort;
use crate::sentinel::Sentinel;

pub use trace::{TraceDut, TraceFrame};

/// One retirement port: the instruction word and whether it retired this cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetirePort {
    /// Retired instruction word; meaningless when `valid` is low.
    pub instruction: u32,
    /// High when an instruction retired on this port.
    pub valid: bool,
}

impl RetirePort {
    /// A port that retired `instruction` this cycle.
    pub const fn retired(instruction: u32) -> Self {
        Self {
            instruction,
            valid: true,
        }
    }
}

/// Instruction-fetch request: word address and read enable.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstructionRequest {
    /// Word index into the memory model.
    pub addr: u32,
    /// Read enable.
    pub enable: bool,
}

/// Data-interface request.
///
/// A single enable covers both directions: an enabled cycle always reads, and also
/// writes whichever byte lanes `byte_enable` selects (none for a pure load).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataRequest {
    /// Word index into the memory model.
    pub addr: u32,
    /// Access enable.
    pub enable: bool,
    /// Write data.
    pub data_in: u32,
    /// Byte-lane write mask, bit `i` selects byte `i` of `data_in`.
    pub byte_enable: u8,
}

/// Fixed signal surface of a clocked processor model.
pub trait DeviceUnderTest {
    /// Drives the clock input.
    fn set_clock(&mut self, high: bool);
    /// Drives the active-high reset input.
    fn set_reset(&mut self, asserted: bool);
    /// Settles the model for the currently driven inputs.
    fn eval(&mut self);

    /// Retirement ports; the slice length is the model's fixed port count.
    fn retire_ports(&self) -> &[RetirePort];

    /// Current instruction-fetch request.
    fn instruction_request(&self) -> InstructionRequest;
    /// Drives the instruction memory's registered output.
    fn set_instruction_data_out(&mut self, word: u32);

    /// Current data-interface request.
    fn data_request(&self) -> DataRequest;
    /// Drives the data memory's registered output.
    fn set_data_out(&mut self, word: u32);

    /// Byte written to the UART this cycle, if the write strobe is high.
    fn uart_write(&self) -> Option<u8>;
    /// High when no stores are pending inside the model.
    fn store_queue_empty(&self) -> bool;
    /// Per-cycle event signals, index-aligned with the event counter table.
    fn events(&self) -> &[u32];

    /// Bus port to the peripheral-side memory, if the model has one.
    fn ddr_port(&mut self) -> Option<&mut DdrPort> {
        None
    }
}

/// Combinational view over the retirement ports for one cycle.
#[derive(Debug, Clone, Copy)]
pub struct Retirement<'a> {
    ports: &'a [RetirePort],
}

impl<'a> Retirement<'a> {
    /// Wraps the ports sampled from the model.
    pub const fn new(ports: &'a [RetirePort]) -> Self {
        Self { ports }
    }

    /// True if any port retired an instruction.
    pub fn any_valid(&self) -> bool {
        self.ports.iter().any(|p| p.valid)
    }

    /// Number of instructions retired this cycle.
    pub fn count(&self) -> usize {
        self.ports.iter().filter(|p| p.valid).count()
    }

    /// True if `word` retired on any valid port.
    pub fn retired_word(&self, word: u32) -> bool {
        self.ports.iter().any(|p| p.valid && p.instruction == word)
    }

    /// True if the given sentinel retired on any valid port.
    pub fn retired(&self, sentinel: Sentinel) -> bool {
        self.retired_word(sentinel.encoding())
    }
}
