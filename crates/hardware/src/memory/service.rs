//! Registered-read service for the two memory interfaces.
//!
//! Each tick, for each interface, the service:
//! 1. Drives the word latched on the previous tick onto the model's data-out signal.
//! 2. If the interface is enabled, reads the current address and latches it for next tick.
//! 3. On the data interface only, also writes `data_in` under the byte-enable mask.
//!
//! A read issued on cycle N therefore reaches the model on cycle N + 1, never earlier.
//!
//! When a data-interface read and write target the same word in the same cycle the
//! latched value is the word before the write. The hardware contract leaves this
//! ordering undefined; programs must not depend on it.

use super::MemoryModel;
use crate::dut::DeviceUnderTest;

/// One-word output register.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RegisteredPort {
    latched: u32,
}

impl RegisteredPort {
    /// Creates a register holding `word`.
    pub const fn new(word: u32) -> Self {
        Self { latched: word }
    }

    /// Value currently driven by the register.
    pub const fn output(&self) -> u32 {
        self.latched
    }

    /// Captures `word` for the next cycle.
    pub const fn latch(&mut self, word: u32) {
        self.latched = word;
    }
}

/// Output registers for the instruction and data interfaces.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoryService {
    instruction_r: RegisteredPort,
    data_out_r: RegisteredPort,
}

impl MemoryService {
    /// Primes the instruction register with the word at the model's reset fetch address.
    ///
    /// # Arguments
    ///
    /// * `memory` - Store the first instruction word is read from.
    /// * `dut` - Model whose current fetch address selects that word.
    ///
    /// # Returns
    ///
    /// A service whose data register starts at zero.
    pub fn new<D: DeviceUnderTest + ?Sized>(memory: &MemoryModel, dut: &D) -> Self {
        Self {
            instruction_r: RegisteredPort::new(memory.read(dut.instruction_request().addr)),
            data_out_r: RegisteredPort::default(),
        }
    }

    /// Services both interfaces for one cycle.
    pub fn service<D: DeviceUnderTest + ?Sized>(&mut self, memory: &mut MemoryModel, dut: &mut D) {
        dut.set_instruction_data_out(self.instruction_r.output());
        let fetch = dut.instruction_request();
        if fetch.enable {
            self.instruction_r.latch(memory.read(fetch.addr));
        }

        dut.set_data_out(self.data_out_r.output());
        let data = dut.data_request();
        if data.enable {
            self.data_out_r.latch(memory.read(data.addr));
            memory.write(data.addr, data.data_in, data.byte_enable);
        }
    }

    /// Word the instruction register will present next cycle.
    pub const fn instruction_r(&self) -> u32 {
        self.instruction_r.output()
    }

    /// Word the data register will present next cycle.
    pub const fn data_out_r(&self) -> u32 {
        self.data_out_r.output()
    }
}
