//! Peripheral-side memory model.
//!
//! Models the off-core DDR that a DMA-capable bus master in the processor model talks
//! to. The port carries one outstanding request at a time:
//! 1. **Accept:** When idle, the model takes the pending request off the port.
//! 2. **Wait:** The request is held for the latency reported by the memory controller.
//! 3. **Respond:** Read data (or a write acknowledgement) is presented for exactly one step.
//!
//! Contents are loaded from the program image or from a separate backing file before
//! the first tick.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::Peripheral;
use super::controller::MemoryController;
use crate::common::{SimError, SimResult, WORD_BYTES};

/// A request driven by the processor model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DdrRequest {
    /// Byte address.
    pub addr: u64,
    /// Write data; ignored for reads.
    #[serde(default)]
    pub data: u32,
    /// Byte-lane write strobe; zero for a read.
    #[serde(default)]
    pub strobe: u8,
}

impl DdrRequest {
    /// True if any byte lane is written.
    pub const fn is_write(&self) -> bool {
        self.strobe != 0
    }
}

/// A completed request as presented back to the processor model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DdrResponse {
    /// Byte address of the completed request.
    pub addr: u64,
    /// Read data; the previous contents for a write.
    pub data: u32,
}

/// Signals between the processor model and the peripheral.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DdrPort {
    /// Pending request; the peripheral clears it on acceptance.
    pub request: Option<DdrRequest>,
    /// Response valid for the current step only.
    pub response: Option<DdrResponse>,
}

#[derive(Debug, Clone, Copy)]
struct InFlight {
    request: DdrRequest,
    remaining: u64,
}

/// Byte store behind a [`DdrPort`].
pub struct DdrModel {
    store: Vec<u8>,
    base: u64,
    controller: Box<dyn MemoryController>,
    in_flight: Option<InFlight>,
    completed: u64,
}

impl DdrModel {
    /// Creates a zeroed store of `size` bytes mapped at byte address `base`.
    ///
    /// # Arguments
    ///
    /// * `size` - Store size in bytes.
    /// * `base` - Bus address of the first byte.
    /// * `controller` - Latency model consulted once per accepted request.
    ///
    /// # Returns
    ///
    /// An idle `DdrModel` with no request in flight.
    pub fn new(size: usize, base: u64, controller: Box<dyn MemoryController>) -> Self {
        Self {
            store: vec![0; size],
            base,
            controller,
            in_flight: None,
            completed: 0,
        }
    }

    /// Copies `data` into the store at byte `offset` from the base.
    pub fn load(&mut self, data: &[u8], offset: u64) -> SimResult<()> {
        let too_large = || SimError::ImageTooLarge {
            len: data.len(),
            offset,
            capacity: self.store.len(),
        };
        let start = usize::try_from(offset).map_err(|_| too_large())?;
        let end = start.checked_add(data.len()).ok_or_else(too_large)?;
        if end > self.store.len() {
            return Err(too_large());
        }
        self.store[start..end].copy_from_slice(data);
        Ok(())
    }

    /// Size of the store in bytes.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    /// True if the store has no capacity.
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Number of requests completed so far.
    pub const fn completed(&self) -> u64 {
        self.completed
    }

    /// True while a request is waiting on its latency.
    pub const fn busy(&self) -> bool {
        self.in_flight.is_some()
    }

    fn offset_of(&self, addr: u64) -> Option<usize> {
        let offset = usize::try_from(addr.checked_sub(self.base)?).ok()?;
        (offset.checked_add(WORD_BYTES)? <= self.store.len()).then_some(offset)
    }

    /// Reads the little-endian word at byte address `addr`; zero if unmapped.
    pub fn read_u32(&self, addr: u64) -> u32 {
        let Some(offset) = self.offset_of(addr) else {
            tracing::warn!("ddr read outside backing store at {addr:#x}");
            return 0;
        };
        let mut bytes = [0u8; WORD_BYTES];
        bytes.copy_from_slice(&self.store[offset..offset + WORD_BYTES]);
        u32::from_le_bytes(bytes)
    }

    /// Writes the lanes of `data` selected by `strobe` at byte address `addr`.
    pub fn write_u32(&mut self, addr: u64, data: u32, strobe: u8) {
        let Some(offset) = self.offset_of(addr) else {
            tracing::warn!("ddr write outside backing store at {addr:#x}");
            return;
        };
        for (lane, byte) in data.to_le_bytes().into_iter().enumerate() {
            if strobe & (1 << lane) != 0 {
                self.store[offset + lane] = byte;
            }
        }
    }

    fn complete(&mut self, request: DdrRequest) -> DdrResponse {
        let data = self.read_u32(request.addr);
        if request.is_write() {
            self.write_u32(request.addr, request.data, request.strobe);
        }
        self.completed += 1;
        DdrResponse {
            addr: request.addr,
            data,
        }
    }
}

impl Peripheral for DdrModel {
    fn step(&mut self, port: Option<&mut DdrPort>) {
        let Some(port) = port else {
            return;
        };
        port.response = None;

        if let Some(flight) = self.in_flight.as_mut() {
            if flight.remaining > 1 {
                flight.remaining -= 1;
                return;
            }
            let request = flight.request;
            self.in_flight = None;
            port.response = Some(self.complete(request));
            return;
        }

        if let Some(request) = port.request.take() {
            let remaining = self.controller.access_latency(request.addr).max(1);
            tracing::trace!(remaining, "ddr request accepted at {:#x}", request.addr);
            self.in_flight = Some(InFlight { request, remaining });
        }
    }
}

impl fmt::Debug for DdrModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DdrModel")
            .field("size", &self.store.len())
            .field("base", &format_args!("{:#x}", self.base))
            .field("in_flight", &self.in_flight)
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}
