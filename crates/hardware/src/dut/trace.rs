//! Trace-replay device-under-test.
//!
//! `TraceDut` drives the signal surface from a recorded list of frames instead of an
//! RTL model. On every rising clock edge with reset released it applies the next frame:
//! retirements, event vector, store-queue state, UART strobe, and memory requests.
//! Once the frames run out it idles: nothing retires, events are zero, and the store
//! queue reads empty.
//!
//! Repeated frames are held in place and counted down, so a long `repeat` costs nothing
//! at construction. With [`TraceDut::with_recording`] the model also keeps every word the
//! driver presents on the memory data-out signals and every DDR response it sees, so
//! registered-read timing can be checked after a run.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use super::{DataRequest, DeviceUnderTest, InstructionRequest, RetirePort};
use crate::common::{SimError, SimResult};
use crate::peripheral::{DdrPort, DdrRequest, DdrResponse};

/// A data-interface access requested by a frame.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataAccess {
    /// Word index.
    pub addr: u32,
    /// Write data.
    #[serde(default)]
    pub data: u32,
    /// Byte-lane write mask; zero for a pure read.
    #[serde(default)]
    pub byte_enable: u8,
}

/// Signal values for one cycle of the trace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TraceFrame {
    /// Retirement ports, lowest index first; missing ports are invalid.
    pub retire: Vec<RetirePort>,
    /// Event vector; missing entries are zero.
    pub events: Vec<u32>,
    /// Store-queue-empty flag.
    pub store_queue_empty: bool,
    /// Byte strobed out of the UART.
    pub uart: Option<u8>,
    /// Instruction word index to fetch.
    pub fetch: Option<u32>,
    /// Data-interface access.
    pub data: Option<DataAccess>,
    /// Request placed on the DDR port.
    pub ddr: Option<DdrRequest>,
    /// Number of consecutive cycles this frame holds for.
    pub repeat: u32,
}

impl Default for TraceFrame {
    fn default() -> Self {
        Self {
            retire: Vec::new(),
            events: Vec::new(),
            store_queue_empty: true,
            uart: None,
            fetch: None,
            data: None,
            ddr: None,
            repeat: 1,
        }
    }
}

impl TraceFrame {
    /// A frame where nothing happens.
    pub fn idle() -> Self {
        Self::default()
    }

    /// A frame retiring `words` on consecutive ports.
    pub fn retiring(words: &[u32]) -> Self {
        Self {
            retire: words.iter().copied().map(RetirePort::retired).collect(),
            ..Self::default()
        }
    }

    /// Sets the event vector.
    #[must_use]
    pub fn with_events(mut self, events: Vec<u32>) -> Self {
        self.events = events;
        self
    }

    /// Sets the store-queue-empty flag.
    #[must_use]
    pub const fn with_store_queue_empty(mut self, empty: bool) -> Self {
        self.store_queue_empty = empty;
        self
    }

    /// Strobes `byte` out of the UART.
    #[must_use]
    pub const fn with_uart(mut self, byte: u8) -> Self {
        self.uart = Some(byte);
        self
    }

    /// Requests an instruction fetch from word `addr`.
    #[must_use]
    pub const fn with_fetch(mut self, addr: u32) -> Self {
        self.fetch = Some(addr);
        self
    }

    /// Requests a data access.
    #[must_use]
    pub const fn with_data(mut self, access: DataAccess) -> Self {
        self.data = Some(access);
        self
    }

    /// Places a request on the DDR port.
    #[must_use]
    pub const fn with_ddr(mut self, request: DdrRequest) -> Self {
        self.ddr = Some(request);
        self
    }

    /// Holds the frame for `cycles` cycles.
    #[must_use]
    pub const fn repeated(mut self, cycles: u32) -> Self {
        self.repeat = cycles;
        self
    }
}

/// On-disk trace format.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TraceFile {
    /// Number of retirement ports.
    pub ports: usize,
    /// Width of the event vector.
    pub event_width: usize,
    /// Attach a DDR port.
    #[serde(default)]
    pub ddr_port: bool,
    /// Frames in cycle order.
    pub frames: Vec<TraceFrame>,
}

/// Device-under-test that replays recorded frames.
#[derive(Debug, Clone)]
pub struct TraceDut {
    frames: Vec<TraceFrame>,
    cursor: usize,
    held: u32,
    applied: usize,
    clock: bool,
    prev_clock: bool,
    reset: bool,
    edges: u64,

    ports: Vec<RetirePort>,
    events: Vec<u32>,
    store_queue_empty: bool,
    uart: Option<u8>,
    fetch: InstructionRequest,
    data: DataRequest,
    ddr: Option<DdrPort>,

    recording: bool,
    instruction_outputs: Vec<u32>,
    data_outputs: Vec<u32>,
    ddr_responses: Vec<DdrResponse>,
}

impl TraceDut {
    /// Creates a replay model with a fixed port count and event width.
    ///
    /// The clock starts high, so the first driver tick sees exactly one rising edge
    /// whether or not reset was cycled first.
    ///
    /// # Arguments
    ///
    /// * `ports` - Number of retirement ports; must be at least one.
    /// * `event_width` - Width of the event vector.
    /// * `frames` - Frames in cycle order. A frame with `repeat > 1` is held for that
    ///   many rising edges; `repeat = 0` counts as one.
    ///
    /// # Returns
    ///
    /// The model, or `SimError::InvalidConfig` if a frame drives more ports or events
    /// than the model has.
    pub fn new(ports: usize, event_width: usize, frames: Vec<TraceFrame>) -> SimResult<Self> {
        if ports == 0 {
            return Err(SimError::InvalidConfig(
                "trace needs at least one retirement port".into(),
            ));
        }
        for (index, frame) in frames.iter().enumerate() {
            if frame.retire.len() > ports {
                return Err(SimError::InvalidConfig(format!(
                    "trace frame {index} retires on {} ports but the model has {ports}",
                    frame.retire.len()
                )));
            }
            if frame.events.len() > event_width {
                return Err(SimError::InvalidConfig(format!(
                    "trace frame {index} drives {} events but the vector is {event_width} wide",
                    frame.events.len()
                )));
            }
        }

        Ok(Self {
            frames,
            cursor: 0,
            held: 0,
            applied: 0,
            clock: true,
            prev_clock: true,
            reset: false,
            edges: 0,
            ports: vec![RetirePort::default(); ports],
            events: vec![0; event_width],
            store_queue_empty: true,
            uart: None,
            fetch: InstructionRequest::default(),
            data: DataRequest::default(),
            ddr: None,
            recording: false,
            instruction_outputs: Vec::new(),
            data_outputs: Vec::new(),
            ddr_responses: Vec::new(),
        })
    }

    /// Parses a [`TraceFile`] from JSON.
    pub fn from_json(json: &str) -> SimResult<Self> {
        let file: TraceFile = serde_json::from_str(json)?;
        let mut dut = Self::new(file.ports, file.event_width, file.frames)?;
        if file.ddr_port {
            dut = dut.with_ddr_port();
        }
        Ok(dut)
    }

    /// Reads a [`TraceFile`] from disk.
    pub fn from_file(path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path).map_err(|e| SimError::io(path, e))?;
        Self::from_json(&json)
    }

    /// Attaches a DDR port for the peripheral to service.
    #[must_use]
    pub fn with_ddr_port(mut self) -> Self {
        self.ddr = Some(DdrPort::default());
        self
    }

    /// Keeps every data-out word and DDR response for later inspection.
    ///
    /// Off by default: a long run would otherwise grow these logs by one entry per cycle.
    #[must_use]
    pub const fn with_recording(mut self) -> Self {
        self.recording = true;
        self
    }

    /// Number of cycles the trace covers, counting each repeat.
    pub fn len(&self) -> u64 {
        self.frames
            .iter()
            .map(|frame| u64::from(frame.repeat.max(1)))
            .sum()
    }

    /// True if the trace has no frames.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frames applied since reset was last released.
    pub const fn frames_applied(&self) -> usize {
        self.applied
    }

    /// Rising clock edges seen, including those under reset.
    pub const fn edges(&self) -> u64 {
        self.edges
    }

    /// Words presented on the instruction data-out signal, one per driver service.
    ///
    /// Empty unless the model was built [`with_recording`](Self::with_recording).
    pub fn instruction_outputs(&self) -> &[u32] {
        &self.instruction_outputs
    }

    /// Words presented on the data data-out signal, one per driver service.
    ///
    /// Empty unless recording.
    pub fn data_outputs(&self) -> &[u32] {
        &self.data_outputs
    }

    /// DDR responses seen on rising edges while recording.
    pub fn ddr_responses(&self) -> &[DdrResponse] {
        &self.ddr_responses
    }

    fn rising_edge(&mut self) {
        self.edges += 1;

        if self.recording
            && let Some(response) = self.ddr.as_ref().and_then(|port| port.response)
        {
            self.ddr_responses.push(response);
        }

        if self.reset {
            self.cursor = 0;
            self.held = 0;
            self.applied = 0;
            self.apply(&TraceFrame::idle());
            return;
        }

        let frame = match self.frames.get(self.cursor) {
            Some(frame) => {
                self.held += 1;
                if self.held >= frame.repeat.max(1) {
                    self.cursor += 1;
                    self.held = 0;
                }
                frame.clone()
            }
            None => TraceFrame::idle(),
        };
        self.applied += 1;
        self.apply(&frame);
    }

    fn apply(&mut self, frame: &TraceFrame) {
        self.ports.fill(RetirePort::default());
        for (port, driven) in self.ports.iter_mut().zip(&frame.retire) {
            *port = *driven;
        }

        self.events.fill(0);
        for (event, &driven) in self.events.iter_mut().zip(&frame.events) {
            *event = driven;
        }

        self.store_queue_empty = frame.store_queue_empty;
        self.uart = frame.uart;

        self.fetch = frame.fetch.map_or_else(InstructionRequest::default, |addr| {
            InstructionRequest { addr, enable: true }
        });

        self.data = frame.data.map_or_else(DataRequest::default, |access| DataRequest {
            addr: access.addr,
            enable: true,
            data_in: access.data,
            byte_enable: access.byte_enable,
        });

        if let (Some(port), Some(request)) = (self.ddr.as_mut(), frame.ddr) {
            port.request = Some(request);
        }
    }
}

impl DeviceUnderTest for TraceDut {
    fn set_clock(&mut self, high: bool) {
        self.clock = high;
    }

    fn set_reset(&mut self, asserted: bool) {
        self.reset = asserted;
    }

    fn eval(&mut self) {
        if self.clock && !self.prev_clock {
            self.rising_edge();
        }
        self.prev_clock = self.clock;
    }

    fn retire_ports(&self) -> &[RetirePort] {
        &self.ports
    }

    fn instruction_request(&self) -> InstructionRequest {
        self.fetch
    }

    fn set_instruction_data_out(&mut self, word: u32) {
        if self.recording {
            self.instruction_outputs.push(word);
        }
    }

    fn data_request(&self) -> DataRequest {
        self.data
    }

    fn set_data_out(&mut self, word: u32) {
        if self.recording {
            self.data_outputs.push(word);
        }
    }

    fn uart_write(&self) -> Option<u8> {
        self.uart
    }

    fn store_queue_empty(&self) -> bool {
        self.store_queue_empty
    }

    fn events(&self) -> &[u32] {
        &self.events
    }

    fn ddr_port(&mut self) -> Option<&mut DdrPort> {
        self.ddr.as_mut()
    }
}
