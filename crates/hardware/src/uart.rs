//! UART output capture.
//!
//! Bytes strobed out of the model's UART are:
//! 1. **Captured:** Kept in full for the end-of-run report.
//! 2. **Echoed:** Forwarded to a live writer (stdout by default), buffered until newline.
//! 3. **Logged:** Appended to a log file when one is configured.
//!
//! Sink failures during a run are logged and the failing sink is detached; they never
//! interrupt the tick loop.

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;

use crate::common::{SimError, SimResult};
use crate::config::UartConfig;

/// Pending live output is flushed once it reaches this many bytes, even without a newline.
const TX_BUFFER_FLUSH_THRESHOLD: usize = 4096;

/// Destination for bytes written by the model's UART.
pub struct UartSink {
    captured: Vec<u8>,
    tx_buffer: Vec<u8>,
    live: Option<Box<dyn Write>>,
    log: Option<BufWriter<File>>,
}

impl UartSink {
    /// Creates a sink that only captures.
    pub fn new() -> Self {
        Self {
            captured: Vec::new(),
            tx_buffer: Vec::new(),
            live: None,
            log: None,
        }
    }

    /// Builds the sink described by the configuration.
    pub fn from_config(config: &UartConfig) -> SimResult<Self> {
        let mut sink = Self::new();
        if config.echo {
            sink = sink.with_live(Box::new(io::stdout()));
        }
        if let Some(path) = &config.log_file {
            sink = sink.with_log_file(path)?;
        }
        Ok(sink)
    }

    /// Echoes bytes to `writer`.
    #[must_use]
    pub fn with_live(mut self, writer: Box<dyn Write>) -> Self {
        self.live = Some(writer);
        self
    }

    /// Appends bytes to the file at `path`, creating it if needed.
    ///
    /// # Arguments
    ///
    /// * `path` - Log file; existing contents are kept.
    ///
    /// # Returns
    ///
    /// The sink, or `SimError::Io` if the file cannot be opened.
    pub fn with_log_file(mut self, path: impl AsRef<Path>) -> SimResult<Self> {
        let path = path.as_ref();
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .map_err(|e| SimError::io(path, e))?;
        self.log = Some(BufWriter::new(file));
        Ok(self)
    }

    /// Accepts one byte from the UART.
    pub fn push(&mut self, byte: u8) {
        self.captured.push(byte);

        if let Some(log) = self.log.as_mut() {
            if let Err(e) = log.write_all(&[byte]) {
                tracing::warn!("uart log write failed, detaching log: {e}");
                self.log = None;
            }
        }

        if self.live.is_some() {
            self.tx_buffer.push(byte);
            if byte == b'\n' || self.tx_buffer.len() >= TX_BUFFER_FLUSH_THRESHOLD {
                self.flush_live();
            }
        }
    }

    fn flush_live(&mut self) {
        let Some(live) = self.live.as_mut() else {
            self.tx_buffer.clear();
            return;
        };
        if let Err(e) = live.write_all(&self.tx_buffer).and_then(|()| live.flush()) {
            tracing::warn!("uart echo failed, detaching live output: {e}");
            self.live = None;
        }
        self.tx_buffer.clear();
    }

    /// Pushes any buffered bytes out to the live writer and the log.
    pub fn flush(&mut self) {
        if !self.tx_buffer.is_empty() {
            self.flush_live();
        }
        if let Some(log) = self.log.as_mut() {
            if let Err(e) = log.flush() {
                tracing::warn!("uart log flush failed, detaching log: {e}");
                self.log = None;
            }
        }
    }

    /// Every byte captured so far.
    pub fn captured(&self) -> &[u8] {
        &self.captured
    }

    /// Captured bytes as text, with invalid UTF-8 replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.captured).into_owned()
    }
}

impl Default for UartSink {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for UartSink {
    fn drop(&mut self) {
        self.flush();
    }
}

impl fmt::Debug for UartSink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UartSink")
            .field("captured", &self.captured.len())
            .field("buffered", &self.tx_buffer.len())
            .field("live", &self.live.is_some())
            .field("log", &self.log.is_some())
            .finish()
    }
}
