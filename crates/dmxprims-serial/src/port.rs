use std::fs::File;
use std::io::{ErrorKind, Read, Write};

use tracing::{debug, info, trace};

use crate::error::{Result, SerialError};
use crate::sys;
use crate::timing::{hold, BreakTiming};
use crate::traits::DmxTransport;

/// DMX512 line rate. Fixed by the standard, not configurable.
pub const BAUD_RATE: u32 = 250_000;
/// Data bits per slot.
pub const DATA_BITS: u8 = 8;
/// Stop bits per slot.
pub const STOP_BITS: u8 = 2;
/// Largest frame: start code plus 512 slots.
pub const MAX_FRAME_LEN: usize = 513;

/// An open DMX512 serial line.
///
/// Owns the OS descriptor exclusively. The descriptor is released on
/// [`close`](DmxTransport::close) or when the port is dropped, whichever
/// comes first; a second close is a no-op.
pub struct SerialPort {
    port: String,
    file: Option<File>,
    timing: BreakTiming,
}

impl SerialPort {
    /// Open `port` and configure it for DMX512 with default BREAK timing.
    pub fn open(port: impl AsRef<str>) -> Result<Self> {
        Self::open_with_timing(port, BreakTiming::default())
    }

    /// Open `port` and configure it for DMX512 with explicit BREAK timing.
    ///
    /// Either the device ends up fully configured or the call fails and the
    /// descriptor is already closed. No retries.
    pub fn open_with_timing(port: impl AsRef<str>, timing: BreakTiming) -> Result<Self> {
        let port = port.as_ref().to_string();

        let file = sys::open_device(&port).map_err(|source| SerialError::Open {
            port: port.clone(),
            source,
        })?;

        // `file` drops on the error path, closing the descriptor.
        sys::configure(&file).map_err(|source| SerialError::Configure {
            port: port.clone(),
            source,
        })?;

        info!(
            %port,
            baud = BAUD_RATE,
            break_us = timing.break_duration().as_micros() as u64,
            mab_us = timing.mark_after_break().as_micros() as u64,
            "opened DMX512 line"
        );

        Ok(Self {
            port,
            file: Some(file),
            timing,
        })
    }

    /// The identifier this port was opened with.
    pub fn port(&self) -> &str {
        &self.port
    }

    /// BREAK/MAB durations used by `send_break`.
    pub fn timing(&self) -> BreakTiming {
        self.timing
    }

    /// Change BREAK/MAB durations for subsequent frames.
    pub fn set_timing(&mut self, timing: BreakTiming) {
        self.timing = timing;
    }

    fn file(&self) -> Result<&File> {
        self.file.as_ref().ok_or(SerialError::Closed)
    }
}

impl DmxTransport for SerialPort {
    fn send_break(&mut self) -> Result<()> {
        let file = self.file()?;

        // A BREAK raised while the previous frame is still in the UART
        // would cut its last slots short.
        sys::drain(file)?;

        sys::set_break(file)?;
        hold(self.timing.break_duration());
        let released = sys::clear_break(file);
        hold(self.timing.mark_after_break());
        released?;

        trace!(port = %self.port, "break sent");
        Ok(())
    }

    fn write(&mut self, frame: &[u8]) -> Result<usize> {
        let mut file = self.file()?;
        if frame.len() > MAX_FRAME_LEN {
            return Err(SerialError::FrameTooLong {
                len: frame.len(),
                max: MAX_FRAME_LEN,
            });
        }
        if frame.is_empty() {
            return Ok(0);
        }

        loop {
            match file.write(frame) {
                Ok(n) => {
                    trace!(port = %self.port, requested = frame.len(), written = n, "frame write");
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(0),
                // Bounded comm write timeout expired with nothing sent.
                Err(err) if err.kind() == ErrorKind::TimedOut => {
                    debug!(port = %self.port, "frame write timed out");
                    return Ok(0);
                }
                Err(err) => return Err(SerialError::Io(err)),
            }
        }
    }

    fn read_frame(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut file = self.file()?;
        if buf.is_empty() {
            return Ok(0);
        }

        loop {
            match file.read(buf) {
                Ok(n) => {
                    if n > 0 {
                        trace!(port = %self.port, read = n, "frame read");
                    }
                    return Ok(n);
                }
                Err(err) if err.kind() == ErrorKind::Interrupted => continue,
                Err(err) if err.kind() == ErrorKind::WouldBlock => return Ok(0),
                Err(err) => return Err(SerialError::Io(err)),
            }
        }
    }

    fn close(&mut self) {
        if self.file.take().is_some() {
            info!(port = %self.port, "closed DMX512 line");
        } else {
            debug!(port = %self.port, "close on already-closed line ignored");
        }
    }

    fn is_open(&self) -> bool {
        self.file.is_some()
    }
}

impl std::fmt::Debug for SerialPort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SerialPort")
            .field("port", &self.port)
            .field("open", &self.file.is_some())
            .field("timing", &self.timing)
            .finish()
    }
}
