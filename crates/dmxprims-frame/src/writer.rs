use std::time::{Duration, Instant};

use dmxprims_serial::{DmxTransport, MAX_FRAME_LEN};
use tracing::trace;

use crate::error::{FrameError, Result};
use crate::frame::DmxFrame;

/// Default time a frame may sit without the line accepting another byte.
pub const DEFAULT_STALL_TIMEOUT: Duration = Duration::from_millis(100);

/// Frame writer configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WriterConfig {
    /// How long zero-byte writes are retried before giving up on a frame.
    pub stall_timeout: Duration,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            stall_timeout: DEFAULT_STALL_TIMEOUT,
        }
    }
}

/// Transmits complete BREAK-delimited frames over a [`DmxTransport`].
///
/// Every frame starts with a fresh BREAK + MAB. Short writes are continued
/// until the whole frame is out, so callers never see a partial frame.
pub struct FrameWriter<T> {
    inner: T,
    config: WriterConfig,
    frames_sent: u64,
}

impl<T: DmxTransport> FrameWriter<T> {
    /// Create a new frame writer with default configuration.
    pub fn new(inner: T) -> Self {
        Self::with_config(inner, WriterConfig::default())
    }

    /// Create a new frame writer with explicit configuration.
    pub fn with_config(inner: T, config: WriterConfig) -> Self {
        Self {
            inner,
            config,
            frames_sent: 0,
        }
    }

    /// BREAK, MAB, then every byte of `frame`.
    pub fn transmit(&mut self, frame: &DmxFrame) -> Result<()> {
        self.transmit_bytes(frame.as_bytes())
    }

    /// BREAK, MAB, then every byte of a raw wire buffer (start code first).
    pub fn transmit_bytes(&mut self, bytes: &[u8]) -> Result<()> {
        if bytes.is_empty() {
            return Err(FrameError::Empty);
        }
        if bytes.len() > MAX_FRAME_LEN {
            return Err(FrameError::TooLong {
                len: bytes.len(),
                max: MAX_FRAME_LEN,
            });
        }

        self.inner.send_break()?;

        let mut offset = 0usize;
        let mut last_progress = Instant::now();
        while offset < bytes.len() {
            match self.inner.write(&bytes[offset..])? {
                0 => {
                    if last_progress.elapsed() >= self.config.stall_timeout {
                        return Err(FrameError::Stalled {
                            written: offset,
                            len: bytes.len(),
                            timeout: self.config.stall_timeout,
                        });
                    }
                    std::thread::yield_now();
                }
                n => {
                    offset += n;
                    last_progress = Instant::now();
                }
            }
        }

        self.frames_sent = self.frames_sent.saturating_add(1);
        trace!(len = bytes.len(), frames = self.frames_sent, "frame transmitted");
        Ok(())
    }

    /// Frames fully transmitted so far.
    pub fn frames_sent(&self) -> u64 {
        self.frames_sent
    }

    /// Borrow the underlying transport.
    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    /// Mutably borrow the underlying transport.
    pub fn get_mut(&mut self) -> &mut T {
        &mut self.inner
    }

    /// Consume the writer and return the inner transport.
    pub fn into_inner(self) -> T {
        self.inner
    }

    /// Current frame writer configuration.
    pub fn config(&self) -> &WriterConfig {
        &self.config
    }
}
