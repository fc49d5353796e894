use std::time::Duration;

use dmxprims_serial::SerialError;

/// Errors that can occur building or transmitting DMX frames.
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A slot number outside the frame's active range.
    #[error("slot {slot} out of range (1..={max})")]
    SlotOutOfRange { slot: usize, max: usize },

    /// More bytes than a start code plus 512 slots.
    #[error("frame too long ({len} bytes, max {max})")]
    TooLong { len: usize, max: usize },

    /// A frame must carry at least its start code.
    #[error("frame is empty (missing start code)")]
    Empty,

    /// The line stopped accepting bytes mid-frame.
    #[error("write stalled after {written} of {len} bytes ({timeout:?})")]
    Stalled {
        written: usize,
        len: usize,
        timeout: Duration,
    },

    /// Refresh rate outside what a 513-byte frame allows on the wire.
    #[error("refresh rate {0} Hz outside 1..=44")]
    InvalidRate(u32),

    /// The output thread panicked.
    #[error("refresh thread panicked")]
    RefreshPanicked,

    /// The OS refused to start the output thread.
    #[error("failed to start refresh thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The underlying line failed.
    #[error("serial error: {0}")]
    Serial(#[from] SerialError),
}

pub type Result<T> = std::result::Result<T, FrameError>;
