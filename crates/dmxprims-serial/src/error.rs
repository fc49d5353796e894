use std::time::Duration;

/// Errors that can occur on a DMX512 serial line.
#[derive(Debug, thiserror::Error)]
pub enum SerialError {
    /// The device could not be opened (missing, busy, permission denied).
    #[error("failed to open {port}: {source}")]
    Open {
        port: String,
        source: std::io::Error,
    },

    /// The device opened but rejected the 250000 8N2 line settings.
    #[error("failed to configure {port} for DMX512: {source}")]
    Configure {
        port: String,
        source: std::io::Error,
    },

    /// An I/O error occurred on an open line.
    #[error("serial I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The port has been closed.
    #[error("serial port is closed")]
    Closed,

    /// The buffer is longer than a start code plus 512 slots.
    #[error("frame too long ({len} bytes, max {max})")]
    FrameTooLong { len: usize, max: usize },

    /// A BREAK or MAB duration outside the DMX512 legal range.
    #[error("{what} of {value:?} is outside the legal range {min:?}..={max:?}")]
    InvalidTiming {
        what: &'static str,
        value: Duration,
        min: Duration,
        max: Duration,
    },
}

impl SerialError {
    /// True for failures raised by `open` (device or line configuration).
    pub fn is_open_failure(&self) -> bool {
        matches!(self, Self::Open { .. } | Self::Configure { .. })
    }

    /// True for caller bugs: using a closed port or an oversized buffer.
    pub fn is_precondition_violation(&self) -> bool {
        matches!(self, Self::Closed | Self::FrameTooLong { .. })
    }
}

pub type Result<T> = std::result::Result<T, SerialError>;
