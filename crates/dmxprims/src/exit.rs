use std::fmt;
use std::io;

use dmxprims_frame::FrameError;
use dmxprims_serial::SerialError;

// Exit code constants aligned with rsfulmen/DDR-0002 semantics.
pub const SUCCESS: i32 = 0;
#[allow(dead_code)]
pub const FAILURE: i32 = 1;
pub const TRANSPORT_ERROR: i32 = 3;
pub const HEALTH_CHECK_FAILED: i32 = 30;
pub const PERMISSION_DENIED: i32 = 50;
pub const DATA_INVALID: i32 = 60;
pub const USAGE: i32 = 64;
pub const TIMEOUT: i32 = 124;
pub const INTERNAL: i32 = 125;

pub type CliResult<T> = Result<T, CliError>;

#[derive(Debug)]
pub struct CliError {
    pub code: i32,
    pub message: String,
}

impl CliError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

pub fn serial_error(context: &str, err: SerialError) -> CliError {
    let code = match &err {
        SerialError::Open { source, .. } | SerialError::Configure { source, .. }
            if source.kind() == io::ErrorKind::PermissionDenied =>
        {
            PERMISSION_DENIED
        }
        SerialError::Open { .. } | SerialError::Configure { .. } => TRANSPORT_ERROR,
        SerialError::Io(_) => TRANSPORT_ERROR,
        SerialError::FrameTooLong { .. } => DATA_INVALID,
        SerialError::InvalidTiming { .. } => USAGE,
        SerialError::Closed => INTERNAL,
    };
    CliError::new(code, format!("{context}: {err}"))
}

pub fn frame_error(context: &str, err: FrameError) -> CliError {
    match err {
        FrameError::Serial(err) => serial_error(context, err),
        FrameError::SlotOutOfRange { .. } | FrameError::TooLong { .. } | FrameError::Empty => {
            CliError::new(DATA_INVALID, format!("{context}: {err}"))
        }
        FrameError::Stalled { .. } => CliError::new(TIMEOUT, format!("{context}: {err}")),
        FrameError::InvalidRate(_) => CliError::new(USAGE, format!("{context}: {err}")),
        FrameError::Spawn(_) => CliError::new(INTERNAL, format!("{context}: {err}")),
        other => CliError::new(INTERNAL, format!("{context}: {other}")),
    }
}
