//! Cross-platform DMX512 serial line transport.
//!
//! Opens a serial device at the fixed DMX512 line settings (250000 baud,
//! 8 data bits, no parity, 2 stop bits, non-blocking) and exposes the three
//! link-layer primitives everything else builds on:
//!
//! - `send_break` — BREAK followed by Mark-After-Break
//! - `write` — raw start code + slot bytes
//! - `read_frame` — whatever bytes are queued, without blocking
//!
//! One backend is compiled per target: termios on Unix, the Win32
//! communications API on Windows. Both present the same [`DmxTransport`]
//! contract through [`SerialPort`].

pub mod error;
pub mod port;
pub mod timing;
pub mod traits;

#[cfg(unix)]
#[path = "unix.rs"]
mod sys;

#[cfg(windows)]
#[path = "windows.rs"]
mod sys;

pub use error::{Result, SerialError};
pub use port::{SerialPort, BAUD_RATE, DATA_BITS, MAX_FRAME_LEN, STOP_BITS};
pub use timing::BreakTiming;
pub use traits::DmxTransport;

/// Name of the backend compiled into this build, for diagnostics.
pub fn backend_name() -> &'static str {
    if cfg!(target_os = "linux") {
        "termios2"
    } else if cfg!(any(target_os = "macos", target_os = "ios")) {
        "termios+IOSSIOSPEED"
    } else if cfg!(unix) {
        "termios"
    } else {
        "win32-comm"
    }
}
