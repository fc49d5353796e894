//! DMX512 serial link layer.
//!
//! dmxprims opens a serial adapter at the fixed DMX512 line settings, produces
//! BREAK and Mark-After-Break with microsecond holds, and moves start code +
//! slot bytes on and off the wire without blocking.
//!
//! # Crate Structure
//!
//! - [`serial`] — Line setup and the `send_break` / `write` / `read_frame` primitives
//! - [`frame`] — 513-byte frame buffer, start codes, full-frame writer, refresh thread

/// Re-export serial line types.
pub mod serial {
    pub use dmxprims_serial::*;
}

/// Re-export frame types.
pub mod frame {
    pub use dmxprims_frame::*;
}
