//! DMX512 frames on top of a [`DmxTransport`](dmxprims_serial::DmxTransport).
//!
//! A frame on the wire is:
//!
//! ```text
//! ┌─────────┬──────┬────────────┬──────────┬─────┬────────────┐
//! │ BREAK   │ MAB  │ Start code │ Slot 1   │ ... │ Slot N     │
//! │ ≥ 88 µs │ ≥ 8µs│ 1 byte     │ 1 byte   │     │ N ≤ 512    │
//! └─────────┴──────┴────────────┴──────────┴─────┴────────────┘
//! ```
//!
//! Each byte is 11 bits at 250 kbaud (start, 8 data, 2 stop): 44 µs.
//!
//! This crate owns the frame buffer, start-code classification, full-frame
//! transmission with partial-write handling, polling reads, and a dedicated
//! refresh thread. Slot meaning (fixtures, patching) is left to callers.

pub mod error;
pub mod frame;
pub mod reader;
pub mod refresh;
pub mod start_code;
pub mod writer;

#[cfg(test)]
mod testing;

pub use error::{FrameError, Result};
pub use frame::{DmxFrame, SLOT_COUNT};
pub use reader::{classify, FrameReader};
pub use refresh::{Refresher, DEFAULT_RATE_HZ, MAX_RATE_HZ};
pub use start_code::StartCode;
pub use writer::{FrameWriter, WriterConfig, DEFAULT_STALL_TIMEOUT};
