//! BREAK and Mark-After-Break timing.
//!
//! DMX512 receivers must accept a BREAK of at least 88 µs followed by a MAB
//! of at least 8 µs. Transmitters usually aim well above both minimums. The
//! durations here are tunables within the legal range, not fixed constants.

use std::time::{Duration, Instant};

use crate::error::{Result, SerialError};

/// Shortest BREAK a DMX512 receiver is required to accept.
pub const MIN_BREAK: Duration = Duration::from_micros(88);
/// Shortest Mark-After-Break a DMX512 receiver is required to accept.
pub const MIN_MARK_AFTER_BREAK: Duration = Duration::from_micros(8);
/// Upper bound for either interval. Longer idle states read as a lost link.
pub const MAX_INTERVAL: Duration = Duration::from_secs(1);

/// Default BREAK: the common transmitter target of 176 µs.
pub const DEFAULT_BREAK: Duration = Duration::from_micros(176);
/// Default Mark-After-Break.
pub const DEFAULT_MARK_AFTER_BREAK: Duration = Duration::from_micros(12);

/// Delays shorter than this are spun out instead of slept.
///
/// OS sleep primitives routinely overshoot by tens of microseconds (Linux)
/// up to a full millisecond (Windows), which would swamp a 12 µs MAB.
const SPIN_THRESHOLD: Duration = Duration::from_millis(2);

/// BREAK/MAB durations used by `send_break`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BreakTiming {
    break_duration: Duration,
    mark_after_break: Duration,
}

impl BreakTiming {
    /// Create a validated timing pair.
    pub fn new(break_duration: Duration, mark_after_break: Duration) -> Result<Self> {
        check_range("BREAK", break_duration, MIN_BREAK)?;
        check_range("Mark-After-Break", mark_after_break, MIN_MARK_AFTER_BREAK)?;
        Ok(Self {
            break_duration,
            mark_after_break,
        })
    }

    /// Create a timing pair from whole microseconds.
    pub fn from_micros(break_us: u64, mab_us: u64) -> Result<Self> {
        Self::new(
            Duration::from_micros(break_us),
            Duration::from_micros(mab_us),
        )
    }

    /// How long the line is held in the space (break) state.
    pub fn break_duration(&self) -> Duration {
        self.break_duration
    }

    /// How long the line is held at mark before the start code.
    pub fn mark_after_break(&self) -> Duration {
        self.mark_after_break
    }
}

impl Default for BreakTiming {
    fn default() -> Self {
        Self {
            break_duration: DEFAULT_BREAK,
            mark_after_break: DEFAULT_MARK_AFTER_BREAK,
        }
    }
}

fn check_range(what: &'static str, value: Duration, min: Duration) -> Result<()> {
    if value < min || value > MAX_INTERVAL {
        return Err(SerialError::InvalidTiming {
            what,
            value,
            min,
            max: MAX_INTERVAL,
        });
    }
    Ok(())
}

/// Block the calling thread for at least `duration`.
///
/// Short intervals busy-wait on the monotonic clock; long ones sleep. The
/// result never undershoots, only overshoots by scheduler jitter.
pub(crate) fn hold(duration: Duration) {
    let start = Instant::now();
    if duration >= SPIN_THRESHOLD {
        std::thread::sleep(duration);
        return;
    }
    while start.elapsed() < duration {
        std::hint::spin_loop();
    }
}
