//! Dedicated output thread.
//!
//! DMX512 receivers expect the controller to retransmit continuously; most
//! fixtures hold their last values for only a second or so without a new
//! frame. [`Refresher`] owns a [`FrameWriter`] on its own thread and sends
//! the latest frame at a steady rate until stopped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::JoinHandle;
use std::time::{Duration, Instant};

use dmxprims_serial::DmxTransport;
use tracing::{debug, warn};

use crate::error::{FrameError, Result};
use crate::frame::DmxFrame;
use crate::writer::FrameWriter;

/// Default refresh rate.
pub const DEFAULT_RATE_HZ: u32 = 40;
/// A full 513-byte frame takes ~22.7 ms on the wire.
pub const MAX_RATE_HZ: u32 = 44;

/// Retransmits the current frame at a fixed rate on a background thread.
pub struct Refresher<T> {
    frame: Arc<Mutex<DmxFrame>>,
    running: Arc<AtomicBool>,
    handle: Option<JoinHandle<Result<FrameWriter<T>>>>,
}

impl<T: DmxTransport + Send + 'static> Refresher<T> {
    /// Start transmitting `initial` at `rate_hz` (1..=44).
    pub fn spawn(writer: FrameWriter<T>, initial: DmxFrame, rate_hz: u32) -> Result<Self> {
        if !(1..=MAX_RATE_HZ).contains(&rate_hz) {
            return Err(FrameError::InvalidRate(rate_hz));
        }
        let period = Duration::from_secs(1) / rate_hz;

        let frame = Arc::new(Mutex::new(initial));
        let running = Arc::new(AtomicBool::new(true));

        let handle = std::thread::Builder::new()
            .name("dmx-refresh".to_string())
            .spawn({
                let frame = Arc::clone(&frame);
                let running = Arc::clone(&running);
                move || run(writer, frame, running, period)
            })
            .map_err(FrameError::Spawn)?;

        debug!(rate_hz, "refresh thread started");
        Ok(Self {
            frame,
            running,
            handle: Some(handle),
        })
    }

    /// Replace the frame sent from the next cycle on.
    pub fn update(&self, frame: DmxFrame) {
        *lock(&self.frame) = frame;
    }

    /// Edit the current frame in place.
    pub fn modify<R>(&self, f: impl FnOnce(&mut DmxFrame) -> R) -> R {
        f(&mut lock(&self.frame))
    }

    /// Copy of the frame currently being sent.
    pub fn current(&self) -> DmxFrame {
        lock(&self.frame).clone()
    }

    /// False once the thread has exited, by `stop` or by a transmit error.
    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Stop the thread and take the writer back.
    ///
    /// Returns the transmit error instead if the thread died on one.
    pub fn stop(mut self) -> Result<FrameWriter<T>> {
        self.running.store(false, Ordering::SeqCst);
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| FrameError::RefreshPanicked)?,
            None => Err(FrameError::RefreshPanicked),
        }
    }
}

impl<T> Drop for Refresher<T> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}

fn run<T: DmxTransport>(
    mut writer: FrameWriter<T>,
    frame: Arc<Mutex<DmxFrame>>,
    running: Arc<AtomicBool>,
    period: Duration,
) -> Result<FrameWriter<T>> {
    let mut next = Instant::now();

    while running.load(Ordering::SeqCst) {
        let snapshot = lock(&frame).clone();
        if let Err(err) = writer.transmit(&snapshot) {
            warn!(error = %err, "refresh transmit failed; stopping");
            running.store(false, Ordering::SeqCst);
            return Err(err);
        }

        next += period;
        let now = Instant::now();
        if next > now {
            std::thread::sleep(next - now);
        } else {
            // Fell behind; resynchronise rather than burst.
            next = now;
        }
    }

    debug!(frames = writer.frames_sent(), "refresh thread stopped");
    Ok(writer)
}

fn lock(frame: &Mutex<DmxFrame>) -> std::sync::MutexGuard<'_, DmxFrame> {
    frame.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::RecordingTransport;

    fn wait_for(mut cond: impl FnMut() -> bool) {
        let start = Instant::now();
        while !cond() {
            assert!(start.elapsed() < Duration::from_secs(3), "condition timed out");
            std::thread::sleep(Duration::from_millis(2));
        }
    }

    #[test]
    fn rejects_rates_outside_range() {
        for rate in [0, 45, 1000] {
            let writer = FrameWriter::new(RecordingTransport::default());
            let err = Refresher::spawn(writer, DmxFrame::default(), rate)
                .err()
                .expect("rate should be rejected");
            assert!(matches!(err, FrameError::InvalidRate(r) if r == rate));
        }
    }

    #[test]
    fn retransmits_and_picks_up_updates() {
        let transport = RecordingTransport::default();
        let tap = transport.clone();
        let initial = DmxFrame::with_slots(0x00, 2).unwrap();
        let refresher = Refresher::spawn(FrameWriter::new(transport), initial, 44).unwrap();

        wait_for(|| tap.frames().len() >= 2);
        refresher.modify(|frame| frame.set_slot(1, 0xFF)).unwrap();
        wait_for(|| tap.frames().iter().any(|f| f == &[0x00, 0xFF, 0x00]));

        let writer = refresher.stop().unwrap();
        assert!(writer.frames_sent() >= 3);

        let frames = tap.frames();
        assert!(frames.iter().all(|f| f.len() == 3 && f[0] == 0x00));
        let after_stop = frames.len();
        std::thread::sleep(Duration::from_millis(60));
        assert_eq!(tap.frames().len(), after_stop);
    }

    #[test]
    fn transmit_failure_stops_thread_and_surfaces_error() {
        let transport = RecordingTransport {
            fail_writes: true,
            ..RecordingTransport::default()
        };
        let refresher =
            Refresher::spawn(FrameWriter::new(transport), DmxFrame::default(), 40).unwrap();

        wait_for(|| !refresher.is_running());
        assert!(matches!(refresher.stop(), Err(FrameError::Serial(_))));
    }

    #[test]
    fn update_replaces_current_frame() {
        let refresher = Refresher::spawn(
            FrameWriter::new(RecordingTransport::default()),
            DmxFrame::default(),
            10,
        )
        .unwrap();

        let mut next = DmxFrame::with_slots(0x00, 4).unwrap();
        next.set_slots(1, &[1, 2, 3, 4]).unwrap();
        refresher.update(next.clone());
        assert_eq!(refresher.current(), next);
    }
}
