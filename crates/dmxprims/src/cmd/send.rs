use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dmxprims_frame::{
    DmxFrame, FrameError, FrameWriter, Refresher, StartCode, WriterConfig, MAX_RATE_HZ,
    SLOT_COUNT,
};
use dmxprims_serial::{BreakTiming, SerialPort};
use tracing::{debug, info};

use crate::cmd::{install_ctrlc_handler, SendArgs};
use crate::exit::{frame_error, serial_error, CliResult, SUCCESS};
use crate::output::{print_send_summary, OutputFormat, SendSummary};

/// How often `--hold` checks for Ctrl-C and refresh-thread failure.
const HOLD_POLL: Duration = Duration::from_millis(50);

pub fn run(args: SendArgs, timing: BreakTiming, format: OutputFormat) -> CliResult<i32> {
    let frame = build_frame(&args)?;
    let plan = Transmission {
        port: &args.port,
        timing,
        rate_hz: args.rate,
        stall_timeout: args.stall_timeout,
    };

    let frames = if args.hold {
        plan.hold(frame.clone())?
    } else {
        plan.repeat(&frame, args.count)?
    };

    print_send_summary(&plan.summary(&frame, frames), format);
    Ok(SUCCESS)
}

/// Frame from `--start-code`, `--width`, `--values`, then `--slots`.
pub(crate) fn build_frame(args: &SendArgs) -> CliResult<DmxFrame> {
    let width = args.width.unwrap_or(SLOT_COUNT);
    let mut frame = DmxFrame::with_slots(args.start_code, width)
        .map_err(|err| frame_error("invalid --width", err))?;
    frame
        .set_slots(1, &args.values)
        .map_err(|err| frame_error("invalid --values", err))?;
    for &(slot, value) in &args.slots {
        frame
            .set_slot(slot, value)
            .map_err(|err| frame_error("invalid --slots", err))?;
    }
    Ok(frame)
}

/// Where and how fast to send.
pub(crate) struct Transmission<'a> {
    pub port: &'a str,
    pub timing: BreakTiming,
    pub rate_hz: u32,
    pub stall_timeout: Duration,
}

impl Transmission<'_> {
    fn open(&self) -> CliResult<FrameWriter<SerialPort>> {
        if !(1..=MAX_RATE_HZ).contains(&self.rate_hz) {
            return Err(frame_error(
                "invalid --rate",
                FrameError::InvalidRate(self.rate_hz),
            ));
        }
        let port = SerialPort::open_with_timing(self.port, self.timing)
            .map_err(|err| serial_error("open failed", err))?;
        Ok(FrameWriter::with_config(
            port,
            WriterConfig {
                stall_timeout: self.stall_timeout,
            },
        ))
    }

    /// Send `frame` `count` times, paced at the configured rate.
    pub(crate) fn repeat(&self, frame: &DmxFrame, count: u64) -> CliResult<u64> {
        let mut writer = self.open()?;
        let period = Duration::from_secs(1) / self.rate_hz;
        let mut next = Instant::now();

        for sent in 0..count {
            if sent > 0 {
                next += period;
                let now = Instant::now();
                if next > now {
                    std::thread::sleep(next - now);
                }
            }
            writer
                .transmit(frame)
                .map_err(|err| frame_error("transmit failed", err))?;
        }

        let frames = writer.frames_sent();
        info!(port = self.port, frames, "transmission complete");
        Ok(frames)
    }

    /// Refresh `frame` on a dedicated thread until Ctrl-C.
    pub(crate) fn hold(&self, frame: DmxFrame) -> CliResult<u64> {
        let writer = self.open()?;
        let running = Arc::new(AtomicBool::new(true));
        install_ctrlc_handler(running.clone())?;

        let refresher = Refresher::spawn(writer, frame, self.rate_hz)
            .map_err(|err| frame_error("refresh failed to start", err))?;
        info!(port = self.port, rate_hz = self.rate_hz, "holding frame; Ctrl-C to stop");

        while running.load(Ordering::SeqCst) && refresher.is_running() {
            std::thread::sleep(HOLD_POLL);
        }

        let writer = refresher
            .stop()
            .map_err(|err| frame_error("transmit failed", err))?;
        debug!(frames = writer.frames_sent(), "refresh stopped");
        Ok(writer.frames_sent())
    }

    pub(crate) fn summary(&self, frame: &DmxFrame, frames: u64) -> SendSummary {
        let start_code: StartCode = frame.start_code();
        SendSummary {
            schema_id: "https://schemas.3leaps.dev/dmxprims/cli/v1/send-summary.schema.json",
            port: self.port.to_string(),
            start_code: start_code.value(),
            start_code_name: start_code.name(),
            slots: frame.slot_count(),
            frames,
            rate_hz: self.rate_hz,
            break_us: self.timing.break_duration().as_micros() as u64,
            mab_us: self.timing.mark_after_break().as_micros() as u64,
        }
    }
}
