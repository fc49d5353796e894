use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use dmxprims_frame::FrameReader;
use dmxprims_serial::{BreakTiming, SerialPort};
use tracing::{debug, info};

use crate::cmd::{install_ctrlc_handler, MonitorArgs};
use crate::exit::{frame_error, serial_error, CliResult, SUCCESS, TIMEOUT};
use crate::output::{print_chunk, OutputFormat};

/// Sleep between empty polls; well under one frame time at 250 kbaud.
const POLL_INTERVAL: Duration = Duration::from_millis(1);

pub fn run(args: MonitorArgs, timing: BreakTiming, format: OutputFormat) -> CliResult<i32> {
    let port = SerialPort::open_with_timing(&args.port, timing)
        .map_err(|err| serial_error("open failed", err))?;
    let mut reader = FrameReader::new(port);

    let running = Arc::new(AtomicBool::new(true));
    install_ctrlc_handler(running.clone())?;
    info!(port = %args.port, "monitoring");

    let mut received = 0u64;
    let mut last_activity = Instant::now();
    while running.load(Ordering::SeqCst) {
        let chunk = reader
            .poll()
            .map_err(|err| frame_error("receive failed", err))?;

        match chunk {
            Some(chunk) => {
                received += 1;
                last_activity = Instant::now();
                print_chunk(chunk, received, format);
                if args.count.is_some_and(|count| received >= count) {
                    break;
                }
            }
            None => {
                if let Some(timeout) = args.idle_timeout {
                    if last_activity.elapsed() >= timeout {
                        debug!(received, ?timeout, "line idle");
                        return Ok(idle_exit_code(received));
                    }
                }
                std::thread::sleep(POLL_INTERVAL);
            }
        }
    }

    info!(received, "monitor stopped");
    Ok(SUCCESS)
}

/// Going idle after traffic is a normal end; never seeing any is a timeout.
fn idle_exit_code(received: u64) -> i32 {
    if received == 0 {
        TIMEOUT
    } else {
        SUCCESS
    }
}
