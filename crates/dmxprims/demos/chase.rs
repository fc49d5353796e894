//! Single-light chase — walks full intensity across the first 8 slots.
//!
//! Run with:
//!   cargo run --example chase -- /dev/ttyUSB0
//!
//! Watch it from a second adapter wired back to the first:
//!   cargo run --features cli -- monitor /dev/ttyUSB1 --count 10

use std::time::Duration;

use dmxprims::frame::{DmxFrame, FrameWriter, Refresher, DEFAULT_RATE_HZ};
use dmxprims::serial::SerialPort;

const WIDTH: usize = 8;
const STEPS: usize = 32;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let port = std::env::args()
        .nth(1)
        .or_else(|| std::env::var("DMXPRIMS_PORT").ok())
        .ok_or("usage: chase <PORT>")?;

    let serial = SerialPort::open(&port)?;
    eprintln!("Opened {port}");

    let refresher = Refresher::spawn(
        FrameWriter::new(serial),
        DmxFrame::default(),
        DEFAULT_RATE_HZ,
    )?;

    for step in 0..STEPS {
        let lit = step % WIDTH + 1;
        refresher.modify(|frame| {
            frame.blackout();
            frame.set_slot(lit, 255)
        })?;
        std::thread::sleep(Duration::from_millis(250));
    }

    refresher.update(DmxFrame::default());
    std::thread::sleep(Duration::from_millis(100));

    let writer = refresher.stop()?;
    eprintln!("Sent {} frames", writer.frames_sent());
    Ok(())
}
