use clap::{Args, Subcommand};
use dmxprims_frame::DEFAULT_RATE_HZ;
use dmxprims_serial::{timing, BreakTiming};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::exit::{serial_error, CliError, CliResult, INTERNAL};
use crate::output::OutputFormat;

pub mod blackout;
pub mod doctor;
pub mod monitor;
pub mod send;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build a frame and transmit it.
    Send(SendArgs),
    /// Transmit an all-zero 512-slot frame.
    Blackout(BlackoutArgs),
    /// Print bytes received on the line.
    Monitor(MonitorArgs),
    /// Show version information.
    Version(VersionArgs),
    /// Report the serial backend, timing and (optionally) test-open a port.
    Doctor(DoctorArgs),
}

pub fn run(command: Command, line: LineOptions, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Send(args) => send::run(args, line.timing()?, format),
        Command::Blackout(args) => blackout::run(args, line.timing()?, format),
        Command::Monitor(args) => monitor::run(args, line.timing()?, format),
        Command::Version(args) => version::run(args),
        Command::Doctor(args) => doctor::run(args, line, format),
    }
}

/// BREAK/MAB tunables shared by every command that opens a port.
#[derive(Args, Debug, Clone, Copy)]
pub struct LineOptions {
    /// BREAK duration in microseconds (88..=1000000).
    #[arg(
        long,
        value_name = "US",
        env = "DMXPRIMS_BREAK_US",
        default_value_t = timing::DEFAULT_BREAK.as_micros() as u64,
        global = true
    )]
    pub break_us: u64,

    /// Mark-After-Break duration in microseconds (8..=1000000).
    #[arg(
        long,
        value_name = "US",
        env = "DMXPRIMS_MAB_US",
        default_value_t = timing::DEFAULT_MARK_AFTER_BREAK.as_micros() as u64,
        global = true
    )]
    pub mab_us: u64,
}

impl LineOptions {
    pub fn timing(&self) -> CliResult<BreakTiming> {
        BreakTiming::from_micros(self.break_us, self.mab_us)
            .map_err(|err| serial_error("invalid line timing", err))
    }
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Serial device (e.g. /dev/ttyUSB0, COM3).
    #[arg(env = "DMXPRIMS_PORT")]
    pub port: String,
    /// Start code (decimal or 0x-prefixed hex).
    #[arg(long, default_value = "0x00", value_parser = parse_byte)]
    pub start_code: u8,
    /// Slot values from slot 1 on (comma-separated).
    #[arg(long, value_delimiter = ',')]
    pub values: Vec<u8>,
    /// Individual slot assignments, applied after --values (e.g. 1=255,2=128).
    #[arg(long, value_delimiter = ',', value_parser = parse_assignment)]
    pub slots: Vec<(usize, u8)>,
    /// Slots per frame (default: 512).
    #[arg(long, value_name = "N")]
    pub width: Option<usize>,
    /// Number of frames to transmit.
    #[arg(long, default_value_t = 1, conflicts_with = "hold")]
    pub count: u64,
    /// Frames per second (1..=44).
    #[arg(long, default_value_t = DEFAULT_RATE_HZ)]
    pub rate: u32,
    /// Keep refreshing until interrupted.
    #[arg(long)]
    pub hold: bool,
    /// Give up on a frame when the line accepts nothing for this long (e.g. 100ms).
    #[arg(long, default_value = "100ms", value_parser = parse_duration)]
    pub stall_timeout: Duration,
}

#[derive(Args, Debug)]
pub struct BlackoutArgs {
    /// Serial device (e.g. /dev/ttyUSB0, COM3).
    #[arg(env = "DMXPRIMS_PORT")]
    pub port: String,
    /// Number of frames to transmit.
    #[arg(long, default_value_t = 1)]
    pub count: u64,
    /// Frames per second (1..=44).
    #[arg(long, default_value_t = DEFAULT_RATE_HZ)]
    pub rate: u32,
}

#[derive(Args, Debug)]
pub struct MonitorArgs {
    /// Serial device (e.g. /dev/ttyUSB0, COM3).
    #[arg(env = "DMXPRIMS_PORT")]
    pub port: String,
    /// Exit after receiving N chunks.
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub count: Option<u64>,
    /// Exit when the line stays quiet this long (e.g. 5s, 500ms).
    #[arg(long, value_parser = parse_duration)]
    pub idle_timeout: Option<Duration>,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build provenance.
    #[arg(long)]
    pub extended: bool,
}

#[derive(Args, Debug, Default)]
pub struct DoctorArgs {
    /// Serial device to check with an open/configure/close cycle.
    #[arg(env = "DMXPRIMS_PORT")]
    pub port: Option<String>,
}

/// Parse `255`, `0xff` or `0xFF`.
pub fn parse_byte(input: &str) -> Result<u8, String> {
    let input = input.trim();
    let parsed = match input
        .strip_prefix("0x")
        .or_else(|| input.strip_prefix("0X"))
    {
        Some(hex) => u8::from_str_radix(hex, 16),
        None => input.parse(),
    };
    parsed.map_err(|_| format!("invalid byte value: {input} (expected 0..=255 or 0x00..=0xFF)"))
}

/// Parse `SLOT=VALUE`.
pub fn parse_assignment(input: &str) -> Result<(usize, u8), String> {
    let (slot, value) = input
        .split_once('=')
        .ok_or_else(|| format!("invalid slot assignment: {input} (expected SLOT=VALUE)"))?;
    let slot: usize = slot
        .trim()
        .parse()
        .map_err(|_| format!("invalid slot number: {slot}"))?;
    Ok((slot, parse_byte(value)?))
}

pub fn parse_duration(input: &str) -> Result<Duration, String> {
    let input = input.trim();
    if input.is_empty() {
        return Err("duration must not be empty".to_string());
    }

    let (number, unit) = if let Some(num) = input.strip_suffix("ms") {
        (num, "ms")
    } else if let Some(num) = input.strip_suffix('s') {
        (num, "s")
    } else {
        (input, "s")
    };

    let value: u64 = number
        .parse()
        .map_err(|_| format!("invalid duration value: {input}"))?;

    if value == 0 {
        return Err("duration must be greater than zero".to_string());
    }

    match unit {
        "ms" => Ok(Duration::from_millis(value)),
        _ => Ok(Duration::from_secs(value)),
    }
}

/// Clear `running` on Ctrl-C.
pub(crate) fn install_ctrlc_handler(running: Arc<AtomicBool>) -> CliResult<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .map_err(|err| CliError::new(INTERNAL, format!("signal handler setup failed: {err}")))
}
