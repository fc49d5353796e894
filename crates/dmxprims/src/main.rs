mod cmd;
mod exit;
mod logging;
mod output;

use clap::Parser;

use crate::cmd::{Command, LineOptions};
use crate::logging::{init_logging, LogFormat, LogLevel};
use crate::output::OutputFormat;

#[derive(Parser, Debug)]
#[command(name = "dmxprims", version, about = "DMX512 serial line CLI")]
struct Cli {
    /// Output format.
    #[arg(long, value_name = "FORMAT", global = true)]
    format: Option<OutputFormat>,

    /// Log output format (stderr).
    #[arg(long, value_name = "FORMAT", default_value = "text", global = true)]
    log_format: LogFormat,

    /// Minimum log level (stderr).
    #[arg(
        long,
        value_name = "LEVEL",
        env = "DMXPRIMS_LOG_LEVEL",
        default_value = "info",
        global = true
    )]
    log_level: LogLevel,

    #[command(flatten)]
    line: LineOptions,

    #[command(subcommand)]
    command: Command,
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.log_format, cli.log_level);

    let format = cli.format.unwrap_or_else(OutputFormat::default_for_stdout);
    let result = cmd::run(cli.command, cli.line, format);

    match result {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("error: {err}");
            std::process::exit(err.code);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_send_subcommand() {
        let cli = Cli::try_parse_from([
            "dmxprims",
            "send",
            "/dev/ttyUSB0",
            "--start-code",
            "0x00",
            "--slots",
            "1=255,2=128",
            "--width",
            "24",
        ])
        .expect("send args should parse");

        let Command::Send(args) = cli.command else {
            panic!("expected send");
        };
        assert_eq!(args.slots, vec![(1, 255), (2, 128)]);
        assert_eq!(args.width, Some(24));
        assert_eq!(args.count, 1);
    }

    #[test]
    fn rejects_hold_with_count() {
        let err = Cli::try_parse_from([
            "dmxprims",
            "send",
            "/dev/ttyUSB0",
            "--hold",
            "--count",
            "5",
        ])
        .expect_err("conflicting args should fail");

        assert_eq!(err.kind(), clap::error::ErrorKind::ArgumentConflict);
    }

    #[test]
    fn line_timing_flags_are_global() {
        let cli = Cli::try_parse_from([
            "dmxprims",
            "blackout",
            "COM3",
            "--break-us",
            "200",
            "--mab-us",
            "16",
        ])
        .expect("timing flags should parse after the subcommand");
        assert_eq!(cli.line.break_us, 200);
        assert_eq!(cli.line.mab_us, 16);
        assert!(matches!(cli.command, Command::Blackout(_)));
    }

    #[test]
    fn parses_monitor_subcommand() {
        let cli = Cli::try_parse_from([
            "dmxprims",
            "monitor",
            "/dev/ttyUSB0",
            "--count",
            "3",
            "--idle-timeout",
            "500ms",
        ])
        .expect("monitor args should parse");
        let Command::Monitor(args) = cli.command else {
            panic!("expected monitor");
        };
        assert_eq!(args.count, Some(3));
        assert_eq!(
            args.idle_timeout,
            Some(std::time::Duration::from_millis(500))
        );
    }

    #[test]
    fn rejects_zero_monitor_count() {
        let err = Cli::try_parse_from(["dmxprims", "monitor", "/dev/ttyUSB0", "--count", "0"])
            .expect_err("zero count should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }

    #[test]
    fn rejects_bad_slot_assignment() {
        let err = Cli::try_parse_from(["dmxprims", "send", "/dev/ttyUSB0", "--slots", "1:255"])
            .expect_err("bad assignment should fail");
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
