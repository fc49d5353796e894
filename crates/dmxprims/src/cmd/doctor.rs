use std::time::{Duration, Instant};

use dmxprims_serial::{backend_name, DmxTransport, SerialPort, BAUD_RATE, DATA_BITS, STOP_BITS};
use serde::Serialize;

use crate::cmd::{DoctorArgs, LineOptions};
use crate::exit::{CliResult, HEALTH_CHECK_FAILED, SUCCESS};
use crate::output::OutputFormat;

#[derive(Clone, Copy, Debug, Serialize)]
#[serde(rename_all = "lowercase")]
enum CheckStatus {
    Pass,
    Fail,
    Warn,
    Info,
    Skip,
}

#[derive(Debug, Serialize)]
struct CheckResult {
    name: String,
    status: CheckStatus,
    detail: String,
}

#[derive(Debug, Serialize)]
struct DoctorOutput {
    schema_id: &'static str,
    checks: Vec<CheckResult>,
    overall: &'static str,
}

pub fn run(args: DoctorArgs, line: LineOptions, format: OutputFormat) -> CliResult<i32> {
    let checks = vec![
        platform_backend_check(),
        line_settings_check(),
        break_timing_check(line),
        sleep_granularity_check(),
        compiled_features_check(),
        port_open_check(args.port.as_deref(), line),
    ];

    let has_fail = checks.iter().any(|c| matches!(c.status, CheckStatus::Fail));
    let overall = if has_fail { "fail" } else { "pass" };

    let output = DoctorOutput {
        schema_id: "https://schemas.3leaps.dev/dmxprims/cli/v1/doctor-report.schema.json",
        checks,
        overall,
    };

    print_doctor(&output, format);

    if has_fail {
        Ok(HEALTH_CHECK_FAILED)
    } else {
        Ok(SUCCESS)
    }
}

fn print_doctor(output: &DoctorOutput, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(output).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table | OutputFormat::Pretty => {
            println!("dmxprims doctor\n");
            for c in &output.checks {
                println!(
                    "  [{:>4}] {:<22} {}",
                    status_text(c.status),
                    c.name,
                    c.detail
                );
            }
            if output.overall == "pass" {
                println!("\n  Result: all checks passed");
            } else {
                println!("\n  Result: one or more checks failed");
            }
        }
        OutputFormat::Raw => {
            println!("{}", output.overall);
        }
    }
}

fn status_text(status: CheckStatus) -> &'static str {
    match status {
        CheckStatus::Pass => "PASS",
        CheckStatus::Fail => "FAIL",
        CheckStatus::Warn => "WARN",
        CheckStatus::Info => "INFO",
        CheckStatus::Skip => "SKIP",
    }
}

fn platform_backend_check() -> CheckResult {
    CheckResult {
        name: "platform_backend".to_string(),
        status: CheckStatus::Info,
        detail: format!("{} ({})", backend_name(), std::env::consts::OS),
    }
}

fn line_settings_check() -> CheckResult {
    CheckResult {
        name: "line_settings".to_string(),
        status: CheckStatus::Info,
        detail: format!("{BAUD_RATE} baud, {DATA_BITS}N{STOP_BITS}, non-blocking"),
    }
}

fn break_timing_check(line: LineOptions) -> CheckResult {
    match line.timing() {
        Ok(timing) => CheckResult {
            name: "break_timing".to_string(),
            status: CheckStatus::Pass,
            detail: format!(
                "BREAK {} us, MAB {} us",
                timing.break_duration().as_micros(),
                timing.mark_after_break().as_micros()
            ),
        },
        Err(err) => CheckResult {
            name: "break_timing".to_string(),
            status: CheckStatus::Fail,
            detail: err.message,
        },
    }
}

/// A 100 us sleep overshooting this is reported as coarse.
const COARSE_SLEEP: Duration = Duration::from_millis(2);

/// Coarse sleeps are why BREAK/MAB below 2 ms are spin-held.
fn sleep_granularity_check() -> CheckResult {
    let requested = Duration::from_micros(100);
    let start = Instant::now();
    std::thread::sleep(requested);
    let actual = start.elapsed();

    let status = if actual > COARSE_SLEEP {
        CheckStatus::Warn
    } else {
        CheckStatus::Info
    };
    CheckResult {
        name: "sleep_granularity".to_string(),
        status,
        detail: format!(
            "sleep({} us) took {} us; sub-2 ms holds spin",
            requested.as_micros(),
            actual.as_micros()
        ),
    }
}

fn compiled_features_check() -> CheckResult {
    let mut features = Vec::new();
    if cfg!(feature = "cli") {
        features.push("cli");
    }

    CheckResult {
        name: "compiled_features".to_string(),
        status: CheckStatus::Info,
        detail: features.join(", "),
    }
}

fn port_open_check(port: Option<&str>, line: LineOptions) -> CheckResult {
    let Some(port) = port else {
        return CheckResult {
            name: "port_open".to_string(),
            status: CheckStatus::Skip,
            detail: "no port given (pass PORT or set DMXPRIMS_PORT)".to_string(),
        };
    };

    let timing = line.timing().unwrap_or_default();
    match SerialPort::open_with_timing(port, timing) {
        Ok(mut serial) => {
            serial.close();
            CheckResult {
                name: "port_open".to_string(),
                status: CheckStatus::Pass,
                detail: format!("{port} opened and configured for DMX512"),
            }
        }
        Err(err) => CheckResult {
            name: "port_open".to_string(),
            status: CheckStatus::Fail,
            detail: err.to_string(),
        },
    }
}
