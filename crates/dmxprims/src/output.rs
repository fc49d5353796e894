use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use dmxprims_frame::{classify, StartCode};
use serde::Serialize;

/// Slots shown before a hex preview is elided.
const PREVIEW_SLOTS: usize = 32;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct ChunkOutput<'a> {
    schema_id: &'a str,
    index: u64,
    size: usize,
    start_code: Option<u8>,
    start_code_name: Option<&'static str>,
    data: String,
    timestamp: String,
}

/// Print one chunk returned by `read_frame`.
///
/// The first byte is reported as a start code; that only holds when the
/// chunk began right after a BREAK.
pub fn print_chunk(chunk: &[u8], index: u64, format: OutputFormat) {
    let start_code = classify(chunk);
    match format {
        OutputFormat::Json => {
            let out = ChunkOutput {
                schema_id: "https://schemas.3leaps.dev/dmxprims/cli/v1/chunk-received.schema.json",
                index,
                size: chunk.len(),
                start_code: start_code.map(StartCode::value),
                start_code_name: start_code.map(|code| code.name()),
                data: hex(chunk),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["#", "SIZE", "START CODE", "DATA"])
                .add_row(vec![
                    index.to_string(),
                    chunk.len().to_string(),
                    start_code_label(start_code),
                    hex_preview(chunk),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "#{} size={} start_code={} data={}",
                index,
                chunk.len(),
                start_code_label(start_code),
                hex_preview(chunk)
            );
        }
        OutputFormat::Raw => {
            print_raw(chunk);
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SendSummary {
    pub schema_id: &'static str,
    pub port: String,
    pub start_code: u8,
    pub start_code_name: &'static str,
    pub slots: usize,
    pub frames: u64,
    pub rate_hz: u32,
    pub break_us: u64,
    pub mab_us: u64,
}

pub fn print_send_summary(summary: &SendSummary, format: OutputFormat) {
    match format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string(summary).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["PORT", "START CODE", "SLOTS", "FRAMES", "RATE"])
                .add_row(vec![
                    summary.port.clone(),
                    format!("{} (0x{:02X})", summary.start_code_name, summary.start_code),
                    summary.slots.to_string(),
                    summary.frames.to_string(),
                    format!("{} Hz", summary.rate_hz),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "sent {} frame(s) to {} start_code=0x{:02X} slots={} rate={}Hz break={}us mab={}us",
                summary.frames,
                summary.port,
                summary.start_code,
                summary.slots,
                summary.rate_hz,
                summary.break_us,
                summary.mab_us
            );
        }
        OutputFormat::Raw => {
            println!("{}", summary.frames);
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn start_code_label(code: Option<StartCode>) -> String {
    code.map_or_else(|| "-".to_string(), |code| code.to_string())
}

/// Space-separated upper-case hex.
pub fn hex(bytes: &[u8]) -> String {
    let mut out = String::with_capacity(bytes.len() * 3);
    for (i, byte) in bytes.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&format!("{byte:02X}"));
    }
    out
}

fn hex_preview(bytes: &[u8]) -> String {
    if bytes.len() <= PREVIEW_SLOTS {
        return hex(bytes);
    }
    format!(
        "{} … (+{} bytes)",
        hex(&bytes[..PREVIEW_SLOTS]),
        bytes.len() - PREVIEW_SLOTS
    )
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
