//! Measurement tool command lines and output reduction

use crate::error::{AppError, Result};
use crate::types::{Direction, ToolKind};

/// Substrings that mark a tool-level failure in iperf3 output
const IPERF_FAILURE_SENTINELS: &[&str] = &["error"];

/// netperf reports failures through its own diagnostics instead
const NETPERF_FAILURE_SENTINELS: &[&str] = &["establish control", "netperf:"];

/// Build the argument list for one test
pub fn tool_args(tool: ToolKind, direction: Direction, address: &str, port: u16, duration_secs: u64) -> Vec<String> {
    let mut args: Vec<String> = Vec::with_capacity(14);

    match tool {
        ToolKind::Iperf3 => {
            args.extend(["-P", "1"].map(String::from));
            if direction == Direction::Upload {
                args.push("-R".to_string());
            }
            args.extend([
                "-t".to_string(), duration_secs.to_string(),
                "-f".to_string(), "k".to_string(),
                "-p".to_string(), port.to_string(),
                "-c".to_string(), address.to_string(),
            ]);
        }
        ToolKind::Netperf => {
            args.extend([
                "-P".to_string(), "0".to_string(),
                "-t".to_string(), "TCP_STREAM".to_string(),
                "-l".to_string(), duration_secs.to_string(),
                "-f".to_string(), "k".to_string(),
                "-p".to_string(), port.to_string(),
                "-H".to_string(), address.to_string(),
            ]);
        }
    }

    args
}

pub fn failure_sentinels(tool: ToolKind) -> &'static [&'static str] {
    match tool {
        ToolKind::Iperf3 => IPERF_FAILURE_SENTINELS,
        ToolKind::Netperf => NETPERF_FAILURE_SENTINELS,
    }
}

/// True if the output carries one of the tool's failure markers
pub fn contains_failure(tool: ToolKind, output: &str) -> bool {
    failure_sentinels(tool).iter().any(|sentinel| output.contains(sentinel))
}

/// Pick the throughput token out of the tool's output.
///
/// The last data line counts: blank lines and iperf3's trailing
/// `iperf Done.` are skipped, which lands on the `receiver` summary for
/// iperf3 and on the result row for netperf. Within the line the token
/// before the `Kbits/sec` unit is taken, or the last token when no unit is
/// printed.
pub fn extract_throughput(output: &str) -> Option<&str> {
    let line = output
        .lines()
        .map(str::trim)
        .rev()
        .find(|line| !line.is_empty() && !line.starts_with("iperf Done"))?;

    let tokens: Vec<&str> = line.split_whitespace().collect();
    match tokens.iter().position(|token| token.ends_with("bits/sec")) {
        Some(0) => None,
        Some(unit) => Some(tokens[unit - 1]),
        None => tokens.last().copied(),
    }
}

/// Convert a kilobits/sec reading to whole bits/sec.
///
/// The reading is rounded to the nearest kilobit (halves away from zero)
/// before scaling.
pub fn kbits_to_bits(kbps: &str) -> Result<u64> {
    let value: f64 = kbps.trim().parse()
        .map_err(|_| AppError::parse(format!("Throughput '{}' is not a number", kbps)))?;

    if !value.is_finite() || value < 0.0 {
        return Err(AppError::parse(format!("Throughput '{}' is not a valid rate", kbps)));
    }

    // Float-to-int casts saturate, so only the multiplication can overflow
    (value.round() as u64)
        .checked_mul(1000)
        .ok_or_else(|| AppError::parse(format!("Throughput '{}' is out of range", kbps)))
}
