//! Command-line interface

use crate::logging::LogFormat;
use crate::types::ToolKind;
use clap::Parser;
use std::path::PathBuf;

/// Cloud Bandwidth - periodic iperf3/netperf measurements shipped to a metrics backend
#[derive(Parser, Debug, Clone)]
#[command(name = "cbandwidth")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to the configuration file
    #[arg(long, env = "CBW_CONFIG", default_value = crate::defaults::DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Container image holding the measurement tool
    #[arg(long, env = "CBW_IMAGE")]
    pub image: Option<String>,

    /// Extra endpoints as comma-separated addr[:name] pairs
    #[arg(long, env = "CBW_ENDPOINTS", value_name = "ADDR[:NAME],...")]
    pub endpoints: Option<String>,

    /// Metrics backend host
    #[arg(long, env = "CBW_METRICS_HOST")]
    pub metrics_host: Option<String>,

    /// Metrics backend port
    #[arg(long, env = "CBW_METRICS_PORT")]
    pub metrics_port: Option<u16>,

    /// Seconds to wait between measurement cycles
    #[arg(long, env = "CBW_INTERVAL")]
    pub interval: Option<u64>,

    /// Length of each bandwidth test in seconds
    #[arg(long, env = "CBW_DURATION", value_parser = parse_duration)]
    pub duration: Option<u64>,

    /// Port of the measurement server on every endpoint
    #[arg(long, env = "CBW_SERVER_PORT")]
    pub server_port: Option<u16>,

    /// Metric prefix for download results
    #[arg(long, env = "CBW_DOWNLOAD_PREFIX")]
    pub download_prefix: Option<String>,

    /// Metric prefix for upload results
    #[arg(long, env = "CBW_UPLOAD_PREFIX")]
    pub upload_prefix: Option<String>,

    /// Measure with netperf instead of iperf3 (download only)
    #[arg(long)]
    pub netperf: bool,

    /// Run the measurement binary from the host instead of a container
    #[arg(long = "nocontainer")]
    pub no_container: bool,

    /// Measurement binary to run with --nocontainer
    #[arg(long, env = "CBW_TOOL_PATH", requires = "no_container")]
    pub tool_path: Option<String>,

    /// Log every command line and outgoing metric line
    #[arg(long)]
    pub debug: bool,

    /// Run a single measurement cycle and exit
    #[arg(long)]
    pub once: bool,

    /// Log output format
    #[arg(long, env = "CBW_LOG_FORMAT", value_enum, default_value_t = LogFormat::Console)]
    pub log_format: LogFormat,

    /// Disable colored log output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Measurement tool selected on the command line
    pub fn tool(&self) -> ToolKind {
        if self.netperf {
            ToolKind::Netperf
        } else {
            ToolKind::Iperf3
        }
    }

    /// Check if colors should be enabled
    pub fn use_colors(&self) -> bool {
        !self.no_color && std::env::var("NO_COLOR").is_err()
    }
}

/// Parse a test duration in seconds
fn parse_duration(s: &str) -> Result<u64, String> {
    if s.starts_with('+') || s.starts_with("0x") || s.starts_with("0X") {
        return Err(format!("Invalid duration: {}", s));
    }

    s.parse::<u64>()
        .map_err(|_| format!("Invalid duration: {}", s))
        .and_then(|secs| {
            if secs == 0 {
                Err("Duration must be greater than 0".to_string())
            } else {
                Ok(secs)
            }
        })
}
