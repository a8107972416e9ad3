//! Resolved run configuration and validation

use crate::models::Endpoint;
use crate::types::{AppError, Direction, Result, ToolKind};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Address of the line-protocol metrics backend
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsTarget {
    pub host: String,
    pub port: u16,
}

impl MetricsTarget {
    pub fn new<S: Into<String>>(host: S, port: u16) -> Self {
        Self { host: host.into(), port }
    }
}

impl fmt::Display for MetricsTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // IPv6 literals need brackets to stay unambiguous next to the port
        if self.host.contains(':') && !self.host.starts_with('[') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// One fully-resolved configuration for a measurement cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Length of each bandwidth test in seconds
    pub test_duration_secs: u64,

    /// Pause between measurement cycles in seconds
    pub interval_secs: u64,

    /// Port the measurement server listens on at every endpoint
    pub server_port: u16,

    /// Metrics backend; `None` disables emission
    pub metrics: Option<MetricsTarget>,

    pub download_prefix: String,
    pub upload_prefix: String,

    /// Endpoints in test order
    pub endpoints: Vec<Endpoint>,

    /// Measurement tool in use
    pub tool: ToolKind,

    /// Log command lines and outgoing metric lines
    pub debug: bool,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self::for_tool(ToolKind::Iperf3)
    }
}

impl RunConfig {
    /// Defaults for the given tool, with no endpoints and no metrics backend
    pub fn for_tool(tool: ToolKind) -> Self {
        Self {
            test_duration_secs: crate::defaults::DEFAULT_TEST_DURATION_SECS,
            interval_secs: crate::defaults::DEFAULT_INTERVAL_SECS,
            server_port: tool.default_server_port(),
            metrics: None,
            download_prefix: crate::defaults::DEFAULT_DOWNLOAD_PREFIX.to_string(),
            upload_prefix: crate::defaults::DEFAULT_UPLOAD_PREFIX.to_string(),
            endpoints: Vec::new(),
            tool,
            debug: false,
        }
    }

    /// Get the poll interval as Duration
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Get the test duration as Duration
    pub fn test_duration(&self) -> Duration {
        Duration::from_secs(self.test_duration_secs)
    }

    /// Metric prefix for a direction
    pub fn prefix(&self, direction: Direction) -> &str {
        match direction {
            Direction::Download => &self.download_prefix,
            Direction::Upload => &self.upload_prefix,
        }
    }

    /// Full metric name, `<prefix>.<endpoint name>`
    pub fn metric_name(&self, direction: Direction, endpoint: &Endpoint) -> String {
        format!("{}.{}", self.prefix(direction), endpoint.name)
    }

    /// Validate the configuration and return any errors
    pub fn validate(&self) -> Result<()> {
        if self.test_duration_secs == 0 {
            return Err(AppError::config("Test duration must be greater than 0"));
        }

        if self.server_port == 0 {
            return Err(AppError::config("Server port must be greater than 0"));
        }

        if self.download_prefix.trim().is_empty() {
            return Err(AppError::config("Download metric prefix cannot be empty"));
        }

        if self.upload_prefix.trim().is_empty() {
            return Err(AppError::config("Upload metric prefix cannot be empty"));
        }

        if let Some(metrics) = &self.metrics {
            if metrics.host.trim().is_empty() {
                return Err(AppError::config("Metrics host cannot be empty"));
            }
            if metrics.port == 0 {
                return Err(AppError::config("Metrics port must be greater than 0"));
            }
        }

        Ok(())
    }
}
