//! Type definitions and aliases

use serde::{Deserialize, Serialize};
use std::fmt;

// Re-export commonly used types
pub use crate::error::{AppError, Result};

/// Direction of a bandwidth test relative to the local host
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Client receives
    Download,
    /// Client sends; the tool runs in reverse mode
    Upload,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Download => "download",
            Direction::Upload => "upload",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// External measurement tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ToolKind {
    /// iperf3, supports reverse-mode upload tests
    #[default]
    Iperf3,
    /// netperf TCP_STREAM, download only
    Netperf,
}

impl ToolKind {
    /// Binary name on the host and inside the container image
    pub fn binary(&self) -> &'static str {
        match self {
            ToolKind::Iperf3 => "iperf3",
            ToolKind::Netperf => "netperf",
        }
    }

    /// Port the counterpart server listens on by default
    pub fn default_server_port(&self) -> u16 {
        match self {
            ToolKind::Iperf3 => crate::defaults::DEFAULT_IPERF_PORT,
            ToolKind::Netperf => crate::defaults::DEFAULT_NETPERF_PORT,
        }
    }

    /// Container image used when none is configured
    pub fn default_image(&self) -> &'static str {
        match self {
            ToolKind::Iperf3 => crate::defaults::DEFAULT_IPERF_IMAGE,
            ToolKind::Netperf => crate::defaults::DEFAULT_NETPERF_IMAGE,
        }
    }

    /// Directions this tool can measure, in test order
    pub fn directions(&self) -> &'static [Direction] {
        match self {
            ToolKind::Iperf3 => &[Direction::Download, Direction::Upload],
            ToolKind::Netperf => &[Direction::Download],
        }
    }
}

impl fmt::Display for ToolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.binary())
    }
}

/// Container runtime used to launch the measurement tool
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContainerRuntime {
    Docker,
    Podman,
}

impl ContainerRuntime {
    /// Detection order at startup
    pub const CANDIDATES: [ContainerRuntime; 2] = [ContainerRuntime::Docker, ContainerRuntime::Podman];

    pub fn command(&self) -> &'static str {
        match self {
            ContainerRuntime::Docker => "docker",
            ContainerRuntime::Podman => "podman",
        }
    }
}

/// How the measurement tool is started
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LaunchMode {
    /// Run a binary from the host
    Local { binary: String },
    /// Run a throwaway container (`run -i --rm`) of `image`
    Container { runtime: ContainerRuntime, image: String },
}

/// Scheduler loop state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    /// Iterating endpoints and directions
    Measuring,
    /// Waiting out the poll interval
    Sleeping,
}
