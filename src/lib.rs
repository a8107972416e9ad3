//! Cloud Bandwidth
//!
//! Periodically measures bandwidth between this host and a set of iperf3 or
//! netperf endpoints and ships every throughput sample to a Graphite-style
//! metrics backend over the plaintext line protocol.

pub mod cli;
pub mod config;
pub mod emitter;
pub mod error;
pub mod logging;
pub mod models;
pub mod runner;
pub mod scheduler;
pub mod types;

// Re-export commonly used types
pub use error::{AppError, Result};
pub use models::{Endpoint, MeasurementSample, MetricsTarget, RunConfig};
pub use scheduler::Scheduler;

/// Application version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
pub const PKG_NAME: &str = env!("CARGO_PKG_NAME");

/// Default configuration values
pub mod defaults {
    use std::time::Duration;

    pub const DEFAULT_CONFIG_PATH: &str = "./config.toml";
    pub const DEFAULT_TEST_DURATION_SECS: u64 = 5;
    pub const DEFAULT_INTERVAL_SECS: u64 = 300;
    pub const DEFAULT_IPERF_PORT: u16 = 5201;
    pub const DEFAULT_NETPERF_PORT: u16 = 12865;
    /// Plaintext line-protocol port of carbon-compatible collectors
    pub const DEFAULT_METRICS_PORT: u16 = 2003;
    pub const DEFAULT_DOWNLOAD_PREFIX: &str = "bandwidth.download";
    pub const DEFAULT_UPLOAD_PREFIX: &str = "bandwidth.upload";
    pub const DEFAULT_IPERF_IMAGE: &str = "networkstatic/iperf3";
    pub const DEFAULT_NETPERF_IMAGE: &str = "networkstatic/netperf";
    pub const METRICS_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
}
