//! Graphite plaintext emission
//!
//! Every sample is sent as `<name> <value> <timestamp>\n` over a fresh TCP
//! connection. Failures are logged and never reach the caller.

use crate::{
    defaults::METRICS_CONNECT_TIMEOUT,
    error::{AppError, Result},
    logging::Logger,
    models::MetricsTarget,
};
use async_trait::async_trait;
use std::fmt;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;

/// One line of the plaintext protocol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricPoint {
    pub name: String,
    pub value: u64,
    /// Unix seconds
    pub timestamp: i64,
}

impl MetricPoint {
    pub fn new<S: Into<String>>(name: S, value: u64, timestamp: i64) -> Self {
        Self { name: name.into(), value, timestamp }
    }

    /// Wire form including the trailing newline
    pub fn to_line(&self) -> String {
        format!("{}\n", self)
    }
}

impl fmt::Display for MetricPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.name, self.value, self.timestamp)
    }
}

/// Destination for metric points
#[async_trait]
pub trait MetricSink: Send + Sync {
    /// Deliver one point; returns whether it was handed to the backend.
    async fn emit(&self, target: Option<&MetricsTarget>, point: &MetricPoint, correlation_id: Option<&str>) -> bool;
}

/// Sink writing to a carbon-compatible TCP listener
pub struct GraphiteEmitter {
    logger: Logger,
    connect_timeout: Duration,
    debug: bool,
}

impl GraphiteEmitter {
    pub fn new(logger: Logger, debug: bool) -> Self {
        Self {
            logger,
            connect_timeout: METRICS_CONNECT_TIMEOUT,
            debug,
        }
    }

    /// Override the connect timeout
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    async fn send(&self, target: &MetricsTarget, line: &str) -> Result<()> {
        let address = (target.host.trim_matches(|c| c == '[' || c == ']'), target.port);

        let mut stream = tokio::time::timeout(self.connect_timeout, TcpStream::connect(address))
            .await
            .map_err(|_| AppError::timeout(format!(
                "Connecting to {} timed out after {}s", target, self.connect_timeout.as_secs()
            )))?
            .map_err(|e| AppError::network(format!("Connecting to {} failed: {}", target, e)))?;

        stream.write_all(line.as_bytes()).await?;
        stream.shutdown().await?;
        Ok(())
    }
}

#[async_trait]
impl MetricSink for GraphiteEmitter {
    async fn emit(&self, target: Option<&MetricsTarget>, point: &MetricPoint, correlation_id: Option<&str>) -> bool {
        let Some(target) = target else {
            self.logger.debug("No metrics server configured, dropping point")
                .maybe_correlation_id(correlation_id)
                .field("metric", point.to_string())
                .log();
            return false;
        };

        let line = point.to_line();
        if self.debug {
            self.logger.info(&format!("Sending -> {}", point))
                .maybe_correlation_id(correlation_id)
                .field("target", target.to_string())
                .log();
        }

        match self.send(target, &line).await {
            Ok(()) => true,
            Err(e) => {
                self.logger.error(&format!("Could not connect to the metrics server -> {}", target))
                    .maybe_correlation_id(correlation_id)
                    .field("metric", &point.name)
                    .error_info(&e)
                    .log();
                false
            }
        }
    }
}
