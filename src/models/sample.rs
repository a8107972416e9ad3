//! A single throughput measurement

use crate::models::Endpoint;
use crate::types::{AppError, Direction};

/// Result of one tool invocation against one endpoint in one direction.
///
/// Samples are transient: built by the runner, consumed by the emitter.
#[derive(Debug)]
pub struct MeasurementSample {
    pub endpoint: Endpoint,
    pub direction: Direction,
    /// Combined stdout/stderr of the tool
    pub raw_output: String,
    /// Unix seconds at which the measurement finished
    pub timestamp: i64,
    /// Throughput in bits per second, or why none is available
    pub outcome: Result<u64, AppError>,
}

impl MeasurementSample {
    pub fn success(endpoint: Endpoint, direction: Direction, raw_output: String, timestamp: i64, bits_per_second: u64) -> Self {
        Self { endpoint, direction, raw_output, timestamp, outcome: Ok(bits_per_second) }
    }

    pub fn failure(endpoint: Endpoint, direction: Direction, raw_output: String, timestamp: i64, error: AppError) -> Self {
        Self { endpoint, direction, raw_output, timestamp, outcome: Err(error) }
    }

    pub fn is_success(&self) -> bool {
        self.outcome.is_ok()
    }

    pub fn bits_per_second(&self) -> Option<u64> {
        self.outcome.as_ref().ok().copied()
    }

    pub fn error(&self) -> Option<&AppError> {
        self.outcome.as_ref().err()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sample_accessors() {
        let endpoint = Endpoint::new("10.0.0.5", "branch-a");
        let ok = MeasurementSample::success(endpoint.clone(), Direction::Download, "500".into(), 1, 500_000);
        assert!(ok.is_success());
        assert_eq!(ok.bits_per_second(), Some(500_000));
        assert!(ok.error().is_none());

        let failed = MeasurementSample::failure(endpoint, Direction::Upload, "abc".into(), 2, AppError::parse("abc"));
        assert!(!failed.is_success());
        assert_eq!(failed.bits_per_second(), None);
        assert!(matches!(failed.error(), Some(AppError::Parse(_))));
    }
}
