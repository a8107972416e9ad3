//! Configuration validation utilities and rules

use crate::models::RunConfig;
use std::collections::HashSet;

/// Configuration validator producing non-fatal warnings.
///
/// Expects a config that already passed `RunConfig::validate`.
pub struct ConfigValidator;

impl ConfigValidator {
    /// Validate configuration with comprehensive checks
    pub fn validate_comprehensive(config: &RunConfig) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        warnings.extend(Self::validate_endpoints(config));
        warnings.extend(Self::validate_schedule(config));

        if config.metrics.is_none() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                "No metrics backend configured (grafana-address / --metrics-host); results will only be logged".to_string(),
            ));
        }

        warnings
    }

    fn validate_endpoints(config: &RunConfig) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.endpoints.is_empty() {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                "No endpoints configured; nothing will be measured".to_string(),
            ));
            return warnings;
        }

        let mut seen_names = HashSet::new();
        for endpoint in &config.endpoints {
            if !endpoint.is_ip_literal() {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("Endpoint '{}' is not an IP address; it will be resolved by the measurement tool", endpoint.address),
                ));
            }

            // The name becomes part of a whitespace-separated plaintext line
            if endpoint.name.chars().any(char::is_whitespace) {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Warning,
                    format!("Endpoint name '{}' contains whitespace; its metric lines will be malformed", endpoint.name),
                ));
            }

            if !seen_names.insert(endpoint.name.as_str()) {
                warnings.push(ValidationWarning::new(
                    ValidationLevel::Info,
                    format!("Endpoint name '{}' is used more than once; their samples share a metric name", endpoint.name),
                ));
            }
        }

        warnings
    }

    fn validate_schedule(config: &RunConfig) -> Vec<ValidationWarning> {
        let mut warnings = Vec::new();

        if config.interval_secs == 0 {
            warnings.push(ValidationWarning::new(
                ValidationLevel::Warning,
                "Poll interval is 0; cycles will run back to back".to_string(),
            ));
        }

        warnings
    }
}

/// Severity of a validation finding
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationLevel {
    Info,
    Warning,
}

/// A non-fatal validation finding
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationWarning {
    pub level: ValidationLevel,
    pub message: String,
}

impl ValidationWarning {
    /// Create a new validation warning
    pub fn new(level: ValidationLevel, message: String) -> Self {
        Self { level, message }
    }
}

/// Convenience function for comprehensive configuration validation
pub fn validate_config(config: &RunConfig) -> Vec<ValidationWarning> {
    ConfigValidator::validate_comprehensive(config)
}
