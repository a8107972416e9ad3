//! Data models for the bandwidth monitor

pub mod config;
pub mod endpoint;
pub mod sample;

// Re-export main model types
pub use config::{MetricsTarget, RunConfig};
pub use endpoint::{Endpoint, EndpointRegistry};
pub use sample::MeasurementSample;
