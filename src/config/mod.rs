//! Configuration management module

pub mod env;
pub mod file;
pub mod parser;
pub mod validation;

// Re-export main functionality
pub use env::EnvManager;
pub use file::ConfigDocument;
pub use parser::{display_config_summary, resolve_config, ConfigResolver, Resolution};
pub use validation::{validate_config, ConfigValidator, ValidationLevel, ValidationWarning};

// Re-export from models for convenience
pub use crate::models::RunConfig;
