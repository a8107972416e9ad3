//! Environment variable handling and .env file loading

use crate::error::Result;
use std::path::Path;

/// Environment variable configuration manager
pub struct EnvManager;

impl EnvManager {
    /// Load `path` into the process environment if it exists.
    ///
    /// Must run before the command line is parsed so the `CBW_*` variables
    /// it defines act as flag defaults. Variables already set in the
    /// environment win over the file.
    pub fn load_env_file(path: &Path) -> Result<bool> {
        if !path.exists() {
            return Ok(false);
        }

        dotenv::from_path(path)?;
        Ok(true)
    }

    /// Get list of all supported environment variables with descriptions
    pub fn get_supported_env_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("CBW_CONFIG", "Path to the configuration file"),
            ("CBW_IMAGE", "Container image holding the measurement tool"),
            ("CBW_ENDPOINTS", "Extra endpoints, comma-separated addr[:name]"),
            ("CBW_METRICS_HOST", "Metrics backend host"),
            ("CBW_METRICS_PORT", "Metrics backend port"),
            ("CBW_INTERVAL", "Seconds between measurement cycles"),
            ("CBW_DURATION", "Length of each test in seconds"),
            ("CBW_SERVER_PORT", "Measurement server port"),
            ("CBW_DOWNLOAD_PREFIX", "Metric prefix for download results"),
            ("CBW_UPLOAD_PREFIX", "Metric prefix for upload results"),
            ("CBW_TOOL_PATH", "Measurement binary used with --nocontainer"),
            ("CBW_LOG_FORMAT", "Log output format (console|json)"),
        ]
    }

    /// Names of supported variables currently set in the environment
    pub fn active_env_vars() -> Vec<&'static str> {
        Self::get_supported_env_vars()
            .into_iter()
            .map(|(name, _)| name)
            .filter(|name| std::env::var(name).is_ok())
            .collect()
    }
}
