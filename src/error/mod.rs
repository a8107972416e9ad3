//! Error handling for the bandwidth monitor

use thiserror::Error;

/// Custom error types for the bandwidth monitor
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration-related errors (malformed document, invalid values)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Host environment cannot run measurements (no container runtime, no binary)
    #[error("Environment error: {0}")]
    Environment(String),

    /// The measurement tool could not be run or exited unsuccessfully
    #[error("Process error: {0}")]
    Process(String),

    /// The measurement tool reported its own failure in its output
    #[error("Measurement tool error: {0}")]
    ToolFailure(String),

    /// Metrics backend connectivity errors
    #[error("Network error: {0}")]
    Network(String),

    /// Timeout errors
    #[error("Timeout error: {0}")]
    Timeout(String),

    /// I/O errors (file operations, etc.)
    #[error("I/O error: {0}")]
    Io(String),

    /// Parsing errors (tool output, numbers)
    #[error("Parsing error: {0}")]
    Parse(String),
}

impl AppError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config(message.into())
    }

    /// Create a new environment error
    pub fn environment<S: Into<String>>(message: S) -> Self {
        Self::Environment(message.into())
    }

    /// Create a new process error
    pub fn process<S: Into<String>>(message: S) -> Self {
        Self::Process(message.into())
    }

    /// Create a new tool failure error
    pub fn tool_failure<S: Into<String>>(message: S) -> Self {
        Self::ToolFailure(message.into())
    }

    /// Create a new network error
    pub fn network<S: Into<String>>(message: S) -> Self {
        Self::Network(message.into())
    }

    /// Create a new timeout error
    pub fn timeout<S: Into<String>>(message: S) -> Self {
        Self::Timeout(message.into())
    }

    /// Create a new I/O error
    pub fn io<S: Into<String>>(message: S) -> Self {
        Self::Io(message.into())
    }

    /// Create a new parsing error
    pub fn parse<S: Into<String>>(message: S) -> Self {
        Self::Parse(message.into())
    }

    /// Get error category for logging and reporting
    pub fn category(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG",
            Self::Environment(_) => "ENV",
            Self::Process(_) => "PROCESS",
            Self::ToolFailure(_) => "TOOL",
            Self::Network(_) => "NETWORK",
            Self::Timeout(_) => "TIMEOUT",
            Self::Io(_) => "IO",
            Self::Parse(_) => "PARSE",
        }
    }

    /// Check if the error only costs a single sample; the loop keeps going
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Process(_) | Self::ToolFailure(_) | Self::Network(_) | Self::Timeout(_) | Self::Parse(_) => true,
            Self::Config(_) | Self::Environment(_) | Self::Io(_) => false,
        }
    }

    /// Get user-friendly error message with suggestions
    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::Config(msg) => {
                format!("Configuration problem: {}\n\nSuggestion: Check the configuration file (--config) and command line arguments.", msg)
            }
            Self::Environment(msg) => {
                format!("Environment problem: {}\n\nSuggestion: Install docker or podman, or use --nocontainer to run the measurement binary from the host.", msg)
            }
            Self::Process(msg) => {
                format!("Measurement tool failed: {}\n\nSuggestion: Run the tool by hand with --debug to see the exact command line.", msg)
            }
            Self::ToolFailure(msg) => {
                format!("Measurement tool reported an error: {}\n\nSuggestion: Verify the measurement server is running and reachable.", msg)
            }
            Self::Network(msg) => {
                format!("Metrics backend unreachable: {}\n\nSuggestion: Verify the metrics server is running and reachable.", msg)
            }
            Self::Timeout(msg) => {
                format!("Operation timed out: {}\n\nSuggestion: Check firewall rules between this host and the target.", msg)
            }
            Self::Io(msg) => {
                format!("File operation failed: {}\n\nSuggestion: Check file permissions and paths.", msg)
            }
            Self::Parse(msg) => {
                format!("Failed to parse data: {}\n\nSuggestion: The measurement tool output format may have changed.", msg)
            }
        }
    }

    /// Get exit code for this error type
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) | Self::Parse(_) => 1,  // Invalid configuration/usage
            Self::Environment(_) => 2,  // Missing runtime or tool
            Self::Process(_) | Self::ToolFailure(_) => 3,
            Self::Network(_) | Self::Timeout(_) => 4,
            Self::Io(_) => 5,
        }
    }

    /// Format error for console display with color coding
    pub fn format_for_console(&self, use_color: bool) -> String {
        let category = self.category();
        let message = self.to_string();

        if use_color {
            use colored::Colorize;
            match self {
                Self::Config(_) | Self::Parse(_) => {
                    format!("[{}] {}", category.red().bold(), message.red())
                }
                Self::Environment(_) => {
                    format!("[{}] {}", category.magenta().bold(), message.magenta())
                }
                Self::Network(_) | Self::Timeout(_) => {
                    format!("[{}] {}", category.yellow().bold(), message.yellow())
                }
                Self::Process(_) | Self::ToolFailure(_) | Self::Io(_) => {
                    format!("[{}] {}", category.cyan().bold(), message.cyan())
                }
            }
        } else {
            format!("[{}] {}", category, message)
        }
    }
}

// Standard library error conversions
impl From<std::io::Error> for AppError {
    fn from(error: std::io::Error) -> Self {
        if error.kind() == std::io::ErrorKind::TimedOut {
            Self::timeout(error.to_string())
        } else {
            Self::io(error.to_string())
        }
    }
}

impl From<toml::de::Error> for AppError {
    fn from(error: toml::de::Error) -> Self {
        Self::config(format!("TOML parse error: {}", error))
    }
}

impl From<dotenv::Error> for AppError {
    fn from(error: dotenv::Error) -> Self {
        Self::config(format!("Environment file error: {}", error))
    }
}

/// Custom Result type for the application
pub type Result<T> = std::result::Result<T, AppError>;
