//! Structured logging for the bandwidth monitor
//!
//! This module provides:
//! - Leveled, component-named loggers with a builder for structured fields
//! - Cycle correlation IDs so every line of one measurement pass can be grouped
//! - Console output (optionally colored) or JSON lines for log aggregators
//! - An in-memory capture sink used by tests to assert on emitted entries

use crate::error::AppError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Log level enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LogLevel {
    /// Trace level - most detailed
    Trace = 0,
    /// Debug level - command lines and outgoing metric lines
    Debug = 1,
    /// Info level - measurement results and cycle summaries
    Info = 2,
    /// Warning level - degraded mode (no config file, no metrics backend)
    Warn = 3,
    /// Error level - a sample was lost but the loop continues
    Error = 4,
    /// Fatal level - startup errors that terminate the process
    Fatal = 5,
}

impl LogLevel {
    /// Get log level name as string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "TRACE",
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warn => "WARN",
            LogLevel::Error => "ERROR",
            LogLevel::Fatal => "FATAL",
        }
    }

    fn colorize(&self, text: &str) -> String {
        use colored::Colorize;
        match self {
            LogLevel::Trace => text.white().to_string(),
            LogLevel::Debug => text.cyan().to_string(),
            LogLevel::Info => text.green().to_string(),
            LogLevel::Warn => text.yellow().to_string(),
            LogLevel::Error => text.red().to_string(),
            LogLevel::Fatal => text.magenta().bold().to_string(),
        }
    }
}

/// Log output format options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Human-readable console format
    #[default]
    Console,
    /// JSON format for structured logging
    Json,
}

/// Log entry structure for structured logging
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Timestamp when log entry was created
    pub timestamp: DateTime<Utc>,
    /// Log level
    pub level: LogLevel,
    /// Log message
    pub message: String,
    /// Logger name/component
    pub logger: String,
    /// Correlation ID of the measurement cycle, if any
    pub correlation_id: Option<String>,
    /// Additional structured fields
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl LogEntry {
    /// Look up a structured field rendered as a plain string
    pub fn field_str(&self, key: &str) -> Option<String> {
        self.fields.get(key).map(|value| match value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        })
    }
}

/// Where finished entries are written
#[derive(Debug, Clone)]
enum LogOutput {
    /// stdout for info and below, stderr for warnings and above
    Standard,
    /// Kept in memory, for inspection in tests
    Capture(Arc<Mutex<Vec<LogEntry>>>),
}

/// Handle onto the entries recorded by a capturing logger
#[derive(Debug, Clone)]
pub struct CapturedLogs {
    entries: Arc<Mutex<Vec<LogEntry>>>,
}

impl CapturedLogs {
    /// Snapshot of every entry recorded so far
    pub fn entries(&self) -> Vec<LogEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    /// Entries at exactly the given level
    pub fn at_level(&self, level: LogLevel) -> Vec<LogEntry> {
        self.entries().into_iter().filter(|e| e.level == level).collect()
    }

    /// True if any entry at `level` mentions `needle` in its message or fields
    pub fn contains(&self, level: LogLevel, needle: &str) -> bool {
        self.at_level(level).iter().any(|e| {
            e.message.contains(needle)
                || e.fields.values().any(|v| v.to_string().contains(needle))
        })
    }
}

/// Logger implementation with console and JSON output
#[derive(Debug, Clone)]
pub struct Logger {
    /// Minimum log level to output
    min_level: LogLevel,
    /// Whether to use colored output
    use_color: bool,
    /// Output format
    format: LogFormat,
    /// Logger name
    name: String,
    output: LogOutput,
}

impl Logger {
    /// Create a logger from the command line switches
    pub fn with_settings(name: &str, debug: bool, format: LogFormat, use_color: bool) -> Self {
        Self {
            min_level: if debug { LogLevel::Debug } else { LogLevel::Info },
            use_color,
            format,
            name: name.to_string(),
            output: LogOutput::Standard,
        }
    }

    /// Create a logger that records entries in memory instead of printing them
    pub fn capturing(name: &str) -> (Self, CapturedLogs) {
        let entries = Arc::new(Mutex::new(Vec::new()));
        let logger = Self {
            min_level: LogLevel::Trace,
            use_color: false,
            format: LogFormat::Console,
            name: name.to_string(),
            output: LogOutput::Capture(entries.clone()),
        };
        (logger, CapturedLogs { entries })
    }

    /// Derive a logger for another component sharing level, format and output
    pub fn child(&self, name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..self.clone()
        }
    }

    /// Set minimum log level
    pub fn set_level(&mut self, level: LogLevel) {
        self.min_level = level;
    }

    /// Check if a log level would be output
    pub fn would_log(&self, level: LogLevel) -> bool {
        level >= self.min_level
    }

    /// Create a log entry builder
    pub fn log(&self, level: LogLevel, message: &str) -> LogEntryBuilder<'_> {
        LogEntryBuilder::new(self, level, message.to_string())
    }

    pub fn debug(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Debug, message)
    }

    pub fn info(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Info, message)
    }

    pub fn warn(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Warn, message)
    }

    pub fn error(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Error, message)
    }

    pub fn fatal(&self, message: &str) -> LogEntryBuilder<'_> {
        self.log(LogLevel::Fatal, message)
    }

    fn write_entry(&self, entry: LogEntry) {
        if entry.level < self.min_level {
            return;
        }

        match &self.output {
            LogOutput::Capture(entries) => {
                if let Ok(mut entries) = entries.lock() {
                    entries.push(entry);
                }
            }
            LogOutput::Standard => {
                let output = match self.format {
                    LogFormat::Console => self.format_console(&entry),
                    LogFormat::Json => self.format_json(&entry),
                };

                if entry.level >= LogLevel::Warn {
                    let _ = writeln!(io::stderr(), "{}", output);
                } else {
                    let _ = writeln!(io::stdout(), "{}", output);
                }
            }
        }
    }

    /// Format log entry for console output
    fn format_console(&self, entry: &LogEntry) -> String {
        let timestamp = entry.timestamp.format("%Y-%m-%d %H:%M:%S%.3f");
        let level_str = format!("{:>5}", entry.level.as_str());

        let formatted_level = if self.use_color {
            entry.level.colorize(&level_str)
        } else {
            level_str
        };

        let mut output = format!("{} {} [{}] {}",
            timestamp,
            formatted_level,
            entry.logger,
            entry.message
        );

        if let Some(correlation_id) = &entry.correlation_id {
            output.push_str(&format!(" [{}]", &correlation_id[..correlation_id.len().min(8)]));
        }

        if !entry.fields.is_empty() {
            let fields_str: Vec<String> = entry.fields.iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect();
            output.push_str(&format!(" {{{}}}", fields_str.join(", ")));
        }

        output
    }

    /// Format log entry as JSON
    fn format_json(&self, entry: &LogEntry) -> String {
        match serde_json::to_string(entry) {
            Ok(json) => json,
            Err(_) => format!("{{\"error\": \"Failed to serialize log entry\", \"message\": \"{}\"}}", entry.message),
        }
    }
}

/// Builder pattern for creating log entries
pub struct LogEntryBuilder<'a> {
    logger: &'a Logger,
    entry: LogEntry,
}

impl<'a> LogEntryBuilder<'a> {
    fn new(logger: &'a Logger, level: LogLevel, message: String) -> Self {
        Self {
            logger,
            entry: LogEntry {
                timestamp: Utc::now(),
                level,
                message,
                logger: logger.name.clone(),
                correlation_id: None,
                fields: BTreeMap::new(),
            },
        }
    }

    /// Add a correlation ID
    pub fn correlation_id(mut self, id: &str) -> Self {
        self.entry.correlation_id = Some(id.to_string());
        self
    }

    /// Add a correlation ID if one is set
    pub fn maybe_correlation_id(self, id: Option<&str>) -> Self {
        match id {
            Some(id) => self.correlation_id(id),
            None => self,
        }
    }

    /// Add a structured field
    pub fn field<T: Serialize>(mut self, key: &str, value: T) -> Self {
        if let Ok(json_value) = serde_json::to_value(value) {
            self.entry.fields.insert(key.to_string(), json_value);
        }
        self
    }

    /// Add error information
    pub fn error_info(self, error: &AppError) -> Self {
        self.field("error", error.to_string())
            .field("error_category", error.category())
            .field("error_recoverable", error.is_recoverable())
    }

    /// Finalize and write the log entry
    pub fn log(self) {
        self.logger.write_entry(self.entry);
    }
}
