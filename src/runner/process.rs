//! External process execution

use crate::error::{AppError, Result};
use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;

/// A program and its argument list, run without a shell
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl CommandSpec {
    pub fn new<P: Into<String>>(program: P, args: Vec<String>) -> Self {
        Self { program: program.into(), args }
    }
}

impl fmt::Display for CommandSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.program)?;
        for arg in &self.args {
            write!(f, " {}", arg)?;
        }
        Ok(())
    }
}

/// What a finished process left behind
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandOutput {
    /// Exit status was zero
    pub success: bool,
    /// Exit code, `None` when killed by a signal
    pub exit_code: Option<i32>,
    /// stdout followed by stderr, trimmed
    pub output: String,
}

impl CommandOutput {
    pub fn success<S: Into<String>>(output: S) -> Self {
        Self { success: true, exit_code: Some(0), output: output.into() }
    }

    pub fn failure<S: Into<String>>(exit_code: i32, output: S) -> Self {
        Self { success: false, exit_code: Some(exit_code), output: output.into() }
    }
}

/// Runs external commands to completion
#[async_trait]
pub trait CommandExecutor: Send + Sync {
    /// Run `command` and wait for it to exit.
    ///
    /// A non-zero exit is reported through `CommandOutput::success`; only a
    /// failure to start the process is an `Err`.
    async fn execute(&self, command: &CommandSpec) -> Result<CommandOutput>;
}

/// Executor backed by `tokio::process`
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemExecutor;

#[async_trait]
impl CommandExecutor for SystemExecutor {
    async fn execute(&self, command: &CommandSpec) -> Result<CommandOutput> {
        let output = tokio::process::Command::new(&command.program)
            .args(&command.args)
            .stdin(Stdio::null())
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| AppError::process(format!("Failed to start '{}': {}", command.program, e)))?;

        let mut combined = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr);
        if !stderr.trim().is_empty() {
            if !combined.is_empty() && !combined.ends_with('\n') {
                combined.push('\n');
            }
            combined.push_str(&stderr);
        }

        Ok(CommandOutput {
            success: output.status.success(),
            exit_code: output.status.code(),
            output: combined.trim().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_display() {
        let spec = CommandSpec::new("iperf3", vec!["-c".to_string(), "10.0.0.5".to_string()]);
        assert_eq!(spec.to_string(), "iperf3 -c 10.0.0.5");
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_executor_captures_output() {
        let spec = CommandSpec::new("sh", vec!["-c".to_string(), "echo out; echo err 1>&2".to_string()]);
        let output = SystemExecutor.execute(&spec).await.unwrap();

        assert!(output.success);
        assert_eq!(output.exit_code, Some(0));
        assert!(output.output.contains("out"));
        assert!(output.output.contains("err"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_system_executor_reports_exit_code() {
        let spec = CommandSpec::new("sh", vec!["-c".to_string(), "echo broken; exit 3".to_string()]);
        let output = SystemExecutor.execute(&spec).await.unwrap();

        assert!(!output.success);
        assert_eq!(output.exit_code, Some(3));
        assert_eq!(output.output, "broken");
    }

    #[tokio::test]
    async fn test_system_executor_missing_binary() {
        let spec = CommandSpec::new("cbandwidth-definitely-not-installed", vec![]);
        let err = SystemExecutor.execute(&spec).await.unwrap_err();
        assert!(matches!(err, AppError::Process(_)));
    }
}
