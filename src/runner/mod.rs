//! Measurement runner
//!
//! Runs the external bandwidth tool once per endpoint and direction and
//! reduces its output to a single bits-per-second figure:
//! - `tool` builds argument lists and parses output
//! - `launcher` wraps them for a local binary or a container runtime
//! - `process` executes the final command without a shell

pub mod launcher;
pub mod process;
pub mod tool;

pub use launcher::{detect_runtime, select_launcher, LaunchOptions, Launcher, RuntimeDetector, VersionCheck};
pub use process::{CommandExecutor, CommandOutput, CommandSpec, SystemExecutor};

use crate::{
    error::AppError,
    logging::Logger,
    models::{Endpoint, MeasurementSample, RunConfig},
    types::Direction,
};
use std::sync::Arc;

/// Turns one endpoint + direction into a `MeasurementSample`
pub struct MeasurementRunner {
    launcher: Launcher,
    executor: Arc<dyn CommandExecutor>,
    logger: Logger,
}

impl MeasurementRunner {
    pub fn new(launcher: Launcher, executor: Arc<dyn CommandExecutor>, logger: Logger) -> Self {
        Self { launcher, executor, logger }
    }

    /// Command that measures `endpoint` in `direction`
    pub fn command_for(&self, config: &RunConfig, endpoint: &Endpoint, direction: Direction) -> CommandSpec {
        let args = tool::tool_args(
            config.tool,
            direction,
            &endpoint.address,
            config.server_port,
            config.test_duration_secs,
        );
        self.launcher.command(args)
    }

    /// Run one measurement. Never fails: problems end up in the sample's outcome.
    pub async fn measure(&self, config: &RunConfig, endpoint: &Endpoint, direction: Direction, correlation_id: Option<&str>) -> MeasurementSample {
        let command = self.command_for(config, endpoint, direction);
        let target = format!("{}:{}", endpoint.address, config.server_port);

        if config.debug {
            self.logger.info("Running measurement command")
                .maybe_correlation_id(correlation_id)
                .field("command", &command.program)
                .field("args", &command.args)
                .log();
        }

        let result = self.executor.execute(&command).await;
        let timestamp = chrono::Utc::now().timestamp();

        let output = match result {
            Ok(output) => output,
            Err(e) => {
                self.logger.error(&format!("Error testing {} server at {}", config.tool, target))
                    .maybe_correlation_id(correlation_id)
                    .field("direction", direction)
                    .error_info(&e)
                    .log();
                return MeasurementSample::failure(endpoint.clone(), direction, String::new(), timestamp, e);
            }
        };

        if tool::contains_failure(config.tool, &output.output) {
            let error = AppError::tool_failure(format!(
                "{} reported a failure for {} ({})", config.tool, target, direction
            ));
            self.logger.error(&format!("Error testing {} server at {}", config.tool, target))
                .maybe_correlation_id(correlation_id)
                .field("direction", direction)
                .field("exit_code", output.exit_code)
                .field("output", &output.output)
                .log();
            self.logger.error(&format!("Verify {} is running and reachable at {}", config.tool, target))
                .maybe_correlation_id(correlation_id)
                .log();
            return MeasurementSample::failure(endpoint.clone(), direction, output.output, timestamp, error);
        }

        if !output.success {
            let status = output.exit_code.map(|c| c.to_string()).unwrap_or_else(|| "signal".to_string());
            let error = AppError::process(format!(
                "{} exited with status {} while testing {}: {}", config.tool, status, target, output.output
            ));
            self.logger.error(&format!("Error testing {} server at {}", config.tool, target))
                .maybe_correlation_id(correlation_id)
                .field("direction", direction)
                .error_info(&error)
                .log();
            return MeasurementSample::failure(endpoint.clone(), direction, output.output, timestamp, error);
        }

        let parsed = tool::extract_throughput(&output.output)
            .ok_or_else(|| AppError::parse(format!("No throughput figure in output from {}", target)))
            .and_then(tool::kbits_to_bits);

        match parsed {
            Ok(bits_per_second) => {
                self.logger.info(&format!(
                    "{} results for endpoint {} [{}] -> {} bps",
                    capitalize(direction.as_str()), endpoint.address, endpoint.name, bits_per_second
                ))
                    .maybe_correlation_id(correlation_id)
                    .log();
                MeasurementSample::success(endpoint.clone(), direction, output.output, timestamp, bits_per_second)
            }
            Err(e) => {
                self.logger.error(&format!("Could not parse {} output for {}", config.tool, target))
                    .maybe_correlation_id(correlation_id)
                    .field("direction", direction)
                    .field("output", &output.output)
                    .error_info(&e)
                    .log();
                MeasurementSample::failure(endpoint.clone(), direction, output.output, timestamp, e)
            }
        }
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
