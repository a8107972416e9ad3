//! Measurement scheduler
//!
//! Alternates between measuring every endpoint in every direction the tool
//! supports and sleeping for the poll interval. Nothing that goes wrong
//! inside a cycle stops the loop.

use crate::{
    config::ConfigResolver,
    emitter::{MetricPoint, MetricSink},
    logging::Logger,
    models::RunConfig,
    runner::MeasurementRunner,
    types::SchedulerState,
};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Waits out the interval between cycles
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Counts for one finished cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CycleSummary {
    pub correlation_id: String,
    /// Measurements started
    pub attempted: usize,
    /// Points handed to the metrics backend
    pub emitted: usize,
    /// Measurements that produced no value
    pub failed: usize,
}

pub struct Scheduler {
    resolver: ConfigResolver,
    runner: MeasurementRunner,
    sink: Arc<dyn MetricSink>,
    sleeper: Arc<dyn Sleeper>,
    logger: Logger,
    config: RunConfig,
    /// The held config was resolved by the caller and is still fresh
    fresh: bool,
    state: SchedulerState,
}

impl Scheduler {
    /// Build a scheduler around an already resolved startup configuration
    pub fn new(
        resolver: ConfigResolver,
        runner: MeasurementRunner,
        sink: Arc<dyn MetricSink>,
        logger: Logger,
        config: RunConfig,
    ) -> Self {
        Self {
            resolver,
            runner,
            sink,
            sleeper: Arc::new(TokioSleeper),
            logger,
            config,
            fresh: true,
            state: SchedulerState::Sleeping,
        }
    }

    /// Replace the sleep primitive
    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn state(&self) -> SchedulerState {
        self.state
    }

    /// Configuration used by the most recent cycle
    pub fn config(&self) -> &RunConfig {
        &self.config
    }

    /// Re-read the configuration, keeping the previous one if it no longer resolves
    fn refresh_config(&mut self, correlation_id: &str) {
        if std::mem::take(&mut self.fresh) {
            return;
        }

        match self.resolver.resolve() {
            Ok(config) => self.config = config,
            Err(e) => {
                self.logger.error("Configuration reload failed, keeping previous configuration")
                    .correlation_id(correlation_id)
                    .field("path", self.resolver.config_path().display().to_string())
                    .error_info(&e)
                    .log();
            }
        }
    }

    /// Measure every endpoint once and emit each successful sample
    pub async fn run_cycle(&mut self) -> CycleSummary {
        let correlation_id = Uuid::new_v4().to_string();
        self.refresh_config(&correlation_id);
        self.state = SchedulerState::Measuring;

        let config = self.config.clone();
        let mut summary = CycleSummary {
            correlation_id: correlation_id.clone(),
            attempted: 0,
            emitted: 0,
            failed: 0,
        };

        if config.endpoints.is_empty() {
            self.logger.warn("No endpoints configured, nothing to measure")
                .correlation_id(&correlation_id)
                .log();
        }

        for endpoint in &config.endpoints {
            for &direction in config.tool.directions() {
                summary.attempted += 1;
                let sample = self.runner.measure(&config, endpoint, direction, Some(&correlation_id)).await;

                let Some(bits_per_second) = sample.bits_per_second() else {
                    summary.failed += 1;
                    continue;
                };

                let point = MetricPoint::new(
                    config.metric_name(direction, endpoint),
                    bits_per_second,
                    sample.timestamp,
                );
                if self.sink.emit(config.metrics.as_ref(), &point, Some(&correlation_id)).await {
                    summary.emitted += 1;
                }
            }
        }

        self.logger.info("Measurement cycle complete")
            .correlation_id(&correlation_id)
            .field("attempted", summary.attempted)
            .field("emitted", summary.emitted)
            .field("failed", summary.failed)
            .log();

        summary
    }

    async fn sleep_interval(&mut self) {
        self.state = SchedulerState::Sleeping;
        let interval = self.config.interval();
        self.logger.debug("Sleeping until next cycle")
            .field("interval_secs", interval.as_secs())
            .log();
        self.sleeper.sleep(interval).await;
    }

    /// Run `count` cycles with the interval sleep between them
    pub async fn run_cycles(&mut self, count: usize) -> Vec<CycleSummary> {
        let mut summaries = Vec::with_capacity(count);
        for index in 0..count {
            if index > 0 {
                self.sleep_interval().await;
            }
            summaries.push(self.run_cycle().await);
        }
        self.state = SchedulerState::Sleeping;
        summaries
    }

    /// Measure and sleep forever
    pub async fn run(&mut self) {
        loop {
            self.run_cycle().await;
            self.sleep_interval().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::Cli;
    use crate::error::Result;
    use crate::logging::LogLevel;
    use crate::models::MetricsTarget;
    use crate::runner::{CommandExecutor, CommandOutput, CommandSpec, Launcher};
    use crate::types::ToolKind;
    use clap::Parser;
    use std::sync::Mutex;

    struct FixedExecutor(&'static str);

    #[async_trait]
    impl CommandExecutor for FixedExecutor {
        async fn execute(&self, _command: &CommandSpec) -> Result<CommandOutput> {
            Ok(CommandOutput::success(self.0))
        }
    }

    #[derive(Default)]
    struct RecordingSink(Mutex<Vec<MetricPoint>>);

    #[async_trait]
    impl MetricSink for RecordingSink {
        async fn emit(&self, target: Option<&MetricsTarget>, point: &MetricPoint, _: Option<&str>) -> bool {
            if target.is_none() {
                return false;
            }
            self.0.lock().unwrap().push(point.clone());
            true
        }
    }

    #[derive(Default)]
    struct RecordingSleeper(Mutex<Vec<Duration>>);

    #[async_trait]
    impl Sleeper for RecordingSleeper {
        async fn sleep(&self, duration: Duration) {
            self.0.lock().unwrap().push(duration);
        }
    }

    fn scheduler(args: &[&str], output: &'static str) -> (Scheduler, Arc<RecordingSink>, Arc<RecordingSleeper>, crate::logging::CapturedLogs) {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let mut argv = vec!["cbandwidth", "--config", missing.to_str().unwrap()];
        argv.extend_from_slice(args);
        let cli = Cli::parse_from(argv);

        let (logger, captured) = Logger::capturing("scheduler");
        let mut resolver = ConfigResolver::new(cli.clone(), logger.child("config"));
        let config = resolver.resolve().unwrap();
        let runner = MeasurementRunner::new(
            Launcher::local(cli.tool(), None),
            Arc::new(FixedExecutor(output)),
            logger.child("runner"),
        );
        let sink = Arc::new(RecordingSink::default());
        let sleeper = Arc::new(RecordingSleeper::default());
        let scheduler = Scheduler::new(resolver, runner, sink.clone(), logger, config)
            .with_sleeper(sleeper.clone());
        (scheduler, sink, sleeper, captured)
    }

    #[tokio::test]
    async fn test_cycle_measures_every_direction() {
        let (mut scheduler, sink, _sleeper, captured) = scheduler(
            &["--endpoints", "10.0.0.5:branch-a,10.0.0.6", "--metrics-host", "127.0.0.1"],
            "500",
        );

        let summary = scheduler.run_cycle().await;

        assert_eq!(summary.attempted, 4);
        assert_eq!(summary.emitted, 4);
        assert_eq!(summary.failed, 0);
        let names: Vec<String> = sink.0.lock().unwrap().iter().map(|p| p.name.clone()).collect();
        assert_eq!(names, vec![
            "bandwidth.download.branch-a",
            "bandwidth.upload.branch-a",
            "bandwidth.download.10.0.0.6",
            "bandwidth.upload.10.0.0.6",
        ]);
        assert!(captured.contains(LogLevel::Info, "Measurement cycle complete"));
    }

    #[tokio::test]
    async fn test_netperf_is_download_only() {
        let (mut scheduler, sink, _sleeper, _captured) = scheduler(
            &["--netperf", "--endpoints", "10.0.0.5:branch-a", "--metrics-host", "127.0.0.1"],
            "87380  16384  16384    10.00    9387.12",
        );

        let summary = scheduler.run_cycle().await;

        assert_eq!(summary.attempted, 1);
        let points = sink.0.lock().unwrap();
        assert_eq!(points[0].name, "bandwidth.download.branch-a");
        assert_eq!(points[0].value, 9_387_000);
    }

    #[tokio::test]
    async fn test_failures_do_not_stop_cycle() {
        let (mut scheduler, sink, _sleeper, _captured) = scheduler(
            &["--endpoints", "10.0.0.5,10.0.0.6", "--metrics-host", "127.0.0.1"],
            "iperf3: error - unable to connect to server",
        );

        let summary = scheduler.run_cycle().await;

        assert_eq!(summary.attempted, 4);
        assert_eq!(summary.failed, 4);
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_no_endpoints_warns() {
        let (mut scheduler, _sink, _sleeper, captured) = scheduler(&[], "500");

        let summary = scheduler.run_cycle().await;

        assert_eq!(summary.attempted, 0);
        assert!(captured.contains(LogLevel::Warn, "No endpoints configured"));
    }

    #[tokio::test]
    async fn test_run_cycles_sleeps_between() {
        let (mut scheduler, sink, sleeper, _captured) = scheduler(
            &["--endpoints", "10.0.0.5:branch-a", "--metrics-host", "127.0.0.1", "--interval", "60"],
            "500",
        );

        let summaries = scheduler.run_cycles(3).await;

        assert_eq!(summaries.len(), 3);
        assert_ne!(summaries[0].correlation_id, summaries[1].correlation_id);
        assert_eq!(*sleeper.0.lock().unwrap(), vec![Duration::from_secs(60); 2]);
        assert_eq!(sink.0.lock().unwrap().len(), 6);
        assert_eq!(scheduler.state(), SchedulerState::Sleeping);
    }

    #[tokio::test]
    async fn test_without_metrics_backend_nothing_is_emitted() {
        let (mut scheduler, sink, _sleeper, _captured) = scheduler(&["--endpoints", "10.0.0.5"], "500");

        let summary = scheduler.run_cycle().await;

        assert_eq!(summary.attempted, 2);
        assert_eq!(summary.emitted, 0);
        assert_eq!(summary.failed, 0);
        assert!(sink.0.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_malformed_reload_keeps_previous_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "grafana-address = \"127.0.0.1\"\n\n[[iperf-servers]]\n\"10.0.0.5\" = \"branch-a\"\n").unwrap();

        let cli = Cli::parse_from(["cbandwidth", "--config", path.to_str().unwrap()]);
        let (logger, captured) = Logger::capturing("scheduler");
        let mut resolver = ConfigResolver::new(cli, logger.child("config"));
        let config = resolver.resolve().unwrap();
        let runner = MeasurementRunner::new(
            Launcher::local(ToolKind::Iperf3, None),
            Arc::new(FixedExecutor("500")),
            logger.child("runner"),
        );
        let sink = Arc::new(RecordingSink::default());
        let mut scheduler = Scheduler::new(resolver, runner, sink.clone(), logger, config)
            .with_sleeper(Arc::new(RecordingSleeper::default()));

        scheduler.run_cycle().await;
        std::fs::write(&path, "test-length = [oops").unwrap();
        let summary = scheduler.run_cycle().await;

        assert_eq!(summary.emitted, 2);
        assert_eq!(scheduler.config().endpoints.len(), 1);
        assert!(captured.contains(LogLevel::Error, "Configuration reload failed"));
        assert_eq!(sink.0.lock().unwrap().len(), 4);
    }
}
