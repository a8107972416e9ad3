//! Configuration resolution: config document + CLI/env overrides + defaults

use crate::{
    cli::Cli,
    config::{file::ConfigDocument, validation::{validate_config, ValidationLevel}},
    error::Result,
    logging::Logger,
    models::{EndpointRegistry, MetricsTarget, RunConfig},
};
use std::path::Path;

/// Builds a `RunConfig` from the configuration file and command line.
///
/// Per field the command line (or its `CBW_*` variable) wins, then the file,
/// then the defaults in `crate::defaults`. Endpoints are the exception: the
/// command-line list is appended to the file's list.
pub struct ConfigResolver {
    cli: Cli,
    logger: Logger,
    missing_file_reported: bool,
}

impl ConfigResolver {
    /// Create a new resolver for the given command line
    pub fn new(cli: Cli, logger: Logger) -> Self {
        Self {
            cli,
            logger,
            missing_file_reported: false,
        }
    }

    /// Path of the configuration document
    pub fn config_path(&self) -> &Path {
        &self.cli.config
    }

    /// Read the configuration file and produce a validated `RunConfig`.
    ///
    /// A missing file is reported once and otherwise ignored; an unreadable
    /// or malformed file is an error.
    pub fn resolve(&mut self) -> Result<RunConfig> {
        let path = self.cli.config.clone();
        let document = ConfigDocument::load(&path)?;

        match &document {
            Some(_) => {
                self.missing_file_reported = false;
                self.logger.debug("Loaded configuration file")
                    .field("path", path.display().to_string())
                    .log();
            }
            None if !self.missing_file_reported => {
                self.missing_file_reported = true;
                self.logger.warn("Configuration file not found, using command line values and defaults")
                    .field("path", path.display().to_string())
                    .log();
            }
            None => {}
        }

        let resolution = resolve_config(&self.cli, document.as_ref())?;

        for rejected in &resolution.rejected_endpoints {
            self.logger.warn("Ignoring endpoint entry without an address")
                .field("name", rejected)
                .log();
        }

        self.report(&resolution.config, &path);
        Ok(resolution.config)
    }

    fn report(&self, config: &RunConfig, path: &Path) {
        for warning in validate_config(config) {
            let builder = match warning.level {
                ValidationLevel::Warning => self.logger.warn(&warning.message),
                ValidationLevel::Info => self.logger.debug(&warning.message),
            };
            builder.field("path", path.display().to_string()).log();
        }

        if config.debug {
            for endpoint in &config.endpoints {
                self.logger.debug(&format!("[Config] Perf Server = {}", endpoint)).log();
            }
        }
    }
}

/// A validated `RunConfig` plus the endpoint entries dropped while building it
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub config: RunConfig,
    /// Names of endpoint entries that had no address
    pub rejected_endpoints: Vec<String>,
}

/// Merge a parsed document (if any) with the command line into a `RunConfig`
pub fn resolve_config(cli: &Cli, document: Option<&ConfigDocument>) -> Result<Resolution> {
    let tool = cli.tool();
    let mut config = RunConfig::for_tool(tool);
    let empty = ConfigDocument::default();
    let doc = document.unwrap_or(&empty);

    config.debug = cli.debug;

    if let Some(duration) = cli.duration.or(doc.test_length) {
        config.test_duration_secs = duration;
    }

    if let Some(interval) = cli.interval.or(doc.test_interval) {
        config.interval_secs = interval;
    }

    if let Some(port) = cli.server_port.or(doc.server_port) {
        config.server_port = port;
    }

    if let Some(prefix) = non_empty(cli.download_prefix.as_deref()).or(non_empty(doc.tsdb_download_prefix.as_deref())) {
        config.download_prefix = prefix.to_string();
    }

    if let Some(prefix) = non_empty(cli.upload_prefix.as_deref()).or(non_empty(doc.tsdb_upload_prefix.as_deref())) {
        config.upload_prefix = prefix.to_string();
    }

    // The backend is only configured when some source names a host
    if let Some(host) = non_empty(cli.metrics_host.as_deref()).or(non_empty(doc.grafana_address.as_deref())) {
        let port = cli.metrics_port
            .or(doc.grafana_port)
            .unwrap_or(crate::defaults::DEFAULT_METRICS_PORT);
        config.metrics = Some(MetricsTarget::new(host, port));
    }

    let registry = endpoint_registry(cli, document);
    let rejected_endpoints = registry.rejected().to_vec();
    config.endpoints = registry.into_endpoints();

    config.validate()?;
    Ok(Resolution { config, rejected_endpoints })
}

/// File endpoints in document order followed by the command-line list
fn endpoint_registry(cli: &Cli, document: Option<&ConfigDocument>) -> EndpointRegistry {
    let mut registry = EndpointRegistry::new();
    if let Some(doc) = document {
        registry.extend_from_tables(&doc.iperf_servers);
    }
    if let Some(list) = &cli.endpoints {
        registry.extend_from_list(list);
    }
    registry
}

/// Display configuration summary for debug purposes
pub fn display_config_summary(config: &RunConfig) -> String {
    let mut summary = Vec::new();

    summary.push(format!("Tool: {}", config.tool));
    summary.push(format!("Test Duration: {}s", config.test_duration_secs));
    summary.push(format!("Interval: {}s", config.interval_secs));
    summary.push(format!("Server Port: {}", config.server_port));
    summary.push(format!(
        "Metrics Backend: {}",
        config.metrics.as_ref().map(|m| m.to_string()).unwrap_or_else(|| "disabled".to_string())
    ));
    summary.push(format!("Download Prefix: {}", config.download_prefix));
    summary.push(format!("Upload Prefix: {}", config.upload_prefix));
    summary.push(format!(
        "Endpoints: {}",
        config.endpoints.iter().map(|e| e.to_string()).collect::<Vec<_>>().join(", ")
    ));

    summary.join("\n")
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::LogLevel;
    use crate::models::Endpoint;
    use crate::types::ToolKind;
    use clap::Parser;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["cbandwidth", "--config", "/nonexistent/cbandwidth.toml"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    fn document() -> ConfigDocument {
        ConfigDocument::parse(r#"
test-length = 7
test-interval = 120
server-port = 5300
grafana-address = "graphite.local"
grafana-port = 2004
tsdb-download-prefix = "file.down"
tsdb-upload-prefix = "file.up"

[[iperf-servers]]
"10.0.0.5" = "branch-a"
"#).unwrap()
    }

    #[test]
    fn test_defaults_without_sources() {
        let config = resolve_config(&cli(&[]), None).unwrap().config;

        assert_eq!(config.test_duration_secs, 5);
        assert_eq!(config.interval_secs, 300);
        assert_eq!(config.server_port, 5201);
        assert_eq!(config.download_prefix, "bandwidth.download");
        assert_eq!(config.upload_prefix, "bandwidth.upload");
        assert!(config.metrics.is_none());
        assert!(config.endpoints.is_empty());
    }

    #[test]
    fn test_netperf_default_port() {
        let config = resolve_config(&cli(&["--netperf"]), None).unwrap().config;
        assert_eq!(config.tool, ToolKind::Netperf);
        assert_eq!(config.server_port, 12865);
    }

    #[test]
    fn test_file_values_used() {
        let config = resolve_config(&cli(&[]), Some(&document())).unwrap().config;

        assert_eq!(config.test_duration_secs, 7);
        assert_eq!(config.interval_secs, 120);
        assert_eq!(config.server_port, 5300);
        assert_eq!(config.metrics, Some(MetricsTarget::new("graphite.local", 2004)));
        assert_eq!(config.download_prefix, "file.down");
        assert_eq!(config.upload_prefix, "file.up");
        assert_eq!(config.endpoints, vec![Endpoint::new("10.0.0.5", "branch-a")]);
    }

    #[test]
    fn test_cli_overrides_win() {
        let args = cli(&[
            "--duration", "3",
            "--interval", "0",
            "--server-port", "5999",
            "--metrics-host", "carbon.local",
            "--metrics-port", "2013",
            "--download-prefix", "cli.down",
            "--upload-prefix", "cli.up",
        ]);
        let config = resolve_config(&args, Some(&document())).unwrap().config;

        assert_eq!(config.test_duration_secs, 3);
        assert_eq!(config.interval_secs, 0);
        assert_eq!(config.server_port, 5999);
        assert_eq!(config.metrics, Some(MetricsTarget::new("carbon.local", 2013)));
        assert_eq!(config.download_prefix, "cli.down");
        assert_eq!(config.upload_prefix, "cli.up");
    }

    #[test]
    fn test_metrics_port_alone_does_not_enable_backend() {
        let config = resolve_config(&cli(&["--metrics-port", "2003"]), None).unwrap().config;
        assert!(config.metrics.is_none());
    }

    #[test]
    fn test_metrics_port_defaults_when_only_host_given() {
        let config = resolve_config(&cli(&["--metrics-host", "carbon.local"]), None).unwrap().config;
        assert_eq!(config.metrics, Some(MetricsTarget::new("carbon.local", 2003)));
    }

    #[test]
    fn test_cli_endpoints_appended() {
        let args = cli(&["--endpoints", "10.0.0.6:,10.0.0.7:branch-c"]);
        let config = resolve_config(&args, Some(&document())).unwrap().config;

        assert_eq!(config.endpoints, vec![
            Endpoint::new("10.0.0.5", "branch-a"),
            Endpoint::new("10.0.0.6", "10.0.0.6"),
            Endpoint::new("10.0.0.7", "branch-c"),
        ]);
    }

    #[test]
    fn test_resolver_warns_on_rejected_endpoint() {
        let (logger, captured) = Logger::capturing("config");
        let mut resolver = ConfigResolver::new(cli(&["--endpoints", ":orphan,10.0.0.5"]), logger);

        let config = resolver.resolve().unwrap();
        assert_eq!(config.endpoints.len(), 1);
        assert!(captured.contains(LogLevel::Warn, "orphan"));
    }

    #[test]
    fn test_rejected_endpoints_reported_with_config() {
        let resolution = resolve_config(&cli(&["--endpoints", "10.0.0.5,:orphan"]), Some(&document())).unwrap();

        assert_eq!(resolution.rejected_endpoints, vec!["orphan".to_string()]);
        assert_eq!(resolution.config.endpoints.len(), 2);
    }

    #[test]
    fn test_zero_duration_in_file_rejected() {
        let doc = ConfigDocument::parse("test-length = 0").unwrap();
        assert!(resolve_config(&cli(&[]), Some(&doc)).is_err());
    }

    #[test]
    fn test_resolver_missing_file_warns_once() {
        let (logger, captured) = Logger::capturing("config");
        let mut resolver = ConfigResolver::new(cli(&["--endpoints", "10.0.0.5"]), logger);

        let config = resolver.resolve().unwrap();
        assert_eq!(config.endpoints.len(), 1);
        resolver.resolve().unwrap();

        let missing: Vec<_> = captured
            .at_level(LogLevel::Warn)
            .into_iter()
            .filter(|e| e.message.contains("Configuration file not found"))
            .collect();
        assert_eq!(missing.len(), 1);
    }

    #[test]
    fn test_resolver_reads_file_each_time() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "[[iperf-servers]]\n\"10.0.0.5\" = \"branch-a\"\n").unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let args = Cli::try_parse_from(["cbandwidth", "--config", path.as_str()]).unwrap();
        let (logger, _captured) = Logger::capturing("config");
        let mut resolver = ConfigResolver::new(args, logger);

        assert_eq!(resolver.resolve().unwrap().endpoints.len(), 1);

        std::fs::write(file.path(), "[[iperf-servers]]\n\"10.0.0.5\" = \"a\"\n\"10.0.0.6\" = \"b\"\n").unwrap();
        assert_eq!(resolver.resolve().unwrap().endpoints.len(), 2);
    }

    #[test]
    fn test_resolver_malformed_file_is_error() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "test-length = [").unwrap();

        let path = file.path().to_str().unwrap().to_string();
        let args = Cli::try_parse_from(["cbandwidth", "--config", path.as_str()]).unwrap();
        let (logger, _captured) = Logger::capturing("config");
        let mut resolver = ConfigResolver::new(args, logger);

        assert!(resolver.resolve().is_err());
    }

    #[test]
    fn test_display_config_summary() {
        let config = resolve_config(&cli(&["--endpoints", "10.0.0.5:branch-a"]), None).unwrap().config;
        let summary = display_config_summary(&config);

        assert!(summary.contains("Tool: iperf3"));
        assert!(summary.contains("Metrics Backend: disabled"));
        assert!(summary.contains("Endpoints: 10.0.0.5:branch-a"));
    }
}
