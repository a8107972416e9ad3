//! Local binary vs. container launch of the measurement tool

use crate::error::{AppError, Result};
use crate::logging::Logger;
use crate::runner::process::{CommandExecutor, CommandSpec};
use crate::types::{ContainerRuntime, LaunchMode, ToolKind};
use async_trait::async_trait;
use std::sync::Arc;

/// Wraps tool arguments into the command that actually runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Launcher {
    mode: LaunchMode,
}

impl Launcher {
    /// Run `binary` (or the tool's default binary name) from the host
    pub fn local(tool: ToolKind, binary: Option<String>) -> Self {
        let binary = binary
            .filter(|b| !b.trim().is_empty())
            .unwrap_or_else(|| tool.binary().to_string());
        Self { mode: LaunchMode::Local { binary } }
    }

    /// Run the tool inside a disposable container of `image`
    pub fn container(tool: ToolKind, runtime: ContainerRuntime, image: Option<String>) -> Self {
        let image = image
            .filter(|i| !i.trim().is_empty())
            .unwrap_or_else(|| tool.default_image().to_string());
        Self { mode: LaunchMode::Container { runtime, image } }
    }

    pub fn mode(&self) -> &LaunchMode {
        &self.mode
    }

    /// Full command for a set of tool arguments
    pub fn command(&self, tool_args: Vec<String>) -> CommandSpec {
        match &self.mode {
            LaunchMode::Local { binary } => CommandSpec::new(binary.clone(), tool_args),
            LaunchMode::Container { runtime, image } => {
                let mut args = vec![
                    "run".to_string(),
                    "-i".to_string(),
                    "--rm".to_string(),
                    image.clone(),
                ];
                args.extend(tool_args);
                CommandSpec::new(runtime.command(), args)
            }
        }
    }

    /// Short description for startup logging
    pub fn describe(&self) -> String {
        match &self.mode {
            LaunchMode::Local { binary } => format!("local binary '{}'", binary),
            LaunchMode::Container { runtime, image } => format!("{} container '{}'", runtime.command(), image),
        }
    }
}

/// Answers whether a container runtime can be used on this host
#[async_trait]
pub trait RuntimeDetector: Send + Sync {
    async fn is_available(&self, runtime: ContainerRuntime) -> bool;
}

/// Runs `<runtime> --version` and treats a zero exit status as available
pub struct VersionCheck {
    executor: Arc<dyn CommandExecutor>,
}

impl VersionCheck {
    pub fn new(executor: Arc<dyn CommandExecutor>) -> Self {
        Self { executor }
    }
}

#[async_trait]
impl RuntimeDetector for VersionCheck {
    async fn is_available(&self, runtime: ContainerRuntime) -> bool {
        let command = CommandSpec::new(runtime.command(), vec!["--version".to_string()]);
        matches!(self.executor.execute(&command).await, Ok(output) if output.success)
    }
}

/// First usable runtime in `ContainerRuntime::CANDIDATES` order
pub async fn detect_runtime(detector: &dyn RuntimeDetector) -> Option<ContainerRuntime> {
    for runtime in ContainerRuntime::CANDIDATES {
        if detector.is_available(runtime).await {
            return Some(runtime);
        }
    }
    None
}

/// Options that decide how the tool is launched, taken from the command line
#[derive(Debug, Clone, Default)]
pub struct LaunchOptions {
    pub tool: ToolKind,
    pub no_container: bool,
    pub tool_path: Option<String>,
    pub image: Option<String>,
}

/// Choose the launcher once at startup.
///
/// Container mode without any usable runtime is an environment error.
pub async fn select_launcher(options: &LaunchOptions, detector: &dyn RuntimeDetector, logger: &Logger) -> Result<Launcher> {
    let tool = options.tool;

    if options.no_container {
        let launcher = Launcher::local(tool, options.tool_path.clone());
        logger.info("Measurement tool selected").field("launch", launcher.describe()).log();
        return Ok(launcher);
    }

    match detect_runtime(detector).await {
        Some(runtime) => {
            let launcher = Launcher::container(tool, runtime, options.image.clone());
            logger.info("Measurement tool selected").field("launch", launcher.describe()).log();
            Ok(launcher)
        }
        None => Err(AppError::environment(
            "docker or podman is required for container mode, use the flag \"--nocontainer\" to run the measurement binary from the host",
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runner::process::CommandOutput;

    struct FixedRuntimes(Vec<ContainerRuntime>);

    #[async_trait]
    impl RuntimeDetector for FixedRuntimes {
        async fn is_available(&self, runtime: ContainerRuntime) -> bool {
            self.0.contains(&runtime)
        }
    }

    struct ScriptedExecutor {
        working: &'static str,
    }

    #[async_trait]
    impl CommandExecutor for ScriptedExecutor {
        async fn execute(&self, command: &CommandSpec) -> Result<CommandOutput> {
            if command.program == self.working {
                Ok(CommandOutput::success(format!("{} version 1.0", command.program)))
            } else if command.program == "docker" {
                Ok(CommandOutput::failure(1, "Cannot connect to the Docker daemon"))
            } else {
                Err(AppError::process("not found"))
            }
        }
    }

    #[test]
    fn test_local_command() {
        let launcher = Launcher::local(ToolKind::Iperf3, None);
        let spec = launcher.command(vec!["-c".to_string(), "10.0.0.5".to_string()]);
        assert_eq!(spec.program, "iperf3");
        assert_eq!(spec.args, vec!["-c", "10.0.0.5"]);
    }

    #[test]
    fn test_local_command_with_path() {
        let launcher = Launcher::local(ToolKind::Netperf, Some("/opt/netperf/bin/netperf".to_string()));
        assert_eq!(launcher.command(vec![]).program, "/opt/netperf/bin/netperf");
    }

    #[test]
    fn test_container_command() {
        let launcher = Launcher::container(ToolKind::Iperf3, ContainerRuntime::Podman, None);
        let spec = launcher.command(vec!["-c".to_string(), "10.0.0.5".to_string()]);
        assert_eq!(spec.program, "podman");
        assert_eq!(spec.args, vec!["run", "-i", "--rm", "networkstatic/iperf3", "-c", "10.0.0.5"]);
    }

    #[test]
    fn test_container_custom_image() {
        let launcher = Launcher::container(ToolKind::Iperf3, ContainerRuntime::Docker, Some("registry.local/iperf3:3.16".to_string()));
        assert_eq!(launcher.command(vec![]).args[3], "registry.local/iperf3:3.16");
        assert_eq!(launcher.describe(), "docker container 'registry.local/iperf3:3.16'");
    }

    #[tokio::test]
    async fn test_detect_prefers_docker() {
        let detector = FixedRuntimes(vec![ContainerRuntime::Podman, ContainerRuntime::Docker]);
        assert_eq!(detect_runtime(&detector).await, Some(ContainerRuntime::Docker));
    }

    #[tokio::test]
    async fn test_detect_falls_back_to_podman() {
        let detector = VersionCheck::new(Arc::new(ScriptedExecutor { working: "podman" }));
        assert_eq!(detect_runtime(&detector).await, Some(ContainerRuntime::Podman));
    }

    #[tokio::test]
    async fn test_select_without_runtime_is_fatal() {
        let (logger, _captured) = Logger::capturing("launcher");
        let err = select_launcher(&LaunchOptions::default(), &FixedRuntimes(vec![]), &logger).await.unwrap_err();

        assert!(matches!(err, AppError::Environment(_)));
        assert!(err.to_string().contains("--nocontainer"));
    }

    #[tokio::test]
    async fn test_select_nocontainer_skips_detection() {
        let (logger, _captured) = Logger::capturing("launcher");
        let options = LaunchOptions { no_container: true, ..Default::default() };
        let launcher = select_launcher(&options, &FixedRuntimes(vec![]), &logger).await.unwrap();

        assert_eq!(launcher.mode(), &LaunchMode::Local { binary: "iperf3".to_string() });
    }

    #[tokio::test]
    async fn test_select_netperf_container_image() {
        let (logger, _captured) = Logger::capturing("launcher");
        let options = LaunchOptions { tool: ToolKind::Netperf, ..Default::default() };
        let launcher = select_launcher(&options, &FixedRuntimes(vec![ContainerRuntime::Docker]), &logger).await.unwrap();

        assert_eq!(launcher.mode(), &LaunchMode::Container {
            runtime: ContainerRuntime::Docker,
            image: "networkstatic/netperf".to_string(),
        });
    }
}
