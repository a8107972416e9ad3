//! Cloud Bandwidth - Main CLI Application
//!
//! Measures bandwidth to a set of iperf3/netperf endpoints on a fixed
//! interval and forwards the results to a Graphite-compatible backend.

use clap::Parser;
use cloud_bandwidth::{
    cli::Cli,
    config::{display_config_summary, ConfigResolver, EnvManager},
    emitter::GraphiteEmitter,
    error::{AppError, Result},
    logging::Logger,
    runner::{select_launcher, LaunchOptions, MeasurementRunner, SystemExecutor, VersionCheck},
    Scheduler, PKG_NAME, VERSION,
};
use std::path::Path;
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    std::panic::set_hook(Box::new(|panic_info| {
        eprintln!("Application panic: {}", panic_info);
        process::exit(1);
    }));

    // .env has to be in the environment before clap reads CBW_* variables
    let env_result = EnvManager::load_env_file(Path::new(".env"));

    let cli = Cli::parse();
    let use_color = cli.use_colors();

    if let Err(e) = env_result {
        exit_with(&e, use_color);
    }

    if let Err(e) = run_application(cli).await {
        exit_with(&e, use_color);
    }
}

/// Print a fatal error with its suggestion and exit with its code
fn exit_with(error: &AppError, use_color: bool) -> ! {
    eprintln!("{}", error.format_for_console(use_color));
    if let Some((_, suggestion)) = error.user_friendly_message().split_once("\n\n") {
        eprintln!("{}", suggestion);
    }
    process::exit(error.exit_code());
}

/// Main application logic
async fn run_application(cli: Cli) -> Result<()> {
    let logger = Logger::with_settings("main", cli.debug, cli.log_format, cli.use_colors());

    logger.info(&format!("Starting {} v{}", PKG_NAME, VERSION))
        .field("build_time", option_env!("BUILD_TIME").unwrap_or("unknown"))
        .field("git_commit", option_env!("GIT_COMMIT").unwrap_or("unknown"))
        .log();

    let active_vars = EnvManager::active_env_vars();
    if cli.debug && !active_vars.is_empty() {
        logger.debug("Environment overrides active").field("variables", &active_vars).log();
    }

    // A configuration that does not resolve at startup is fatal
    let mut resolver = ConfigResolver::new(cli.clone(), logger.child("config"));
    let config = match resolver.resolve() {
        Ok(config) => config,
        Err(e) => {
            logger.fatal("Invalid configuration").error_info(&e).log();
            return Err(e);
        }
    };

    if cli.debug {
        logger.debug(&format!("Resolved configuration:\n{}", display_config_summary(&config))).log();
    }

    let executor = Arc::new(SystemExecutor);
    let options = LaunchOptions {
        tool: cli.tool(),
        no_container: cli.no_container,
        tool_path: cli.tool_path.clone(),
        image: cli.image.clone(),
    };
    let detector = VersionCheck::new(executor.clone());
    let launcher = match select_launcher(&options, &detector, &logger.child("runner")).await {
        Ok(launcher) => launcher,
        Err(e) => {
            logger.fatal("No way to launch the measurement tool").error_info(&e).log();
            return Err(e);
        }
    };

    let runner = MeasurementRunner::new(launcher, executor, logger.child("runner"));
    let emitter = Arc::new(GraphiteEmitter::new(logger.child("emitter"), cli.debug));
    let mut scheduler = Scheduler::new(resolver, runner, emitter, logger.child("scheduler"), config);

    if cli.once {
        scheduler.run_cycle().await;
    } else {
        scheduler.run().await;
    }

    Ok(())
}
