//! statemon daemon — runs the replica state monitor loop for one storage node.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;

use statemon_network::{HttpPeerClockClient, HttpPeerHealthCheck, HttpUserDirectory};
use statemon_node::{
    init_logging, LogFormat, LoggingJobSink, MonitorConfig, MonitorDeps, MonitorLoop,
    MonitorMetrics, ShutdownController, StateMonitor,
};
use statemon_store::MemorySyncOutcomeStore;
use statemon_types::MonitorStateJobData;
use statemon_utils::{SystemClock, TracingJobLogger};

#[derive(Parser)]
#[command(name = "statemon-daemon", about = "Replica state monitor daemon")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "STATEMON_CONFIG")]
    config: Option<PathBuf>,

    /// This node's public endpoint.
    #[arg(long, env = "STATEMON_SELF_ENDPOINT")]
    self_endpoint: Option<String>,

    /// Discovery node to page users from.
    #[arg(long, env = "STATEMON_DISCOVERY_NODE_ENDPOINT")]
    discovery_node_endpoint: Option<String>,

    /// Users processed per cycle.
    #[arg(long, env = "STATEMON_USERS_PER_JOB")]
    users_per_job: Option<usize>,

    /// Pause between cycles, in milliseconds.
    #[arg(long, env = "STATEMON_MONITOR_INTERVAL_MS")]
    monitor_interval_ms: Option<u64>,

    /// Log format: "human" or "json".
    #[arg(long, env = "STATEMON_LOG_FORMAT")]
    log_format: Option<String>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "STATEMON_LOG_LEVEL")]
    log_level: Option<String>,

    /// Collect Prometheus metrics and print them on exit.
    #[arg(long, env = "STATEMON_ENABLE_METRICS")]
    metrics: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Run the monitor loop until SIGINT/SIGTERM.
    Run {
        /// Cursor to start from.
        #[arg(long, default_value_t = 0)]
        start_user_id: u64,
    },
    /// Run a single cycle and print the emitted jobs as JSON.
    Once {
        #[arg(long, default_value_t = 0)]
        start_user_id: u64,
    },
    /// Print the effective configuration as TOML.
    ShowConfig,
}

/// File settings as the base, CLI flags and env vars on top.
fn resolve_config(cli: &Cli) -> anyhow::Result<MonitorConfig> {
    let base = match &cli.config {
        Some(path) => MonitorConfig::from_toml_file(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => MonitorConfig::default(),
    };
    Ok(MonitorConfig {
        self_endpoint: cli.self_endpoint.clone().unwrap_or(base.self_endpoint),
        discovery_node_endpoint: cli
            .discovery_node_endpoint
            .clone()
            .unwrap_or(base.discovery_node_endpoint),
        users_per_job: cli.users_per_job.unwrap_or(base.users_per_job),
        monitor_interval_ms: cli.monitor_interval_ms.unwrap_or(base.monitor_interval_ms),
        log_format: cli.log_format.clone().unwrap_or(base.log_format),
        log_level: cli.log_level.clone().unwrap_or(base.log_level),
        enable_metrics: cli.metrics || base.enable_metrics,
        ..base
    })
}

fn build_monitor(config: &MonitorConfig) -> StateMonitor {
    let deps = MonitorDeps {
        directory: Arc::new(HttpUserDirectory::new()),
        health: Arc::new(HttpPeerHealthCheck::with_timeout(
            config.self_endpoint(),
            config.peer_health_timeout(),
        )),
        clocks: Arc::new(HttpPeerClockClient::new(
            config.max_user_clock_fetch_batch_size,
        )),
        outcomes: Arc::new(MemorySyncOutcomeStore::new()),
        clock: Arc::new(SystemClock),
    };
    StateMonitor::new(deps, config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = resolve_config(&cli)?;

    if let Command::ShowConfig = cli.command {
        print!("{}", config.to_toml_string()?);
        return Ok(());
    }

    let format: LogFormat = config.log_format.parse()?;
    init_logging(format, &config.log_level)?;
    config.validate()?;

    let monitor = Arc::new(build_monitor(&config));
    let job = |start_user_id| MonitorStateJobData {
        last_processed_user_id: start_user_id,
        discovery_node_endpoint: config.discovery_node_endpoint.clone(),
    };

    match cli.command {
        Command::Once { start_user_id } => {
            let logger = TracingJobLogger::new("monitor-state", "once");
            let result = monitor.run_cycle(&logger, &job(start_user_id)).await;
            println!("{}", serde_json::to_string_pretty(&result.output)?);
        }
        Command::Run { start_user_id } => {
            tracing::info!(
                self_endpoint = %monitor.self_endpoint(),
                discovery = %config.discovery_node_endpoint,
                users_per_job = config.users_per_job,
                "starting state monitor"
            );

            let shutdown = ShutdownController::new();
            let mut monitor_loop =
                MonitorLoop::new(monitor, Arc::new(LoggingJobSink), config.monitor_interval());
            let metrics = if config.enable_metrics {
                let metrics = Arc::new(MonitorMetrics::new()?);
                monitor_loop = monitor_loop.with_metrics(Arc::clone(&metrics));
                Some(metrics)
            } else {
                None
            };

            let rx = shutdown.subscribe();
            let (cycles, ()) = tokio::join!(
                monitor_loop.run(job(start_user_id), rx),
                shutdown.wait_for_signal()
            );

            if let Some(metrics) = metrics {
                print!("{}", metrics.encode_text()?);
            }
            tracing::info!(cycles, "statemon daemon exited cleanly");
        }
        Command::ShowConfig => {}
    }

    Ok(())
}
