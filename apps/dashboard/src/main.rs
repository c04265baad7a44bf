mod check;
mod presence;
mod tui;

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use connectivity::{ConnectivityMonitor, HttpProbe, MonitorConfig, MonitorHandle, NetworkPresence};

use presence::PresenceWatcher;

/// Fleet dashboard: connection status for the fleet API
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Monitor config file (defaults to $XDG_CONFIG_HOME/fleet/connectivity.toml)
    #[arg(long, short)]
    config: Option<PathBuf>,

    /// Override apiBaseUrl
    #[arg(long)]
    api_url: Option<String>,

    /// Override apiHealthPath
    #[arg(long)]
    health_path: Option<String>,

    /// Override pollIntervalMs
    #[arg(long)]
    poll_interval_ms: Option<u64>,

    /// Override probeTimeoutMs
    #[arg(long)]
    probe_timeout_ms: Option<u64>,

    /// Address dialled to decide whether the machine has network access
    #[arg(long, default_value = "1.1.1.1:443")]
    presence_addr: String,

    /// How often network presence is re-evaluated
    #[arg(long, default_value_t = 5_000)]
    presence_interval_ms: u64,

    /// Assume the network is always present
    #[arg(long)]
    no_presence: bool,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Live connection status indicator (default)
    Watch {
        /// Where logs go while the terminal UI is running
        #[arg(long, default_value = "fleet-dashboard.log")]
        log_file: PathBuf,
    },
    /// Run a single check and exit non-zero when disconnected
    Check {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },
    /// Print the effective configuration
    Config,
}

impl Cli {
    fn monitor_config(&self) -> Result<MonitorConfig> {
        let mut config =
            MonitorConfig::from_config(self.config.as_ref()).context("Failed to load monitor config")?;

        if let Some(url) = &self.api_url {
            config.api_base_url = url.clone();
        }
        if let Some(path) = &self.health_path {
            config.api_health_path = path.clone();
        }
        if let Some(ms) = self.poll_interval_ms {
            config.poll_interval_ms = ms;
        }
        if let Some(ms) = self.probe_timeout_ms {
            config.probe_timeout_ms = ms;
        }

        config.validate()?;
        Ok(config)
    }

    fn presence_watcher(&self) -> Option<PresenceWatcher> {
        if self.no_presence {
            return None;
        }
        Some(PresenceWatcher::new(
            self.presence_addr.clone(),
            Duration::from_millis(self.presence_interval_ms),
        ))
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    dotenvy::dotenv().ok();
    let mut cli = Cli::parse();

    let command = cli.command.take().unwrap_or(Command::Watch { log_file: "fleet-dashboard.log".into() });
    match &command {
        Command::Watch { log_file } => logger::init_tracing_to_file(log_file)
            .with_context(|| format!("Failed to open log file {}", log_file.display()))?,
        _ => logger::init_tracing(),
    }

    let config = cli.monitor_config()?;

    match command {
        Command::Config => {
            println!("{config}");
            Ok(ExitCode::SUCCESS)
        }
        Command::Check { json } => {
            let monitor = start_monitor(&config, cli.presence_watcher(), false).await?;
            let connected = check::run(&monitor, config.probe_timeout(), json).await?;
            Ok(if connected { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
        Command::Watch { .. } => {
            let monitor = start_monitor(&config, cli.presence_watcher(), true).await?;
            tui::run_tui(monitor, config.health_url()?.to_string()).await?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Wire the probe and presence source into a running monitor
async fn start_monitor(
    config: &MonitorConfig,
    watcher: Option<PresenceWatcher>,
    keep_watching: bool,
) -> Result<MonitorHandle> {
    let probe = HttpProbe::from_config(config)?;
    tracing::info!(url = %probe.url(), "Probing fleet API");

    let (reporter, presence) = NetworkPresence::new();
    if let Some(watcher) = watcher {
        reporter.set_online(watcher.check_once().await);
        if keep_watching {
            watcher.spawn(reporter);
        }
    }

    Ok(ConnectivityMonitor::spawn(config.clone(), probe, presence))
}
