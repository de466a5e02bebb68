mod bus_monitor;
mod config;
mod dispatcher;
mod error;
mod event;
mod event_source;
mod liveness;
mod logging;
mod paths;
mod playback;
mod scanner;
mod startup;

use std::io::Write;
use std::path::PathBuf;

use anyhow::bail;
use clap::Parser;
use tracing::{info, warn};

use crate::bus_monitor::BusMonitor;
use crate::config::{FileConfig, MonitorConfig, Overrides};
use crate::dispatcher::Dispatcher;
use crate::error::MonitorError;
use crate::event_source::EventSource;
use crate::liveness::LivenessGate;
use crate::playback::CommandPlayer;
use crate::scanner::LineScanner;

/// Plays a sound whenever the file manager navigates to another folder.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Log every classification decision
    #[arg(long)]
    debug: bool,

    /// Sound file to play on navigation [default: ./navigation.wav]
    #[arg(long)]
    sound_path: Option<PathBuf>,

    /// Application to monitor [default: dolphin]
    #[arg(long)]
    app_name: Option<String>,

    /// Config file [default: $XDG_CONFIG_HOME/navchime/config.toml]
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only play while the application process is running
    #[arg(long)]
    require_running: bool,
}

#[tokio::main]
async fn main() {
    let args = Args::parse();

    let code = match run(args).await {
        Ok(()) => 0,
        Err(e) => report_fatal(&e, &mut std::io::stderr()),
    };
    std::process::exit(code);
}

/// Writes a fatal error straight to `out`, bypassing the log filter, and
/// returns the exit status for it.
fn report_fatal(err: &MonitorError, out: &mut impl Write) -> i32 {
    let _ = writeln!(out, "navchime: {err}");
    err.exit_code()
}

async fn run(args: Args) -> Result<(), MonitorError> {
    let config = resolve_config(&args)
        .map_err(|e| MonitorError::StartupFailed(format!("{e:#}")))?;
    logging::init(config.debug);

    info!(
        version = env!("CARGO_PKG_VERSION"),
        app = config.app_name.as_str(),
        sound = %config.sound_path.display(),
        "navchime started"
    );

    startup::preflight(&config)?;
    let player = CommandPlayer::new(&config.player_command, config.playback_mode)?;

    let gate = if config.require_running {
        liveness::spawn(config.app_name.clone(), config.liveness_interval_secs)
    } else {
        LivenessGate::Disabled
    };

    let mut monitor = BusMonitor::spawn(&config.monitor_command)?;
    let mut source = EventSource::new(
        monitor.take_stdout()?,
        LineScanner::new(&config.signal_marker, &config.app_name),
    );
    let mut dispatcher = Dispatcher::new(config.sound_path.clone(), player, gate);

    let outcome = tokio::select! {
        err = dispatcher.run(&mut source) => Err(err),
        signal = shutdown_signal() => {
            info!("received {signal}, shutting down");
            Ok(())
        }
    };

    let stats = dispatcher.stats();
    info!(
        played = stats.played,
        failed = stats.failed,
        suppressed = stats.suppressed,
        "dispatch loop stopped"
    );

    let outcome = match outcome {
        Err(MonitorError::StreamTerminated(reason)) => {
            let reason = match monitor.try_exit_status() {
                Some(status) => format!("{reason}; bus monitor exited with {status}"),
                None => reason,
            };
            Err(MonitorError::StreamTerminated(reason))
        }
        other => other,
    };

    monitor.stop().await;
    outcome
}

/// Defaults, then the config file, then command-line flags.
fn resolve_config(args: &Args) -> anyhow::Result<MonitorConfig> {
    let file = match &args.config {
        Some(path) if !path.exists() => bail!("config file {} does not exist", path.display()),
        Some(path) => config::load_or_default(path)?,
        None => match paths::config_file_path() {
            Some(path) => config::load_or_default(&path)?,
            None => FileConfig::default(),
        },
    };

    let overrides = Overrides {
        app_name: args.app_name.clone(),
        sound_path: args.sound_path.clone(),
        debug: args.debug,
        require_running: args.require_running,
    };
    MonitorConfig::resolve(file, &overrides)
}

/// Resolves on SIGINT or SIGTERM and names the signal.
#[cfg(unix)]
async fn shutdown_signal() -> &'static str {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut term) => {
            tokio::select! {
                _ = wait_for_ctrl_c() => "SIGINT",
                _ = term.recv() => "SIGTERM",
            }
        }
        Err(e) => {
            warn!("cannot listen for SIGTERM: {e}");
            wait_for_ctrl_c().await;
            "SIGINT"
        }
    }
}

#[cfg(not(unix))]
async fn shutdown_signal() -> &'static str {
    wait_for_ctrl_c().await;
    "Ctrl+C"
}

async fn wait_for_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("cannot listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}
