//! # DS4 Bridge
//!
//! React to DualShock 4 controller events with LED, rumble and discovery
//! control.
//!
//! The binary runs the reaction layer against a simulated transport, fed
//! from a JSON Lines replay script.

use anyhow::{Context, Result};
use clap::Parser;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::{AsyncBufRead, BufReader};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

use ds4_bridge::actuator::TracingActuator;
use ds4_bridge::config::{Config, LoggingConfig};
use ds4_bridge::diagnostics::TracingSink;
use ds4_bridge::replay::Replay;

/// Configuration file used when none is given on the command line
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// File name prefix for rolling log files
const LOG_FILE_PREFIX: &str = "ds4-bridge.log";

/// Command line arguments
#[derive(Parser, Debug)]
#[command(version, about)]
struct Args {
    /// Configuration file; built-in defaults are used if it does not exist
    #[arg(default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// JSON Lines replay script; read from stdin when omitted
    script: Option<PathBuf>,
}

/// Loads the configuration, falling back to defaults if the file is missing.
///
/// Returns the configuration and whether it came from the file.
fn load_config(path: &Path) -> Result<(Config, bool)> {
    if !path.exists() {
        return Ok((Config::default(), false));
    }
    let config =
        Config::load(path).with_context(|| format!("Failed to load {}", path.display()))?;
    Ok((config, true))
}

/// Sets up console logging, plus a daily rolling file when `log_dir` is set.
///
/// `RUST_LOG` overrides the configured level. The returned guard flushes the
/// file writer and must live until the end of `main`.
fn init_logging(config: &LoggingConfig) -> Option<WorkerGuard> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match &config.log_dir {
        Some(dir) => {
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer())
                .with(fmt::layer().with_ansi(false).with_writer(writer))
                .init();
            Some(guard)
        }
        None => {
            tracing_subscriber::fmt().with_env_filter(filter).init();
            None
        }
    }
}

/// Replays `reader` until it ends or Ctrl+C is pressed.
async fn run_until_ctrl_c<R>(replay: &Replay, reader: R) -> Result<()>
where
    R: AsyncBufRead + Unpin,
{
    tokio::select! {
        result = replay.run(reader) => {
            result?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Received Ctrl+C, shutting down...");
        }
    }
    Ok(())
}

/// Main entry point for DS4 Bridge
///
/// # Usage
///
/// ```text
/// ds4-bridge [CONFIG] [SCRIPT]
/// ```
///
/// `CONFIG` defaults to `config/default.toml`; built-in defaults are used if
/// it does not exist. Without `SCRIPT`, script lines are read from stdin.
/// `--help` prints usage and exits.
///
/// # Errors
///
/// Returns error if:
/// - The configuration file exists but is invalid
/// - The script file cannot be opened or read
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let (config, from_file) = load_config(&args.config)?;
    let _guard = init_logging(&config.logging);

    info!("DS4 Bridge v{} starting...", env!("CARGO_PKG_VERSION"));
    if !from_file {
        warn!(
            "{} not found, using default configuration",
            args.config.display()
        );
    }

    let replay = Replay::from_config(&config, Arc::new(TracingActuator), Arc::new(TracingSink))?;
    info!(
        "Discovery button on pin {} (pull-{})",
        config.button.pin,
        if config.button.pull_up { "up" } else { "down" }
    );

    match args.script {
        Some(path) => {
            let file = tokio::fs::File::open(&path)
                .await
                .with_context(|| format!("Failed to open script {}", path.display()))?;
            info!("Replaying {}", path.display());
            run_until_ctrl_c(&replay, BufReader::new(file)).await
        }
        None => {
            info!("Reading script from stdin");
            run_until_ctrl_c(&replay, BufReader::new(tokio::io::stdin())).await
        }
    }
}
