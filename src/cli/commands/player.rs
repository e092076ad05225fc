//! Player command - run the local player bridge.
//!
//! Serves playback position and seek requests on the configured socket
//! from a clock that starts at `--at` and runs until Ctrl+C. Useful when
//! watching on a device vidnote cannot reach directly: start the bridge
//! when the video starts and notes line up with the video.

use anyhow::{Context, Result};
use colored::Colorize;
use std::path::Path;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::{broadcast, RwLock};
use tracing_appender::non_blocking::WorkerGuard;

use vidnote_cli::config::{vidnote_dir, Config};
use vidnote_cli::export::parse_time;
use vidnote_cli::player::{run_bridge, PlaybackClock};

/// Arguments for the player command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    vidnote player                 Start a clock at 00:00\n    \
    vidnote player --at 4:30       Start a clock at 04:30\n    \
    vidnote player --paused        Wait for the first seek before running")]
pub struct Args {
    /// Starting position (SS, MM:SS, or HH:MM:SS)
    #[arg(long, value_name = "TIME", default_value = "0")]
    pub at: String,

    /// Start paused; the clock runs after the first seek
    #[arg(long)]
    pub paused: bool,

    /// Log to ~/.vidnote/player.log instead of stderr
    #[arg(long)]
    pub log_file: bool,
}

/// Executes the player command.
pub fn run(args: Args) -> Result<()> {
    let config = Config::load()?;
    let socket_path = config.socket_path()?;
    let start = parse_time(&args.at)?;

    println!(
        "{} on {} (Ctrl+C to stop)",
        "Player bridge running".green(),
        socket_path.display().to_string().cyan()
    );

    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    rt.block_on(serve(&socket_path, PlaybackClock::new(start, !args.paused)))
}

async fn serve(socket_path: &Path, clock: PlaybackClock) -> Result<()> {
    let clock = Arc::new(RwLock::new(clock));
    let (shutdown_tx, shutdown_rx) = broadcast::channel::<()>(1);

    let path = socket_path.to_path_buf();
    let mut server_handle =
        tokio::spawn(async move { run_bridge(&path, clock, shutdown_rx).await });

    tokio::select! {
        _ = signal::ctrl_c() => {
            tracing::info!("Received Ctrl+C, shutting down...");
        }
        result = &mut server_handle => {
            return result.context("Player bridge task failed")?;
        }
    }

    let _ = shutdown_tx.send(());

    // Give the bridge time to remove its socket
    match tokio::time::timeout(tokio::time::Duration::from_millis(500), server_handle).await {
        Ok(result) => result.context("Player bridge task failed")?,
        Err(_) => {
            tracing::warn!("Player bridge did not stop in time");
            Ok(())
        }
    }
}

/// Sets up file logging for the bridge.
///
/// Configures tracing to write to `player.log` in the data directory.
/// Returns a guard that must be kept alive while the bridge runs.
pub fn init_file_logging(filter: &str) -> Result<WorkerGuard> {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let dir = vidnote_dir()?;
    std::fs::create_dir_all(&dir).context("Failed to create data directory")?;
    let file_appender = tracing_appender::rolling::never(&dir, "player.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = tracing_subscriber::fmt::layer()
        .with_writer(non_blocking)
        .with_ansi(false);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| filter.into()),
        )
        .with(file_layer)
        .try_init()
        .context("Failed to initialize logging")?;

    Ok(guard)
}
