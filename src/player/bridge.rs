//! Player bridge server.
//!
//! Answers position and seek requests over a Unix socket from a local
//! playback clock. Runs in the foreground via `vidnote player`; anything
//! that drives a real player can speak the same protocol instead.

use anyhow::{Context, Result};
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{broadcast, RwLock};

use super::protocol::{PlayerCommand, PlayerResponse};

/// A playback position that advances with wall-clock time while playing.
#[derive(Debug, Clone)]
pub struct PlaybackClock {
    position: f64,
    anchor: Instant,
    playing: bool,
    loaded: bool,
}

impl PlaybackClock {
    /// A clock at `position` seconds, optionally already playing.
    pub fn new(position: f64, playing: bool) -> Self {
        Self {
            position: position.max(0.0),
            anchor: Instant::now(),
            playing,
            loaded: true,
        }
    }

    /// A clock with no video loaded; every request is answered with an error.
    pub fn unloaded() -> Self {
        Self {
            loaded: false,
            ..Self::new(0.0, false)
        }
    }

    /// Current position in seconds.
    pub fn current_time(&self) -> f64 {
        if self.playing {
            self.position + self.anchor.elapsed().as_secs_f64()
        } else {
            self.position
        }
    }

    /// Moves to `time` and starts playing.
    pub fn seek(&mut self, time: f64) {
        self.position = time.max(0.0);
        self.anchor = Instant::now();
        self.playing = true;
    }

    pub fn pause(&mut self) {
        self.position = self.current_time();
        self.playing = false;
    }

    pub fn is_playing(&self) -> bool {
        self.playing
    }

    fn handle(&mut self, command: PlayerCommand) -> PlayerResponse {
        if matches!(command, PlayerCommand::Ping) {
            return PlayerResponse::Pong;
        }
        if !self.loaded {
            return PlayerResponse::Error {
                message: "No video found".to_string(),
            };
        }
        match command {
            PlayerCommand::GetTime => PlayerResponse::CurrentTime {
                current_time: self.current_time(),
            },
            PlayerCommand::SeekTo { time } if time.is_finite() => {
                self.seek(time);
                PlayerResponse::Seeked
            }
            PlayerCommand::SeekTo { time } => PlayerResponse::Error {
                message: format!("Invalid seek target: {time}"),
            },
            PlayerCommand::Ping => PlayerResponse::Pong,
        }
    }
}

/// Runs the bridge on `socket_path` until `shutdown_rx` fires.
///
/// # Errors
///
/// Returns an error if the socket cannot be created or bound.
pub async fn run_bridge(
    socket_path: &Path,
    clock: Arc<RwLock<PlaybackClock>>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    // Remove a stale socket left by a previous run
    if socket_path.exists() {
        std::fs::remove_file(socket_path).context("Failed to remove existing socket file")?;
    }
    if let Some(parent) = socket_path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create socket directory")?;
    }

    let listener = UnixListener::bind(socket_path).context("Failed to bind Unix socket")?;

    tracing::info!("Player bridge listening on {:?}", socket_path);

    loop {
        tokio::select! {
            accept_result = listener.accept() => {
                match accept_result {
                    Ok((stream, _addr)) => {
                        let clock = clock.clone();
                        let conn_shutdown = shutdown_rx.resubscribe();
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(stream, clock, conn_shutdown).await {
                                tracing::warn!("Error handling player connection: {}", e);
                            }
                        });
                    }
                    Err(e) => {
                        tracing::warn!("Failed to accept connection: {}", e);
                    }
                }
            }
            _ = shutdown_rx.recv() => {
                tracing::info!("Player bridge shutting down");
                break;
            }
        }
    }

    if socket_path.exists() {
        let _ = std::fs::remove_file(socket_path);
    }
    Ok(())
}

/// Serves commands from one client until it disconnects or the bridge stops.
async fn handle_connection(
    stream: UnixStream,
    clock: Arc<RwLock<PlaybackClock>>,
    mut shutdown_rx: broadcast::Receiver<()>,
) -> Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    let mut line = String::new();

    loop {
        line.clear();
        let read = tokio::select! {
            read = reader.read_line(&mut line) => read.context("Failed to read from socket")?,
            _ = shutdown_rx.recv() => return Ok(()),
        };
        if read == 0 {
            return Ok(());
        }

        let response = match serde_json::from_str::<PlayerCommand>(line.trim()) {
            Ok(command) => {
                tracing::debug!("Received player command: {:?}", command);
                clock.write().await.handle(command)
            }
            Err(e) => PlayerResponse::Error {
                message: format!("Failed to parse command: {e}"),
            },
        };

        let response_json =
            serde_json::to_string(&response).context("Failed to serialize response")?;
        writer
            .write_all(response_json.as_bytes())
            .await
            .context("Failed to write response")?;
        writer
            .write_all(b"\n")
            .await
            .context("Failed to write newline")?;
        writer.flush().await.context("Failed to flush writer")?;
    }
}
