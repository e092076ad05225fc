//! Client side of the player channel.
//!
//! [`PlayerClient`] turns the line protocol into a [`PositionProvider`].
//! A failed exchange gets exactly one retry, after the channel has been
//! re-established.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::Mutex;

use super::protocol::{PlayerCommand, PlayerResponse};
use crate::error::{NoteError, NoteResult};

/// Source of the playback position, and the way to move it.
#[async_trait]
pub trait PositionProvider: Send + Sync {
    /// Current playback position in seconds.
    async fn current_position(&self) -> NoteResult<f64>;

    /// Jumps playback to `seconds`.
    async fn seek_to(&self, seconds: f64) -> NoteResult<()>;
}

/// A request/response transport to the player.
#[async_trait]
pub trait PlayerChannel: Send {
    /// Sends one command and waits for its response.
    async fn send(&mut self, command: &PlayerCommand) -> Result<PlayerResponse>;

    /// Tears down any existing connection and opens a fresh one.
    async fn establish(&mut self) -> Result<()>;
}

/// Talks to a player over a [`PlayerChannel`].
pub struct PlayerClient<C> {
    channel: Mutex<C>,
    timeout: Duration,
}

impl<C: PlayerChannel> PlayerClient<C> {
    /// Wraps `channel`; each attempt is limited to `timeout`.
    pub fn new(channel: C, timeout: Duration) -> Self {
        Self {
            channel: Mutex::new(channel),
            timeout,
        }
    }

    /// Sends `command`, re-establishing the channel and retrying once on failure.
    pub async fn request(&self, command: PlayerCommand) -> NoteResult<PlayerResponse> {
        let mut channel = self.channel.lock().await;

        let first_err = match self.attempt(&mut *channel, &command).await {
            Ok(response) => return Ok(response),
            Err(e) => e,
        };
        tracing::debug!("Player request failed ({first_err:#}), re-establishing channel");

        tokio::time::timeout(self.timeout, channel.establish())
            .await
            .map_err(|_| anyhow!("timed out connecting to the player"))
            .and_then(|result| result)
            .map_err(|e| NoteError::position(format!("{e:#}")))?;

        self.attempt(&mut *channel, &command)
            .await
            .map_err(|e| NoteError::position(format!("{e:#}")))
    }

    async fn attempt(&self, channel: &mut C, command: &PlayerCommand) -> Result<PlayerResponse> {
        tokio::time::timeout(self.timeout, channel.send(command))
            .await
            .map_err(|_| anyhow!("timed out waiting for the player"))?
    }

    /// Checks the player answers.
    pub async fn ping(&self) -> NoteResult<()> {
        match self.request(PlayerCommand::Ping).await? {
            PlayerResponse::Pong => Ok(()),
            other => Err(unexpected(other)),
        }
    }
}

#[async_trait]
impl<C: PlayerChannel> PositionProvider for PlayerClient<C> {
    async fn current_position(&self) -> NoteResult<f64> {
        match self.request(PlayerCommand::GetTime).await? {
            PlayerResponse::CurrentTime { current_time } if current_time.is_finite() => {
                Ok(current_time.max(0.0))
            }
            other => Err(unexpected(other)),
        }
    }

    async fn seek_to(&self, seconds: f64) -> NoteResult<()> {
        match self.request(PlayerCommand::SeekTo { time: seconds }).await? {
            PlayerResponse::Seeked => Ok(()),
            other => Err(unexpected(other)),
        }
    }
}

fn unexpected(response: PlayerResponse) -> NoteError {
    match response {
        PlayerResponse::Error { message } => NoteError::PositionUnavailable(message),
        other => NoteError::PositionUnavailable(format!("unexpected player response: {other:?}")),
    }
}

struct Connection {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

/// [`PlayerChannel`] over a Unix domain socket, connected on first use.
pub struct SocketChannel {
    socket_path: PathBuf,
    conn: Option<Connection>,
}

impl SocketChannel {
    pub fn new(socket_path: impl Into<PathBuf>) -> Self {
        Self {
            socket_path: socket_path.into(),
            conn: None,
        }
    }

    pub fn socket_path(&self) -> &Path {
        &self.socket_path
    }

    async fn connect(&mut self) -> Result<&mut Connection> {
        if self.conn.is_none() {
            let stream = UnixStream::connect(&self.socket_path)
                .await
                .with_context(|| {
                    format!("Failed to connect to player at {}", self.socket_path.display())
                })?;
            let (reader, writer) = stream.into_split();
            self.conn = Some(Connection {
                reader: BufReader::new(reader),
                writer,
            });
        }
        self.conn
            .as_mut()
            .ok_or_else(|| anyhow!("player connection missing"))
    }

    async fn exchange(&mut self, command: &PlayerCommand) -> Result<PlayerResponse> {
        let conn = self.connect().await?;

        let command_json = serde_json::to_string(command).context("Failed to serialize command")?;
        conn.writer
            .write_all(command_json.as_bytes())
            .await
            .context("Failed to write command")?;
        conn.writer
            .write_all(b"\n")
            .await
            .context("Failed to write newline")?;
        conn.writer.flush().await.context("Failed to flush")?;

        let mut line = String::new();
        let read = conn
            .reader
            .read_line(&mut line)
            .await
            .context("Failed to read response")?;
        if read == 0 {
            bail!("Player closed the connection");
        }

        serde_json::from_str(line.trim()).context("Failed to parse response")
    }
}

#[async_trait]
impl PlayerChannel for SocketChannel {
    async fn send(&mut self, command: &PlayerCommand) -> Result<PlayerResponse> {
        let result = self.exchange(command).await;
        if result.is_err() {
            self.conn = None;
        }
        result
    }

    async fn establish(&mut self) -> Result<()> {
        self.conn = None;
        self.connect().await?;
        Ok(())
    }
}

/// Client for the player bridge listening on `socket_path`.
pub fn socket_client(socket_path: &Path, timeout: Duration) -> PlayerClient<SocketChannel> {
    PlayerClient::new(SocketChannel::new(socket_path), timeout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Channel that replays scripted outcomes and counts calls.
    struct ScriptedChannel {
        outcomes: VecDeque<Result<PlayerResponse>>,
        establish_ok: bool,
        sends: Arc<AtomicUsize>,
        establishes: Arc<AtomicUsize>,
    }

    impl ScriptedChannel {
        fn new(outcomes: Vec<Result<PlayerResponse>>) -> Self {
            Self {
                outcomes: outcomes.into(),
                establish_ok: true,
                sends: Arc::new(AtomicUsize::new(0)),
                establishes: Arc::new(AtomicUsize::new(0)),
            }
        }
    }

    #[async_trait]
    impl PlayerChannel for ScriptedChannel {
        async fn send(&mut self, _command: &PlayerCommand) -> Result<PlayerResponse> {
            self.sends.fetch_add(1, Ordering::SeqCst);
            self.outcomes
                .pop_front()
                .unwrap_or_else(|| Err(anyhow!("script exhausted")))
        }

        async fn establish(&mut self) -> Result<()> {
            self.establishes.fetch_add(1, Ordering::SeqCst);
            if self.establish_ok {
                Ok(())
            } else {
                bail!("cannot reach player")
            }
        }
    }

    /// Channel whose sends never complete.
    struct StalledChannel;

    #[async_trait]
    impl PlayerChannel for StalledChannel {
        async fn send(&mut self, _command: &PlayerCommand) -> Result<PlayerResponse> {
            std::future::pending().await
        }

        async fn establish(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_position_first_try() {
        let channel =
            ScriptedChannel::new(vec![Ok(PlayerResponse::CurrentTime { current_time: 42.0 })]);
        let establishes = channel.establishes.clone();
        let client = PlayerClient::new(channel, Duration::from_secs(1));

        assert_eq!(client.current_position().await.unwrap(), 42.0);
        assert_eq!(establishes.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_retries_once_after_establish() {
        let channel = ScriptedChannel::new(vec![
            Err(anyhow!("not connected")),
            Ok(PlayerResponse::CurrentTime { current_time: 7.5 }),
        ]);
        let sends = channel.sends.clone();
        let establishes = channel.establishes.clone();
        let client = PlayerClient::new(channel, Duration::from_secs(1));

        assert_eq!(client.current_position().await.unwrap(), 7.5);
        assert_eq!(sends.load(Ordering::SeqCst), 2);
        assert_eq!(establishes.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_gives_up_after_single_retry() {
        let channel = ScriptedChannel::new(vec![
            Err(anyhow!("not connected")),
            Err(anyhow!("still not connected")),
            Ok(PlayerResponse::CurrentTime { current_time: 1.0 }),
        ]);
        let sends = channel.sends.clone();
        let client = PlayerClient::new(channel, Duration::from_secs(1));

        let err = client.current_position().await.unwrap_err();
        assert!(matches!(err, NoteError::PositionUnavailable(_)));
        assert_eq!(sends.load(Ordering::SeqCst), 2, "Should not retry twice");
    }

    #[tokio::test]
    async fn test_establish_failure_is_unavailable() {
        let mut channel = ScriptedChannel::new(vec![Err(anyhow!("not connected"))]);
        channel.establish_ok = false;
        let client = PlayerClient::new(channel, Duration::from_secs(1));

        assert!(matches!(
            client.current_position().await,
            Err(NoteError::PositionUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_player_error_is_not_retried() {
        let channel = ScriptedChannel::new(vec![Ok(PlayerResponse::Error {
            message: "No video found".to_string(),
        })]);
        let sends = channel.sends.clone();
        let client = PlayerClient::new(channel, Duration::from_secs(1));

        let err = client.current_position().await.unwrap_err();
        assert_eq!(err, NoteError::PositionUnavailable("No video found".to_string()));
        assert_eq!(sends.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stalled_player_times_out() {
        let client = PlayerClient::new(StalledChannel, Duration::from_millis(20));
        assert!(matches!(
            client.current_position().await,
            Err(NoteError::PositionUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_socket_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let client = socket_client(&dir.path().join("absent.sock"), Duration::from_millis(200));
        assert!(matches!(
            client.ping().await,
            Err(NoteError::PositionUnavailable(_))
        ));
    }
}
