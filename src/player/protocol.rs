//! Wire format spoken between vidnote and a player bridge.
//!
//! Each message is one JSON object on its own line. A connection may carry
//! any number of command/response pairs.

use serde::{Deserialize, Serialize};

/// Requests sent to the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum PlayerCommand {
    /// Ask for the current playback position.
    GetTime,
    /// Jump to `time` seconds and resume playback.
    SeekTo { time: f64 },
    /// Check the bridge is responsive.
    Ping,
}

/// Replies from the player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum PlayerResponse {
    /// Current playback position in seconds.
    CurrentTime { current_time: f64 },
    /// Seek acknowledged.
    Seeked,
    /// Ping response.
    Pong,
    /// The player could not serve the request (e.g. no video loaded).
    Error { message: String },
}
