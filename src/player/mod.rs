//! Communication with the video player.
//!
//! The player is reached through a bridge process listening on a Unix
//! socket. It provides:
//!
//! - **Protocol**: JSON-line commands (`get_time`, `seek_to`, `ping`)
//! - **Client**: a [`PositionProvider`] with one re-establish-and-retry
//! - **Bridge**: a server answering from a local playback clock

pub mod bridge;
pub mod client;
pub mod protocol;

pub use bridge::{run_bridge, PlaybackClock};
pub use client::{socket_client, PlayerChannel, PlayerClient, PositionProvider, SocketChannel};
pub use protocol::{PlayerCommand, PlayerResponse};
