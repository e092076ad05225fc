//! vidnote - timestamped notes for the video you are watching
//!
//! Notes are stored per video, kept in playback order, and can be
//! exported as plain text or HTML with links back to each moment.

pub mod capture;
pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod player;
pub mod storage;

pub use error::{NoteError, NoteResult};
