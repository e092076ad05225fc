//! CLI commands for vidnote.
//!
//! Each submodule implements a single CLI command with its argument
//! parsing and execution logic.

/// Add a note at the current (or a given) playback position.
pub mod add;

/// Generate shell completion scripts.
pub mod completions;

/// Interactive note composer.
pub mod compose;

/// Configuration viewing and management.
pub mod config;

/// Remove a note from a video.
pub mod delete;

/// Export notes as plain text or HTML.
pub mod export;

/// List the notes for a video.
pub mod list;

/// Run the local player bridge.
pub mod player;

/// Jump playback to a note.
pub mod seek;

/// List videos that have notes.
pub mod videos;
