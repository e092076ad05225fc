//! Command-line interface for vidnote.
//!
//! Provides the CLI commands for taking, listing, and exporting notes,
//! plus the helpers they share for opening the store and reaching the
//! player.

/// Individual CLI command implementations.
pub mod commands;

/// Output formatting utilities.
pub mod format;

use anyhow::{Context, Result};
use std::sync::Arc;

use vidnote_cli::config::Config;
use vidnote_cli::context::{ContentId, Navigator};
use vidnote_cli::player::{socket_client, PlayerClient, SocketChannel};
use vidnote_cli::storage::{Database, Note, NoteList, NoteStore};

pub use format::OutputFormat;

/// Opens the note store configured in `config`.
pub fn open_store(config: &Config) -> Result<NoteStore<Database>> {
    let path = config.database_path()?;
    let db = Database::open(&path)
        .with_context(|| format!("Failed to open database at {}", path.display()))?;
    Ok(NoteStore::new(db))
}

/// Client for the configured player bridge.
pub fn player(config: &Config) -> Result<Arc<PlayerClient<SocketChannel>>> {
    let socket_path = config.socket_path()?;
    Ok(Arc::new(socket_client(&socket_path, config.position_timeout())))
}

/// Resolves a watch URL or bare video ID from the command line.
pub fn resolve_video(config: &Config, input: &str) -> Result<ContentId> {
    let watch_page = config.watch_page()?;
    ContentId::resolve_on(input, &watch_page).with_context(|| {
        format!(
            "Pass a watch URL such as '{}?v=ID' or the bare video ID",
            config.watch_url
        )
    })
}

/// Navigator bound to the configured watch page.
pub fn navigator(config: &Config) -> Result<Navigator> {
    Ok(Navigator::for_watch_page(config.watch_page()?))
}

/// The most recently written note and its position in the list.
pub fn newest_note(notes: &NoteList) -> Option<(usize, &Note)> {
    notes
        .iter()
        .enumerate()
        .max_by_key(|(_, note)| note.created_at)
}

/// Converts a 1-based note number from the command line to an index.
pub fn note_index(number: usize) -> Result<usize> {
    number
        .checked_sub(1)
        .context("Note numbers start at 1. Run 'vidnote list' to see them.")
}
