//! Seek command - jump playback to a note.

use anyhow::{Context, Result};
use colored::Colorize;

use vidnote_cli::config::Config;
use vidnote_cli::export::format_time;
use vidnote_cli::player::PositionProvider;

use crate::cli::{note_index, open_store, player, resolve_video};

/// Arguments for the seek command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    vidnote seek abc123 3    Jump the player to note 3")]
pub struct Args {
    /// Watch URL or video ID
    #[arg(value_name = "VIDEO")]
    pub video: String,

    /// Note number as shown by 'vidnote list'
    #[arg(value_name = "NUMBER")]
    pub number: usize,
}

/// Executes the seek command.
pub fn run(args: Args) -> Result<()> {
    let config = Config::load()?;
    let store = open_store(&config)?;
    let id = resolve_video(&config, &args.video)?;
    let index = note_index(args.number)?;

    let notes = store.load(&id)?;
    let note = notes.get(index).with_context(|| {
        format!(
            "No note {} for video '{}'. Run 'vidnote list {}' to see them.",
            args.number, id, id
        )
    })?;

    let client = player(&config)?;
    let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
    rt.block_on(client.seek_to(note.time))
        .context("Seek failed. Is 'vidnote player' running?")?;

    println!(
        "{} {}  {}",
        "Jumped to".green(),
        format_time(note.time).yellow(),
        note.text
    );
    Ok(())
}
