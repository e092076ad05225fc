//! Delete command - remove a note from a video.
//!
//! Removes a single note by its number in `vidnote list`. This operation
//! is irreversible.

use std::io::{self, Write};

use anyhow::Result;
use colored::Colorize;

use vidnote_cli::config::Config;
use vidnote_cli::export::format_time;
use vidnote_cli::NoteError;

use crate::cli::{note_index, open_store, resolve_video};

/// Arguments for the delete command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    vidnote delete abc123 2            Delete note 2 (prompts for confirmation)\n    \
    vidnote delete abc123 2 --force    Delete without confirmation")]
pub struct Args {
    /// Watch URL or video ID
    #[arg(value_name = "VIDEO")]
    pub video: String,

    /// Note number as shown by 'vidnote list'
    #[arg(value_name = "NUMBER")]
    pub number: usize,

    /// Skip the confirmation prompt
    #[arg(long)]
    pub force: bool,
}

/// Executes the delete command.
pub fn run(args: Args) -> Result<()> {
    let config = Config::load()?;
    let store = open_store(&config)?;
    let id = resolve_video(&config, &args.video)?;
    let index = note_index(args.number)?;

    let notes = store.load(&id)?;
    let Some(note) = notes.get(index) else {
        if notes.is_empty() {
            anyhow::bail!("No notes for video '{id}'.");
        }
        anyhow::bail!(
            "No note {} for video '{}' (it has {} notes). Run 'vidnote list {}' to see them.",
            args.number,
            id,
            notes.len(),
            id
        );
    };

    println!();
    println!("  {}  {}", format_time(note.time).yellow(), note.text);
    println!();

    // Confirm unless --force
    if !args.force {
        print!("Delete note {}? [y/N] ", args.number.to_string().cyan());
        io::stdout().flush()?;

        let mut input = String::new();
        io::stdin().read_line(&mut input)?;

        if !input.trim().eq_ignore_ascii_case("y") {
            println!("{}", "Cancelled".dimmed());
            return Ok(());
        }
    }

    match store.delete(&id, index) {
        Ok(remaining) => {
            println!(
                "{} note {} ({} remaining)",
                "Deleted".green(),
                args.number.to_string().cyan(),
                remaining.len()
            );
            Ok(())
        }
        Err(e @ NoteError::IndexOutOfRange { .. }) => {
            anyhow::bail!("{e}. The list changed while confirming; nothing was deleted.")
        }
        Err(e) => Err(e.into()),
    }
}
