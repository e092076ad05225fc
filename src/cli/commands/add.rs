//! Add command - attach a note to a video.
//!
//! The note is stamped with the player's current position unless `--at`
//! gives one explicitly.

use anyhow::{Context, Result};
use colored::Colorize;

use vidnote_cli::capture::CaptureSession;
use vidnote_cli::config::Config;
use vidnote_cli::export::{format_time, parse_time};
use vidnote_cli::storage::{Note, NoteList};
use vidnote_cli::NoteError;

use crate::cli::{navigator, newest_note, open_store, player, resolve_video};

/// Arguments for the add command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    vidnote add abc123 \"Great explanation of lifetimes\"\n    \
    vidnote add 'https://www.youtube.com/watch?v=abc123' Key point\n    \
    vidnote add abc123 --at 12:30 \"Added later\"")]
pub struct Args {
    /// Watch URL or video ID
    #[arg(value_name = "VIDEO")]
    pub video: String,

    /// Note text (remaining words are joined with spaces)
    #[arg(value_name = "TEXT", required = true, num_args = 1..)]
    pub text: Vec<String>,

    /// Timestamp to use instead of asking the player (SS, MM:SS, or HH:MM:SS)
    #[arg(long, value_name = "TIME")]
    pub at: Option<String>,
}

/// Executes the add command.
pub fn run(args: Args) -> Result<()> {
    let config = Config::load()?;
    let store = open_store(&config)?;
    let text = args.text.join(" ");

    let result = match args.at {
        Some(at) => {
            let id = resolve_video(&config, &args.video)?;
            let time = parse_time(&at)?;
            store.append(&id, Note::new(text.trim(), time))
        }
        None => {
            let navigator = navigator(&config)?;
            let token = navigator.navigate(&args.video).map_err(|e| {
                anyhow::anyhow!("{e}. Pass a watch URL or the bare video ID.")
            })?;
            let client = player(&config)?;
            let mut session = CaptureSession::new(navigator, token, config.position_timeout());

            let rt = tokio::runtime::Runtime::new().context("Failed to create tokio runtime")?;
            rt.block_on(session.submit(&store, &text, client.as_ref()))
        }
    };

    match result {
        Ok(notes) => {
            print_added(&notes);
            Ok(())
        }
        Err(NoteError::EmptyInput) => Ok(()),
        Err(NoteError::PositionUnavailable(reason)) => anyhow::bail!(
            "Could not read the playback position: {reason}\n\
             Start the player bridge with 'vidnote player', or pass --at to set the time yourself."
        ),
        Err(e) => Err(e.into()),
    }
}

fn print_added(notes: &NoteList) {
    let Some((index, note)) = newest_note(notes) else {
        return;
    };
    println!(
        "{} note {} at {}",
        "Added".green(),
        (index + 1).to_string().cyan(),
        format_time(note.time).yellow()
    );
}
