//! List command - show the notes for a video.

use anyhow::Result;
use colored::Colorize;

use vidnote_cli::config::Config;
use vidnote_cli::export::format_time;

use crate::cli::format::to_json;
use crate::cli::{open_store, resolve_video, OutputFormat};

/// Arguments for the list command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    vidnote list abc123                  List notes in playback order\n    \
    vidnote list abc123 --format json    Output the stored note list as JSON")]
pub struct Args {
    /// Watch URL or video ID
    #[arg(value_name = "VIDEO")]
    pub video: String,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

/// Executes the list command.
pub fn run(args: Args) -> Result<()> {
    let config = Config::load()?;
    let store = open_store(&config)?;
    let id = resolve_video(&config, &args.video)?;
    let notes = store.load(&id)?;

    match args.format {
        OutputFormat::Json => {
            println!("{}", to_json(&notes)?);
        }
        OutputFormat::Text => {
            if notes.is_empty() {
                println!("{}", "No notes yet for this video.".dimmed());
                return Ok(());
            }

            println!("{} {}", "Notes for".bold(), id.to_string().cyan());
            println!();
            for (number, note) in notes.iter().enumerate() {
                println!(
                    "  {:>3}  {}  {}",
                    (number + 1).to_string().dimmed(),
                    format_time(note.time).yellow(),
                    note.text
                );
            }
        }
    }

    Ok(())
}
