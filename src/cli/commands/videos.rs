//! Videos command - list every video that has notes.

use anyhow::Result;
use colored::Colorize;
use serde::Serialize;

use vidnote_cli::config::Config;

use crate::cli::format::to_json;
use crate::cli::{open_store, OutputFormat};

/// Arguments for the videos command.
#[derive(clap::Args)]
pub struct Args {
    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Serialize)]
struct VideoSummary {
    id: String,
    notes: usize,
}

/// Executes the videos command.
pub fn run(args: Args) -> Result<()> {
    let config = Config::load()?;
    let store = open_store(&config)?;
    let videos: Vec<VideoSummary> = store
        .list_ids()?
        .into_iter()
        .map(|(id, notes)| VideoSummary {
            id: id.to_string(),
            notes,
        })
        .collect();

    match args.format {
        OutputFormat::Json => println!("{}", to_json(&videos)?),
        OutputFormat::Text => {
            if videos.is_empty() {
                println!("{}", "No notes yet.".dimmed());
                println!();
                println!("Run 'vidnote add <VIDEO> <TEXT>' to take your first note.");
                return Ok(());
            }
            for video in &videos {
                let label = if video.notes == 1 { "note" } else { "notes" };
                println!("  {}  {} {}", video.id.cyan(), video.notes, label.dimmed());
            }
        }
    }
    Ok(())
}
