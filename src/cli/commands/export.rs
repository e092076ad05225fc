//! Export command - render a video's notes as plain text or HTML.
//!
//! Output goes to stdout by default, to a file with `--output`, or to the
//! system clipboard with `--clipboard`. File and clipboard exports try HTML
//! first and fall back to plain text.

use std::path::PathBuf;

use anyhow::Result;
use colored::Colorize;

use vidnote_cli::config::Config;
use vidnote_cli::export::{
    deliver, ClipboardSink, Delivery, ExportSink, FileSink, NoteExporter, StdoutSink,
};

use crate::cli::{open_store, resolve_video};

/// Arguments for the export command.
#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    vidnote export abc123                          Print plain text\n    \
    vidnote export abc123 --format html            Print HTML\n    \
    vidnote export abc123 --title \"Rust talk\"      Set the heading\n    \
    vidnote export abc123 --clipboard              Copy (HTML if supported)\n    \
    vidnote export abc123 -o notes.html            Write an HTML file")]
pub struct Args {
    /// Watch URL or video ID
    #[arg(value_name = "VIDEO")]
    pub video: String,

    /// Heading for the export (defaults to "Notes for <VIDEO>")
    #[arg(short, long)]
    pub title: Option<String>,

    /// Output format for stdout: plain (default) or html
    #[arg(short, long, value_enum, default_value = "plain")]
    pub format: ExportFormat,

    /// Copy to the system clipboard instead of printing
    #[arg(long, conflicts_with = "output")]
    pub clipboard: bool,

    /// Write output to a file instead of stdout (.html files get HTML)
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Export format options.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum ExportFormat {
    /// Title, blank line, then one "MM:SS - text" line per note.
    #[default]
    Plain,
    /// Heading plus one paragraph per note with a timestamp link.
    Html,
}

/// Executes the export command.
pub fn run(args: Args) -> Result<()> {
    let config = Config::load()?;
    let store = open_store(&config)?;
    let id = resolve_video(&config, &args.video)?;
    let notes = store.load(&id)?;

    let title = args.title.unwrap_or_else(|| format!("Notes for {id}"));
    let exporter = NoteExporter::new(&config.watch_url)?;
    let payload = exporter.export(&notes, &title, &id);

    if args.clipboard {
        let delivery = deliver(&ClipboardSink, &payload)?;
        report(delivery, "clipboard", notes.len());
    } else if let Some(path) = args.output {
        let delivery = deliver(&FileSink { path: path.clone() }, &payload)?;
        report(delivery, &path.display().to_string(), notes.len());
    } else {
        match args.format {
            ExportFormat::Plain => StdoutSink.write_plain(&payload.plain)?,
            ExportFormat::Html => print!("{}", payload.html),
        }
    }

    Ok(())
}

fn report(delivery: Delivery, target: &str, count: usize) {
    let kind = match delivery {
        Delivery::Rich => "HTML",
        Delivery::Plain => "plain text",
    };
    eprintln!(
        "{} {} notes to {} as {}",
        "Exported".green(),
        count,
        target.cyan(),
        kind
    );
}
