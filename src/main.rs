use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::commands;

/// The main CLI command line interface.
#[derive(Parser)]
#[command(name = "vidnote")]
#[command(version)]
#[command(about = "Timestamped notes for the video you are watching")]
#[command(long_about = "vidnote attaches notes to moments in a video. Each note is stamped\n\
    with the playback position from when you started typing it, kept in\n\
    playback order, and can be exported with links back to each moment.")]
#[command(after_help = "EXAMPLES:\n    \
    vidnote player &                    Start the local player bridge\n    \
    vidnote compose abc123              Take notes while watching\n    \
    vidnote add abc123 \"Key point\"      Add a single note\n    \
    vidnote list abc123                 Show notes in playback order\n    \
    vidnote export abc123 --clipboard   Copy notes with timestamp links\n\n\
    For more information about a command, run 'vidnote <command> --help'.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    verbose: bool,
}

/// Available CLI subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Add a note at the current playback position
    #[command(long_about = "Stores one note for a video. The note is stamped with the\n\
        position reported by the player bridge, or with --at when given.")]
    Add(commands::add::Args),

    /// Take notes interactively while watching
    #[command(long_about = "Opens an input line for a video. The playback position is captured\n\
        as soon as you start typing, 5 seconds early to cover reaction time,\n\
        and attached to the note when you press Enter.")]
    Compose(commands::compose::Args),

    /// List the notes for a video
    List(commands::list::Args),

    /// Remove a note by its number in the list
    Delete(commands::delete::Args),

    /// Jump the player to a note
    Seek(commands::seek::Args),

    /// Export notes as plain text or HTML with timestamp links
    #[command(long_about = "Renders the notes for a video as a title followed by one line per\n\
        note. The HTML rendering links every timestamp back to that moment\n\
        in the video. Output goes to stdout, a file, or the clipboard.")]
    Export(commands::export::Args),

    /// List videos that have notes
    Videos(commands::videos::Args),

    /// Run the local player bridge
    #[command(long_about = "Serves playback position and seek requests on a Unix socket from\n\
        a local clock. The other commands talk to the player through it.")]
    Player(commands::player::Args),

    /// View and manage configuration settings
    #[command(long_about = "Provides subcommands to show, get, and set configuration values.\n\
        Configuration is stored in ~/.vidnote/config.yaml.")]
    Config(commands::config::Args),

    /// Generate shell completion scripts
    Completions(commands::completions::Args),
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let filter = if cli.verbose {
        "vidnote=debug"
    } else {
        "vidnote=info"
    };

    // The bridge may run detached, so it can log to a file instead
    let _log_guard = match &cli.command {
        Commands::Player(args) if args.log_file => {
            Some(commands::player::init_file_logging(filter)?)
        }
        _ => {
            tracing_subscriber::registry()
                .with(
                    tracing_subscriber::EnvFilter::try_from_default_env()
                        .unwrap_or_else(|_| filter.into()),
                )
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_writer(std::io::stderr)
                        .without_time(),
                )
                .init();
            None
        }
    };

    match cli.command {
        Commands::Add(args) => commands::add::run(args),
        Commands::Compose(args) => commands::compose::run(args),
        Commands::List(args) => commands::list::run(args),
        Commands::Delete(args) => commands::delete::run(args),
        Commands::Seek(args) => commands::seek::run(args),
        Commands::Export(args) => commands::export::run(args),
        Commands::Videos(args) => commands::videos::run(args),
        Commands::Player(args) => commands::player::run(args),
        Commands::Config(args) => commands::config::run(args),
        Commands::Completions(args) => {
            commands::completions::write_completions(
                &mut Cli::command(),
                args.shell,
                &mut std::io::stdout(),
            );
            Ok(())
        }
    }
}
