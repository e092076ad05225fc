//! Config command - manage configuration

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;

use vidnote_cli::config::Config;

#[derive(clap::Args)]
#[command(after_help = "EXAMPLES:\n    \
    vidnote config                                  Show all settings\n    \
    vidnote config get watch_url\n    \
    vidnote config set position_timeout_ms 5000")]
pub struct Args {
    #[command(subcommand)]
    pub command: Option<ConfigCommand>,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show,
    /// Get a configuration value
    Get { key: String },
    /// Set a configuration value
    Set { key: String, value: String },
}

pub fn run(args: Args) -> Result<()> {
    match args.command {
        Some(ConfigCommand::Show) | None => show_config(),
        Some(ConfigCommand::Get { key }) => get_config(&key),
        Some(ConfigCommand::Set { key, value }) => set_config(&key, &value),
    }
}

fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("{}", "vidnote Configuration".bold());
    println!();
    println!("  {}  {}", "Config file:".dimmed(), Config::config_path()?.display());
    println!("  {}     {}", "Database:".dimmed(), config.database_path()?.display());
    println!("  {}  {}", "Player sock:".dimmed(), config.socket_path()?.display());
    println!("  {}    {}", "Watch URL:".dimmed(), config.watch_url);
    println!(
        "  {}      {} ms",
        "Timeout:".dimmed(),
        config.position_timeout_ms
    );

    Ok(())
}

fn get_config(key: &str) -> Result<()> {
    let config = Config::load()?;
    match config.get(key)? {
        Some(value) => println!("{value}"),
        None => println!("{}", format!("'{key}' is not set (using default)").dimmed()),
    }
    Ok(())
}

fn set_config(key: &str, value: &str) -> Result<()> {
    let mut config = Config::load()?;
    config.set(key, value)?;
    config.save()?;
    println!("{} {} = {}", "Set".green(), key, value);
    Ok(())
}
