//! Configuration management
//!
//! Settings live in `~/.vidnote/config.yaml`. Set `VIDNOTE_HOME` to use a
//! different directory.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable overriding the data directory.
pub const HOME_ENV: &str = "VIDNOTE_HOME";

/// Link base used for exported timestamps.
pub const DEFAULT_WATCH_URL: &str = "https://www.youtube.com/watch";

/// Default bounded wait for a playback position, in milliseconds.
pub const DEFAULT_POSITION_TIMEOUT_MS: u64 = 2000;

/// Keys accepted by `vidnote config get/set`.
pub const CONFIG_KEYS: &[&str] = &[
    "watch_url",
    "socket_path",
    "database_path",
    "position_timeout_ms",
];

/// Returns the vidnote data directory.
pub fn vidnote_dir() -> Result<PathBuf> {
    if let Some(dir) = std::env::var_os(HOME_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let dir = dirs::home_dir()
        .ok_or_else(|| anyhow::anyhow!("Could not find home directory"))?
        .join(".vidnote");
    Ok(dir)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Watch page used to build timestamp links in exports
    pub watch_url: String,

    /// Player bridge socket. Defaults to `<data dir>/player.sock`.
    pub socket_path: Option<PathBuf>,

    /// Note database. Defaults to `<data dir>/vidnote.db`.
    pub database_path: Option<PathBuf>,

    /// How long to wait for the player before giving up
    pub position_timeout_ms: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watch_url: DEFAULT_WATCH_URL.to_string(),
            socket_path: None,
            database_path: None,
            position_timeout_ms: DEFAULT_POSITION_TIMEOUT_MS,
        }
    }
}

impl Config {
    /// Loads the config file, or defaults when it does not exist.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if raw.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_saphyr::from_str(&raw).with_context(|| format!("Invalid config in {}", path.display()))
    }

    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let raw = serde_saphyr::to_string(self).context("Failed to serialize config")?;
        std::fs::write(path, raw).with_context(|| format!("Failed to write {}", path.display()))
    }

    pub fn config_path() -> Result<PathBuf> {
        Ok(vidnote_dir()?.join("config.yaml"))
    }

    /// Resolved player bridge socket path.
    pub fn socket_path(&self) -> Result<PathBuf> {
        match &self.socket_path {
            Some(path) => Ok(path.clone()),
            None => Ok(vidnote_dir()?.join("player.sock")),
        }
    }

    /// Resolved database path.
    pub fn database_path(&self) -> Result<PathBuf> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => crate::storage::db::default_db_path(),
        }
    }

    /// The watch page, parsed. Only URLs on this page identify a video.
    pub fn watch_page(&self) -> Result<url::Url> {
        url::Url::parse(&self.watch_url)
            .with_context(|| format!("Invalid watch_url '{}' in config", self.watch_url))
    }

    pub fn position_timeout(&self) -> Duration {
        Duration::from_millis(self.position_timeout_ms)
    }

    /// Reads a single setting by name.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let value = match key {
            "watch_url" => Some(self.watch_url.clone()),
            "socket_path" => self.socket_path.as_ref().map(|p| p.display().to_string()),
            "database_path" => self.database_path.as_ref().map(|p| p.display().to_string()),
            "position_timeout_ms" => Some(self.position_timeout_ms.to_string()),
            _ => bail!(
                "Unknown config key '{}'. Valid keys: {}",
                key,
                CONFIG_KEYS.join(", ")
            ),
        };
        Ok(value)
    }

    /// Updates a single setting by name.
    pub fn set(&mut self, key: &str, value: &str) -> Result<()> {
        match key {
            "watch_url" => {
                url::Url::parse(value).with_context(|| format!("Invalid URL '{value}'"))?;
                self.watch_url = value.to_string();
            }
            "socket_path" => self.socket_path = Some(PathBuf::from(value)),
            "database_path" => self.database_path = Some(PathBuf::from(value)),
            "position_timeout_ms" => {
                self.position_timeout_ms = value
                    .parse()
                    .with_context(|| format!("'{value}' is not a number of milliseconds"))?;
            }
            _ => bail!(
                "Unknown config key '{}'. Valid keys: {}",
                key,
                CONFIG_KEYS.join(", ")
            ),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempdir().unwrap();
        let config = Config::load_from(&dir.path().join("config.yaml")).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.position_timeout(), Duration::from_millis(2000));
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");

        let mut config = Config::default();
        config.set("position_timeout_ms", "500").unwrap();
        config.set("socket_path", "/tmp/player.sock").unwrap();
        config.save_to(&path).expect("Failed to save config");

        let loaded = Config::load_from(&path).expect("Failed to load config");
        assert_eq!(loaded.position_timeout_ms, 500);
        assert_eq!(loaded.socket_path, Some(PathBuf::from("/tmp/player.sock")));
        assert_eq!(loaded.watch_url, DEFAULT_WATCH_URL);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        std::fs::write(&path, "position_timeout_ms: 750\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.position_timeout_ms, 750);
        assert_eq!(config.watch_url, DEFAULT_WATCH_URL);
    }

    #[test]
    fn test_unknown_key_rejected() {
        let mut config = Config::default();
        assert!(config.get("colour").is_err());
        assert!(config.set("colour", "blue").is_err());
    }

    #[test]
    fn test_invalid_values_rejected() {
        let mut config = Config::default();
        assert!(config.set("position_timeout_ms", "soon").is_err());
        assert!(config.set("watch_url", "not a url").is_err());
        assert_eq!(config, Config::default());
    }
}
