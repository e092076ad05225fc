//! SQLite storage layer for vidnote

use anyhow::{Context, Result};
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use std::path::{Path, PathBuf};

use super::NoteBackend;
use crate::config::vidnote_dir;

/// Get the default database path
pub fn default_db_path() -> Result<PathBuf> {
    let dir = vidnote_dir()?;
    std::fs::create_dir_all(&dir)?;
    Ok(dir.join("vidnote.db"))
}

/// Latest schema version `migrate` brings a database to.
const SCHEMA_VERSION: i64 = 1;

/// Database connection wrapper
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open or create the database
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Run migrations
    fn migrate(&self) -> Result<()> {
        self.conn.execute_batch(
            "CREATE TABLE IF NOT EXISTS schema_version (version INTEGER PRIMARY KEY);",
        )?;

        let current = self.schema_version()?;
        if current < 1 {
            self.conn.execute_batch(
                r#"
                CREATE TABLE IF NOT EXISTS note_lists (
                    content_id TEXT PRIMARY KEY,
                    notes TEXT NOT NULL,
                    updated_at TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_note_lists_updated_at ON note_lists(updated_at);
                "#,
            )?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![SCHEMA_VERSION],
            )?;
            tracing::debug!("Migrated database to schema version {}", SCHEMA_VERSION);
        }
        Ok(())
    }

    /// Highest migration applied, or 0 for a new database
    fn schema_version(&self) -> Result<i64> {
        let version = self.conn.query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )?;
        Ok(version)
    }

    /// Number of videos with stored notes
    #[cfg(test)]
    fn list_count(&self) -> Result<i32> {
        let count = self
            .conn
            .query_row("SELECT COUNT(*) FROM note_lists", [], |row| row.get(0))?;
        Ok(count)
    }

    /// When the list under `key` was last written
    #[cfg(test)]
    fn updated_at(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT updated_at FROM note_lists WHERE content_id = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to read update time")
    }
}

impl NoteBackend for Database {
    fn get(&self, key: &str) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT notes FROM note_lists WHERE content_id = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()
            .context("Failed to read note list")
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn
            .execute(
                r#"
                INSERT INTO note_lists (content_id, notes, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(content_id) DO UPDATE SET
                    notes = ?2,
                    updated_at = ?3
                "#,
                params![key, value, Utc::now().to_rfc3339()],
            )
            .context("Failed to write note list")?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM note_lists WHERE content_id = ?1", params![key])
            .context("Failed to delete note list")?;
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT content_id FROM note_lists ORDER BY updated_at DESC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        rows.collect::<Result<Vec<String>, _>>()
            .context("Failed to list note lists")
    }
}
