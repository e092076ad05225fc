//! Storage layer for vidnote

pub mod db;
pub mod memory;
pub mod models;
pub mod store;

use anyhow::Result;

pub use db::Database;
pub use memory::MemoryBackend;
pub use models::*;
pub use store::NoteStore;

/// Key-value medium the note store persists snapshots into.
///
/// Keys are content identifiers; values are serialized note lists.
pub trait NoteBackend {
    /// Reads the value stored under `key`, if any.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores `value` under `key`. Must not return until the write is durable.
    fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Deletes `key`. Removing a missing key is not an error.
    fn remove(&self, key: &str) -> Result<()>;

    /// Lists every stored key.
    fn keys(&self) -> Result<Vec<String>>;
}
