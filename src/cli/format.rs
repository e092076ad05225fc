//! Output format shared by the listing commands.

use anyhow::{Context, Result};
use serde::Serialize;

/// How `list` and `videos` print their results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Aligned, colored lines for reading in a terminal.
    #[default]
    Text,
    /// The stored JSON shape, for scripts.
    Json,
}

/// Renders `value` as pretty-printed JSON.
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    serde_json::to_string_pretty(value).context("Failed to render JSON output")
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::ValueEnum;
    use vidnote_cli::storage::{Note, NoteList};

    #[test]
    fn test_text_is_default() {
        assert_eq!(OutputFormat::default(), OutputFormat::Text);
        assert!(OutputFormat::from_str("json", true).is_ok());
    }

    #[test]
    fn test_note_list_json_matches_stored_shape() {
        let notes = NoteList::from_notes(vec![Note::new("intro", 10.0)]);
        let json: serde_json::Value = serde_json::from_str(&to_json(&notes).unwrap()).unwrap();

        assert_eq!(json[0]["text"], "intro");
        assert_eq!(json[0]["time"], 10.0);
        assert!(json[0]["createdAt"].is_i64());
    }
}
