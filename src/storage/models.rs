//! Core data models for vidnote.
//!
//! A [`Note`] is one timestamped remark about a video. A [`NoteList`] is
//! every note for one content identifier, kept sorted by video time.

use std::cmp::Ordering;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{NoteError, NoteResult};

/// A single note attached to a position in a video.
///
/// Serialized as `{"text", "time", "createdAt"}` with `createdAt` in
/// milliseconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// The note body
    pub text: String,

    /// Position in the video, in seconds
    pub time: f64,

    /// When the note was written. Provenance only, never used for ordering.
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub created_at: DateTime<Utc>,
}

impl Note {
    /// Creates a note stamped with the current wall-clock time.
    ///
    /// The timestamp is truncated to milliseconds so it survives a
    /// round trip through storage unchanged.
    pub fn new(text: impl Into<String>, time: f64) -> Self {
        let now = Utc::now();
        let created_at = DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now);
        Self {
            text: text.into(),
            // -0.0 becomes 0.0 so it ties with 0.0
            time: time + 0.0,
            created_at,
        }
    }

    /// Checks the note can be stored.
    pub fn validate(&self) -> NoteResult<()> {
        if self.text.trim().is_empty() {
            return Err(NoteError::EmptyInput);
        }
        if !self.time.is_finite() || self.time < 0.0 {
            return Err(NoteError::InvalidTime(self.time));
        }
        Ok(())
    }
}

/// Notes for one video, sorted ascending by `time`.
///
/// Equal times keep insertion order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NoteList {
    notes: Vec<Note>,
}

impl NoteList {
    /// Builds a list from notes in any order.
    pub fn from_notes(notes: Vec<Note>) -> Self {
        let mut list = Self { notes };
        list.sort();
        list
    }

    /// Adds a note and restores time order.
    pub fn push(&mut self, note: Note) {
        self.notes.push(note);
        self.sort();
    }

    /// Removes the note at `index`.
    pub fn remove(&mut self, index: usize) -> NoteResult<Note> {
        if index >= self.notes.len() {
            return Err(NoteError::IndexOutOfRange {
                index,
                len: self.notes.len(),
            });
        }
        Ok(self.notes.remove(index))
    }

    pub fn get(&self, index: usize) -> Option<&Note> {
        self.notes.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Note> {
        self.notes.iter()
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn as_slice(&self) -> &[Note] {
        &self.notes
    }

    pub fn into_vec(self) -> Vec<Note> {
        self.notes
    }

    // `sort_by` is stable, so ties stay in insertion order. Stored times
    // are finite, and `partial_cmp` treats -0.0 and 0.0 as equal.
    fn sort(&mut self) {
        self.notes
            .sort_by(|a, b| a.time.partial_cmp(&b.time).unwrap_or(Ordering::Equal));
    }
}

impl<'a> IntoIterator for &'a NoteList {
    type Item = &'a Note;
    type IntoIter = std::slice::Iter<'a, Note>;

    fn into_iter(self) -> Self::IntoIter {
        self.notes.iter()
    }
}
