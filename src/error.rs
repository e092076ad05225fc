//! Error types for note operations.
//!
//! Every failure the core can report is recoverable: callers get a
//! `Result` and prior state is left untouched.

/// Errors reported by the note store, capture session, and player channel.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum NoteError {
    /// No content identifier could be resolved for the current page.
    #[error("Could not determine a video ID from '{0}'")]
    InvalidContext(String),

    /// Submission with blank text. Callers ignore this silently.
    #[error("Note text is empty")]
    EmptyInput,

    /// A note timestamp that is negative or not a finite number.
    #[error("Invalid note time: {0}")]
    InvalidTime(f64),

    /// The player did not answer, even after re-establishing the channel.
    #[error("Could not read the playback position: {0}. Make sure the player is running and try again.")]
    PositionUnavailable(String),

    /// The backing store did not acknowledge a read or write.
    #[error("Storage error: {0}")]
    PersistenceFailure(String),

    /// Delete or seek against an index that is not in the list.
    #[error("No note at position {index} (list has {len} notes)")]
    IndexOutOfRange { index: usize, len: usize },

    /// The operation belongs to a video the user has navigated away from.
    #[error("The video changed before the operation completed")]
    StaleContext,
}

impl NoteError {
    /// Wraps any storage-layer error as a persistence failure.
    pub fn persistence(err: impl std::fmt::Display) -> Self {
        NoteError::PersistenceFailure(err.to_string())
    }

    /// Wraps any channel error as an unavailable position.
    pub fn position(err: impl std::fmt::Display) -> Self {
        NoteError::PositionUnavailable(err.to_string())
    }
}

/// Convenience alias for results carrying a [`NoteError`].
pub type NoteResult<T> = std::result::Result<T, NoteError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_out_of_range_message() {
        let err = NoteError::IndexOutOfRange { index: 4, len: 2 };
        assert_eq!(err.to_string(), "No note at position 4 (list has 2 notes)");
    }

    #[test]
    fn test_persistence_wraps_display() {
        let err = NoteError::persistence("disk full");
        assert_eq!(err, NoteError::PersistenceFailure("disk full".to_string()));
    }
}
