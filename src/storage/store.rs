//! The note store.
//!
//! [`NoteStore`] owns every persisted note list. Each mutation reads the
//! current snapshot, edits it, and writes the whole snapshot back before
//! reporting success. A lock around the backend keeps read-modify-write
//! cycles from interleaving.

use std::sync::{Mutex, MutexGuard};

use super::models::{Note, NoteList};
use super::NoteBackend;
use crate::context::ContentId;
use crate::error::{NoteError, NoteResult};

/// Persisted note lists keyed by content identifier.
pub struct NoteStore<B> {
    backend: Mutex<B>,
}

impl<B: NoteBackend> NoteStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend: Mutex::new(backend),
        }
    }

    /// Loads the notes for `id`. A missing entry is an empty list.
    pub fn load(&self, id: &ContentId) -> NoteResult<NoteList> {
        let backend = self.lock()?;
        Self::read(&backend, id)
    }

    /// Adds `note` to the list for `id` and returns the updated list.
    ///
    /// Blank text is rejected with `EmptyInput` before storage is touched.
    pub fn append(&self, id: &ContentId, note: Note) -> NoteResult<NoteList> {
        note.validate()?;

        let backend = self.lock()?;
        let mut notes = Self::read(&backend, id)?;
        notes.push(note);
        Self::write(&backend, id, &notes)?;

        tracing::debug!(%id, count = notes.len(), "Appended note");
        Ok(notes)
    }

    /// Removes the note at `index` and returns the updated list.
    pub fn delete(&self, id: &ContentId, index: usize) -> NoteResult<NoteList> {
        let backend = self.lock()?;
        let mut notes = Self::read(&backend, id)?;
        let removed = notes.remove(index)?;
        Self::write(&backend, id, &notes)?;

        tracing::debug!(%id, index, time = removed.time, "Deleted note");
        Ok(notes)
    }

    /// Overwrites the list for `id` with `notes`, sorted by time.
    pub fn replace(&self, id: &ContentId, notes: Vec<Note>) -> NoteResult<NoteList> {
        for note in &notes {
            note.validate()?;
        }
        let notes = NoteList::from_notes(notes);

        let backend = self.lock()?;
        Self::write(&backend, id, &notes)?;
        Ok(notes)
    }

    /// Every identifier with stored notes, paired with its note count.
    pub fn list_ids(&self) -> NoteResult<Vec<(ContentId, usize)>> {
        let backend = self.lock()?;
        let keys = backend.keys().map_err(NoteError::persistence)?;

        let mut ids = Vec::with_capacity(keys.len());
        for key in keys {
            let id = ContentId::from_key(key);
            let count = Self::read(&backend, &id)?.len();
            if count > 0 {
                ids.push((id, count));
            }
        }
        Ok(ids)
    }

    fn lock(&self) -> NoteResult<MutexGuard<'_, B>> {
        self.backend
            .lock()
            .map_err(|_| NoteError::PersistenceFailure("note store lock poisoned".to_string()))
    }

    fn read(backend: &B, id: &ContentId) -> NoteResult<NoteList> {
        match backend.get(id.as_str()).map_err(NoteError::persistence)? {
            Some(raw) => {
                let notes: Vec<Note> = serde_json::from_str(&raw).map_err(|e| {
                    NoteError::PersistenceFailure(format!("corrupt note list for {id}: {e}"))
                })?;
                Ok(NoteList::from_notes(notes))
            }
            None => Ok(NoteList::default()),
        }
    }

    fn write(backend: &B, id: &ContentId, notes: &NoteList) -> NoteResult<()> {
        if notes.is_empty() {
            return backend.remove(id.as_str()).map_err(NoteError::persistence);
        }
        let raw = serde_json::to_string(notes).map_err(NoteError::persistence)?;
        backend
            .set(id.as_str(), &raw)
            .map_err(NoteError::persistence)
    }
}
