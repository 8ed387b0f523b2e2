//! Versioned note store.
//!
//! # Responsibility
//! - Own the persisted note collection behind one storage key.
//! - Implement the save protocol: archive superseded content into history,
//!   label versions, and replace the whole collection atomically.
//!
//! # Invariants
//! - `save` is the only mutator of persisted state and requires `&mut self`.
//! - A history record is created iff the saved content differs from the
//!   current content by exact string equality.
//! - New notes are prepended; collection order is newest-created-first.
//! - Reads are fail-soft: unreadable or corrupt data reads as "no notes".
//! - A save never overwrites a corrupt collection before copying it to a
//!   backup key.
//! - Every save is one `update_blob` cycle: read, check, write.
//! - History is never pruned. It grows by one record per content change.

use crate::model::label::VersionLabel;
use crate::model::note::{epoch_millis_now, Note, NoteId};
use crate::storage::{BlobStorage, StorageError};
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::PathBuf;
use std::time::Instant;

/// Storage key holding the serialized collection.
pub const NOTES_STORAGE_KEY: &str = "GHOSTWRITER_NOTES";

/// `<key>_CORRUPT_<epoch ms>` holds a collection that failed to decode.
pub const CORRUPT_BACKUP_INFIX: &str = "_CORRUPT_";

/// Source of "now" in epoch milliseconds.
pub type Clock = fn() -> i64;

pub type StoreResult<T> = Result<T, StoreError>;

/// Error returned by store writes.
#[derive(Debug)]
pub enum StoreError {
    Storage(StorageError),
    Encode(serde_json::Error),
    /// Optimistic write rejected because the note changed underneath.
    Conflict {
        id: NoteId,
        expected_updated_at: Option<i64>,
        actual_updated_at: Option<i64>,
    },
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Storage(err) => write!(f, "{err}"),
            Self::Encode(err) => write!(f, "failed to encode notes: {err}"),
            Self::Conflict {
                id,
                expected_updated_at,
                actual_updated_at,
            } => write!(
                f,
                "note `{id}` was modified concurrently (expected updatedAt {expected_updated_at:?}, found {actual_updated_at:?})"
            ),
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Storage(err) => Some(err),
            Self::Encode(err) => Some(err),
            Self::Conflict { .. } => None,
        }
    }
}

impl From<StorageError> for StoreError {
    fn from(value: StorageError) -> Self {
        Self::Storage(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        Self::Encode(value)
    }
}

/// What a save did to the target note.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SaveOutcome {
    /// No note had this id; one was created.
    Created,
    /// Content changed; the previous content moved into history.
    Versioned,
    /// Content was identical; only title, label and timestamp changed.
    MetadataOnly,
}

impl SaveOutcome {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Created => "created",
            Self::Versioned => "versioned",
            Self::MetadataOnly => "metadata_only",
        }
    }
}

/// Result of a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveResult {
    pub outcome: SaveOutcome,
    /// Note exactly as persisted.
    pub note: Note,
}

/// Store of versioned notes over a blob backend.
pub struct NoteStore<S: BlobStorage> {
    storage: S,
    key: String,
    clock: Clock,
}

impl<S: BlobStorage> NoteStore<S> {
    /// Creates a store using [`NOTES_STORAGE_KEY`] and the system clock.
    pub fn new(storage: S) -> Self {
        Self::with_key(storage, NOTES_STORAGE_KEY)
    }

    pub fn with_key(storage: S, key: impl Into<String>) -> Self {
        Self {
            storage,
            key: key.into(),
            clock: epoch_millis_now,
        }
    }

    /// Replaces the time source.
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn storage_mut(&mut self) -> &mut S {
        &mut self.storage
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Returns every persisted note, newest-created-first.
    ///
    /// Never fails: empty, unreadable or corrupt storage yields an empty list.
    pub fn list_all(&self) -> Vec<Note> {
        let blob = match self.storage.read_blob(&self.key) {
            Ok(blob) => blob,
            Err(err) => {
                warn!(
                    "event=notes_read module=store status=error backend={} key={} error={}",
                    self.storage.backend_name(),
                    self.key,
                    err
                );
                return Vec::new();
            }
        };
        decode_notes(blob.as_deref()).unwrap_or_else(|err| {
            warn!(
                "event=notes_decode module=store status=error key={} blob_len={} error={}",
                self.key,
                blob.as_deref().map_or(0, str::len),
                err
            );
            Vec::new()
        })
    }

    /// Returns the note with `id`, or `None` when absent.
    pub fn get_by_id(&self, id: &str) -> Option<Note> {
        self.list_all().into_iter().find(|note| note.id == id)
    }

    /// Saves `content` as the current content of note `id`.
    ///
    /// `label` defaults to [`VersionLabel::Edit`]. See the module invariants
    /// for the versioning rules.
    ///
    /// # Errors
    /// - `Storage` when the collection cannot be read or written. Nothing is
    ///   persisted in that case.
    /// - `Encode` when the collection cannot be serialized.
    pub fn save(
        &mut self,
        id: &str,
        content: &str,
        title: &str,
        label: Option<VersionLabel>,
    ) -> StoreResult<SaveResult> {
        self.save_checked(id, None, content, title, label)
    }

    /// Like [`save`](Self::save), but only writes when the stored note's
    /// `updated_at` still equals `expected_updated_at`.
    ///
    /// `None` expects the note to be absent. The check and the write happen
    /// under one exclusive storage access, so a writer in another process
    /// cannot slip in between them.
    ///
    /// # Errors
    /// - `Conflict` when the expectation does not hold; nothing is written.
    pub fn save_if_unmodified(
        &mut self,
        id: &str,
        expected_updated_at: Option<i64>,
        content: &str,
        title: &str,
        label: Option<VersionLabel>,
    ) -> StoreResult<SaveResult> {
        self.save_checked(id, Some(expected_updated_at), content, title, label)
    }

    fn save_checked(
        &mut self,
        id: &str,
        expectation: Option<Option<i64>>,
        content: &str,
        title: &str,
        label: Option<VersionLabel>,
    ) -> StoreResult<SaveResult> {
        let started_at = Instant::now();
        let label = label.unwrap_or_default();
        let clock = self.clock;
        // Corrupt text that has been copied aside and may now be replaced.
        let mut backed_up: Option<String> = None;

        loop {
            let mut step = SaveStep::Untouched;
            let key = self.key.as_str();
            let written = self
                .storage
                .update_blob(key, &mut |blob: Option<&str>| {
                    let mut notes = match decode_notes(blob) {
                        Ok(notes) => notes,
                        Err(err) => {
                            let text = blob.unwrap_or_default();
                            if backed_up.as_deref() != Some(text) {
                                warn!(
                                    "event=notes_decode module=store status=error key={} blob_len={} error={}",
                                    key,
                                    text.len(),
                                    err
                                );
                                step = SaveStep::Corrupt(text.to_string());
                                return None;
                            }
                            Vec::new()
                        }
                    };

                    if let Some(expected_updated_at) = expectation {
                        if let Err(conflict) = check_expectation(&notes, id, expected_updated_at) {
                            step = SaveStep::Rejected(conflict);
                            return None;
                        }
                    }

                    let (outcome, index) =
                        apply_save(&mut notes, id, content, title, label.clone(), clock());
                    match serde_json::to_string(&notes) {
                        Ok(encoded) => {
                            step = SaveStep::Saved(outcome, notes.swap_remove(index));
                            Some(encoded)
                        }
                        Err(err) => {
                            step = SaveStep::Rejected(StoreError::Encode(err));
                            None
                        }
                    }
                });

            if let Err(err) = written {
                warn!(
                    "event=note_save module=store status=error id={} backend={} duration_ms={} error={}",
                    id,
                    self.storage.backend_name(),
                    started_at.elapsed().as_millis(),
                    err
                );
                return Err(err.into());
            }

            match step {
                SaveStep::Saved(outcome, note) => {
                    info!(
                        "event=note_save module=store status=ok id={} outcome={} content_len={} history_len={} duration_ms={}",
                        id,
                        outcome.as_str(),
                        note.current_content.len(),
                        note.history.len(),
                        started_at.elapsed().as_millis()
                    );
                    return Ok(SaveResult { outcome, note });
                }
                SaveStep::Rejected(err) => {
                    warn!(
                        "event=note_save module=store status=rejected id={} error={}",
                        id, err
                    );
                    return Err(err);
                }
                SaveStep::Corrupt(text) => {
                    self.back_up_corrupt(&text)?;
                    backed_up = Some(text);
                }
                SaveStep::Untouched => {
                    return Err(StoreError::Storage(StorageError::Io {
                        path: PathBuf::from(&self.key),
                        source: std::io::Error::other("storage skipped the update callback"),
                    }));
                }
            }
        }
    }

    /// Copies an undecodable collection to a timestamped sibling key before
    /// anything is allowed to overwrite it.
    fn back_up_corrupt(&mut self, text: &str) -> StoreResult<()> {
        let backup_key = format!("{}{}{}", self.key, CORRUPT_BACKUP_INFIX, (self.clock)());
        self.storage.write_blob(&backup_key, text)?;
        error!(
            "event=notes_backup module=store status=ok key={} backup_key={} blob_len={}",
            self.key,
            backup_key,
            text.len()
        );
        Ok(())
    }
}

/// Progress of one read-modify-write attempt.
enum SaveStep {
    Untouched,
    Corrupt(String),
    Rejected(StoreError),
    Saved(SaveOutcome, Note),
}

/// Empty or blank blobs decode as an empty collection.
fn decode_notes(blob: Option<&str>) -> Result<Vec<Note>, serde_json::Error> {
    match blob.filter(|text| !text.trim().is_empty()) {
        Some(text) => serde_json::from_str(text),
        None => Ok(Vec::new()),
    }
}

fn check_expectation(
    notes: &[Note],
    id: &str,
    expected_updated_at: Option<i64>,
) -> StoreResult<()> {
    let actual_updated_at = notes
        .iter()
        .find(|note| note.id == id)
        .map(|note| note.updated_at);
    if actual_updated_at == expected_updated_at {
        return Ok(());
    }
    Err(StoreError::Conflict {
        id: id.to_string(),
        expected_updated_at,
        actual_updated_at,
    })
}

/// Applies one save to an in-memory collection.
///
/// Returns the outcome and the index of the affected note.
fn apply_save(
    notes: &mut Vec<Note>,
    id: &str,
    content: &str,
    title: &str,
    label: VersionLabel,
    now: i64,
) -> (SaveOutcome, usize) {
    let Some(index) = notes.iter().position(|note| note.id == id) else {
        notes.insert(0, Note::new(id, title, content, label, now));
        return (SaveOutcome::Created, 0);
    };

    let note = &mut notes[index];
    // `updated_at` doubles as the version stamp for conditional saves, so
    // every save advances it, even when the wall clock repeats a
    // millisecond or steps backwards.
    let now = now.max(note.updated_at + 1);
    if note.current_content == content {
        note.touch_metadata(title, label, now);
        (SaveOutcome::MetadataOnly, index)
    } else {
        note.supersede(content.to_string(), title, label, now);
        (SaveOutcome::Versioned, index)
    }
}
