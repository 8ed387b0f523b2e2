//! Note and version record domain model.
//!
//! # Responsibility
//! - Define the persisted note shape (current content + history).
//! - Provide the two state transitions used by the save protocol.
//!
//! # Invariants
//! - `history` is ordered newest-superseded-first by insertion, never by
//!   timestamp.
//! - `history[0].content` never equals `current_content`.
//! - A `VersionRecord` cannot be modified after construction.
//!
//! # See also
//! - crate::repo::note_store

use crate::model::label::VersionLabel;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Caller-supplied note identity, stable for the note lifetime.
pub type NoteId = String;

/// Title given to notes created without one.
pub const UNTITLED_NOTE_TITLE: &str = "Untitled Note";

/// Immutable snapshot of superseded note content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionRecord {
    timestamp: i64,
    content: String,
    label: VersionLabel,
}

impl VersionRecord {
    /// Epoch milliseconds at which this content became current.
    pub fn timestamp(&self) -> i64 {
        self.timestamp
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// How this content was produced.
    pub fn label(&self) -> &VersionLabel {
        &self.label
    }
}

/// Addressable note with its content history.
///
/// Field names serialize in camelCase to keep the stored blob layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: NoteId,
    pub title: String,
    pub current_content: String,
    /// Absent only on notes written before labels were tracked.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_label: Option<VersionLabel>,
    #[serde(default)]
    pub history: Vec<VersionRecord>,
    /// Epoch milliseconds of the last content or metadata change.
    pub updated_at: i64,
}

impl Note {
    /// Creates a note with empty history.
    ///
    /// An empty `title` becomes [`UNTITLED_NOTE_TITLE`].
    pub fn new(
        id: impl Into<NoteId>,
        title: &str,
        content: impl Into<String>,
        label: VersionLabel,
        now: i64,
    ) -> Self {
        let title = if title.is_empty() {
            UNTITLED_NOTE_TITLE.to_string()
        } else {
            title.to_string()
        };

        Self {
            id: id.into(),
            title,
            current_content: content.into(),
            last_label: Some(label),
            history: Vec::new(),
            updated_at: now,
        }
    }

    /// Archives the current content and installs `content` as current.
    ///
    /// The archived record keeps the old `updated_at` and the old label,
    /// or [`VersionLabel::PreviousVersion`] when none (or a blank one) was
    /// recorded.
    pub(crate) fn supersede(
        &mut self,
        content: String,
        title: &str,
        label: VersionLabel,
        now: i64,
    ) {
        let previous_content = std::mem::replace(&mut self.current_content, content);
        let previous_label = self
            .last_label
            .replace(label)
            .filter(|previous| !previous.is_blank())
            .unwrap_or(VersionLabel::PreviousVersion);

        self.history.insert(
            0,
            VersionRecord {
                timestamp: self.updated_at,
                content: previous_content,
                label: previous_label,
            },
        );
        self.title = title.to_string();
        self.updated_at = now;
    }

    /// Updates title and label only. History is untouched.
    pub(crate) fn touch_metadata(&mut self, title: &str, label: VersionLabel, now: i64) {
        self.title = title.to_string();
        self.last_label = Some(label);
        self.updated_at = now;
    }

    /// Most recently superseded version, if any.
    pub fn latest_version(&self) -> Option<&VersionRecord> {
        self.history.first()
    }
}

/// Current wall-clock time in epoch milliseconds.
pub fn epoch_millis_now() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| i64::try_from(elapsed.as_millis()).unwrap_or(i64::MAX))
        .unwrap_or(0)
}

/// Generates a new note id from the creation time.
pub fn new_note_id() -> NoteId {
    epoch_millis_now().to_string()
}
