//! Editor use-case service.
//!
//! # Responsibility
//! - Drive one editing session: open, manual save, AI enhance, restore.
//! - Translate editor actions into store saves with the right labels.
//!
//! # Invariants
//! - `enhance` saves at most once, and only after a successful rewrite.
//!   An unavailable rewrite leaves the stored note untouched.
//! - `restore` never writes; the restored text is saved by a later
//!   `manual_save`.
//! - Saves are conditional on the draft's `loaded_updated_at`. A note that
//!   changed since the draft was opened is reported as a conflict and is
//!   not overwritten.
//!
//! # See also
//! - crate::repo::note_store

use crate::model::catalog::{OutputLanguage, RewriteStyle};
use crate::model::label::VersionLabel;
use crate::model::note::{Note, NoteId, VersionRecord};
use crate::repo::note_store::{NoteStore, SaveResult, StoreError};
use crate::rewrite::{RewriteOutcome, RewriteRequest, RewriteService, UnavailableReason};
use crate::storage::BlobStorage;
use log::{info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Title the editor substitutes for an empty title field.
pub const EDITOR_FALLBACK_TITLE: &str = "Untitled";

/// Service error for editor use-cases.
#[derive(Debug)]
pub enum EditorError {
    Store(StoreError),
    NoteNotFound(NoteId),
    HistoryIndexOutOfRange {
        id: NoteId,
        index: usize,
        len: usize,
    },
}

impl Display for EditorError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Store(err) => write!(f, "{err}"),
            Self::NoteNotFound(id) => write!(f, "note not found: {id}"),
            Self::HistoryIndexOutOfRange { id, index, len } => write!(
                f,
                "note `{id}` has {len} version(s); index {index} is out of range"
            ),
        }
    }
}

impl Error for EditorError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Store(err) => Some(err),
            _ => None,
        }
    }
}

impl From<StoreError> for EditorError {
    fn from(value: StoreError) -> Self {
        Self::Store(value)
    }
}

/// In-memory editor state for one note.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditorDraft {
    pub id: NoteId,
    pub title: String,
    pub text: String,
    pub last_label: Option<VersionLabel>,
    /// Newest-superseded-first.
    pub history: Vec<VersionRecord>,
    /// `updated_at` of the loaded note; `None` for unsaved notes.
    pub loaded_updated_at: Option<i64>,
}

impl EditorDraft {
    fn empty(id: &str) -> Self {
        Self {
            id: id.to_string(),
            title: String::new(),
            text: String::new(),
            last_label: None,
            history: Vec::new(),
            loaded_updated_at: None,
        }
    }
}

impl From<Note> for EditorDraft {
    fn from(note: Note) -> Self {
        Self {
            id: note.id,
            title: note.title,
            text: note.current_content,
            last_label: note.last_label,
            history: note.history,
            loaded_updated_at: Some(note.updated_at),
        }
    }
}

/// Result of an AI enhance action.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EnhanceOutcome {
    /// Rewrite succeeded and was saved.
    Saved(SaveResult),
    /// Rewrite was unavailable; nothing was saved.
    Unavailable(UnavailableReason),
    /// Draft text was empty; no rewrite was attempted.
    NothingToRewrite,
}

/// Editor facade over a note store and a rewrite backend.
pub struct EditorService<S: BlobStorage, R: RewriteService> {
    store: NoteStore<S>,
    rewriter: R,
}

impl<S: BlobStorage, R: RewriteService> EditorService<S, R> {
    pub fn new(store: NoteStore<S>, rewriter: R) -> Self {
        Self { store, rewriter }
    }

    pub fn store(&self) -> &NoteStore<S> {
        &self.store
    }

    pub fn rewriter(&self) -> &R {
        &self.rewriter
    }

    /// Loads the editor state for `id`; unknown ids give an empty draft.
    pub fn open(&self, id: &str) -> EditorDraft {
        match self.store.get_by_id(id) {
            Some(note) => note.into(),
            None => EditorDraft::empty(id),
        }
    }

    /// Saves the draft with the manual label and reloads it from the
    /// saved note.
    ///
    /// # Errors
    /// - `Store(Conflict)` when the note changed since the draft was loaded.
    pub fn manual_save(&mut self, draft: &mut EditorDraft) -> Result<SaveResult, EditorError> {
        let result = self.save_draft(draft, &draft.text, VersionLabel::Manual)?;
        *draft = result.note.clone().into();
        info!(
            "event=editor_manual_save module=service id={} outcome={}",
            draft.id,
            result.outcome.as_str()
        );
        Ok(result)
    }

    /// Rewrites the draft text and saves the result with an AI label.
    ///
    /// # Contract
    /// - Empty text returns `NothingToRewrite` without calling the backend.
    /// - `Unavailable` performs no store access at all and leaves the draft
    ///   as it was.
    /// - The save is conditional on the draft's `loaded_updated_at`, so a
    ///   write landing while the rewrite is in flight surfaces as a conflict.
    pub async fn enhance(
        &mut self,
        draft: &mut EditorDraft,
        style: RewriteStyle,
        language: OutputLanguage,
    ) -> Result<EnhanceOutcome, EditorError> {
        if draft.text.is_empty() {
            return Ok(EnhanceOutcome::NothingToRewrite);
        }

        let request = RewriteRequest::new(&draft.text, style, language);
        let polished = match self.rewriter.rewrite(&request).await {
            RewriteOutcome::Rewritten(polished) => polished,
            RewriteOutcome::Unavailable(reason) => {
                info!(
                    "event=editor_enhance module=service id={} status=unavailable reason={}",
                    draft.id, reason
                );
                return Ok(EnhanceOutcome::Unavailable(reason));
            }
        };

        let label = VersionLabel::AiGenerated { style, language };
        let result = self.save_draft(draft, &polished, label)?;
        *draft = result.note.clone().into();
        info!(
            "event=editor_enhance module=service id={} status=ok outcome={}",
            draft.id,
            result.outcome.as_str()
        );
        Ok(EnhanceOutcome::Saved(result))
    }

    /// Returns the content of `history[index]` for placing into the draft.
    pub fn restore(&self, id: &str, index: usize) -> Result<String, EditorError> {
        let note = self
            .store
            .get_by_id(id)
            .ok_or_else(|| EditorError::NoteNotFound(id.to_string()))?;
        let len = note.history.len();
        note.history
            .get(index)
            .map(|record| record.content().to_string())
            .ok_or_else(|| EditorError::HistoryIndexOutOfRange {
                id: id.to_string(),
                index,
                len,
            })
    }

    fn save_draft(
        &mut self,
        draft: &EditorDraft,
        content: &str,
        label: VersionLabel,
    ) -> Result<SaveResult, EditorError> {
        let result = self.store.save_if_unmodified(
            &draft.id,
            draft.loaded_updated_at,
            content,
            editor_title(&draft.title),
            Some(label),
        );
        if let Err(StoreError::Conflict { .. }) = &result {
            warn!(
                "event=editor_save module=service status=conflict id={} loaded_updated_at={:?}",
                draft.id, draft.loaded_updated_at
            );
        }
        Ok(result?)
    }
}

fn editor_title(title: &str) -> &str {
    if title.is_empty() {
        EDITOR_FALLBACK_TITLE
    } else {
        title
    }
}
