//! Core domain logic for Ghostwriter.
//! This crate is the single source of truth for note versioning invariants.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod rewrite;
pub mod service;
pub mod storage;

pub use config::{ConfigError, CoreConfig, StorageBackend};
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::catalog::{OutputLanguage, RewriteStyle, UnknownCatalogEntry};
pub use model::label::VersionLabel;
pub use model::note::{new_note_id, Note, NoteId, VersionRecord, UNTITLED_NOTE_TITLE};
pub use repo::note_store::{
    NoteStore, SaveOutcome, SaveResult, StoreError, StoreResult, CORRUPT_BACKUP_INFIX,
    NOTES_STORAGE_KEY,
};
pub use rewrite::{
    GeminiConfig, GeminiRewriter, RewriteOutcome, RewriteRequest, RewriteService,
    UnavailableReason,
};
pub use service::editor_service::{EditorDraft, EditorError, EditorService, EnhanceOutcome};
pub use storage::{
    BlobStorage, BlobUpdate, FileBlobStorage, SqliteBlobStorage, StorageError, StorageResult,
};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
