//! Domain model for versioned notes.
//!
//! # Responsibility
//! - Define the persisted note/version shapes used by the store.
//! - Define provenance labels and the rewrite style/language catalogs.
//!
//! # Invariants
//! - Every note is identified by a stable, unique `NoteId`.
//! - Version records are append-only snapshots; nothing edits them in place.

pub mod catalog;
pub mod label;
pub mod note;
