//! Note persistence layer.
//!
//! # Responsibility
//! - Expose list/get/save over the persisted note collection.
//! - Keep storage encoding details out of the service layer.
//!
//! # Invariants
//! - Callers never touch the backing blob directly; all access goes through
//!   `NoteStore`.

pub mod note_store;
