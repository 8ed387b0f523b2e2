//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate store and rewrite calls into editor-level actions.
//! - Keep CLI/UI layers decoupled from storage and transport details.

pub mod editor_service;
