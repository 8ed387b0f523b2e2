//! AI rewrite collaborator contract.
//!
//! # Responsibility
//! - Define the rewrite request/outcome types and the `RewriteService` seam.
//! - Enforce the latency bound by racing the call against a deadline.
//!
//! # Invariants
//! - A rewrite never returns an error: every failure collapses into
//!   `RewriteOutcome::Unavailable`.
//! - On deadline the in-flight call is dropped, which cancels it.

use crate::model::catalog::{OutputLanguage, RewriteStyle};
use async_trait::async_trait;
use log::warn;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::time::Duration;

mod gemini;
mod prompt;

pub use gemini::{GeminiConfig, GeminiRewriter, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL};
pub use prompt::build_prompt;

/// Upper bound on one rewrite call.
pub const DEFAULT_REWRITE_TIMEOUT: Duration = Duration::from_secs(10);

/// Input of one rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RewriteRequest {
    pub text: String,
    pub style: RewriteStyle,
    pub language: OutputLanguage,
}

impl RewriteRequest {
    pub fn new(text: impl Into<String>, style: RewriteStyle, language: OutputLanguage) -> Self {
        Self {
            text: text.into(),
            style,
            language,
        }
    }
}

/// Why a rewrite produced no text. Every reason means "do not save".
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UnavailableReason {
    /// No usable API key configured.
    MissingCredentials,
    /// The deadline elapsed first.
    Timeout,
    /// Connection, TLS or decoding failure.
    Transport(String),
    /// Remote answered with a non-success status.
    Remote { status: u16 },
    /// Remote answered without any text.
    EmptyResponse,
}

impl Display for UnavailableReason {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingCredentials => f.write_str("missing credentials"),
            Self::Timeout => f.write_str("timed out"),
            Self::Transport(message) => write!(f, "transport error: {message}"),
            Self::Remote { status } => write!(f, "remote returned status {status}"),
            Self::EmptyResponse => f.write_str("empty response"),
        }
    }
}

/// Result of one rewrite attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteOutcome {
    Rewritten(String),
    Unavailable(UnavailableReason),
}

impl RewriteOutcome {
    pub fn is_available(&self) -> bool {
        matches!(self, Self::Rewritten(_))
    }
}

/// External text rewriting operation.
#[async_trait]
pub trait RewriteService: Send + Sync {
    /// Rewrites `request.text`; implementations must respect their own
    /// deadline and never hang past it.
    async fn rewrite(&self, request: &RewriteRequest) -> RewriteOutcome;
}

/// Runs `operation` until it completes or `deadline` elapses, whichever is
/// first. The losing operation future is dropped.
pub async fn with_deadline<F>(deadline: Duration, operation: F) -> RewriteOutcome
where
    F: Future<Output = RewriteOutcome>,
{
    match tokio::time::timeout(deadline, operation).await {
        Ok(outcome) => outcome,
        Err(_) => {
            warn!(
                "event=rewrite module=rewrite status=timeout deadline_ms={}",
                deadline.as_millis()
            );
            RewriteOutcome::Unavailable(UnavailableReason::Timeout)
        }
    }
}
