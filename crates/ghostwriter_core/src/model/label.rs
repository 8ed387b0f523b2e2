//! Version provenance labels.
//!
//! # Responsibility
//! - Model how a piece of content was produced as a tagged variant.
//! - Render and parse the persisted label text.
//!
//! # Invariants
//! - `VersionLabel::parse(label.to_string())` yields the same variant for
//!   every non-`Custom` label.
//! - Unknown label text is never dropped; it survives as `Custom`.

use crate::model::catalog::{OutputLanguage, RewriteStyle};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

pub const MANUAL_SAVE_LABEL: &str = "Manual Save";
pub const EDIT_LABEL: &str = "Edit";
pub const PREVIOUS_VERSION_LABEL: &str = "Previous Version";
pub const AI_LABEL_MARKER: char = '✨';

static AI_LABEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^✨ (.+) \((.+)\)$").expect("valid ai label regex"));

/// Provenance of a content state.
///
/// Persisted as its display string, so stored blobs stay readable by older
/// clients that only know free-text labels.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum VersionLabel {
    /// Explicit save from the editor.
    Manual,
    /// Output of a successful AI rewrite.
    AiGenerated {
        style: RewriteStyle,
        language: OutputLanguage,
    },
    /// Save without an explicit provenance.
    #[default]
    Edit,
    /// Fallback for superseded content whose producer is unknown.
    PreviousVersion,
    /// Any other text found in storage.
    Custom(String),
}

impl VersionLabel {
    /// Parses persisted label text. Never fails.
    pub fn parse(text: &str) -> Self {
        match text {
            MANUAL_SAVE_LABEL => return Self::Manual,
            EDIT_LABEL => return Self::Edit,
            PREVIOUS_VERSION_LABEL => return Self::PreviousVersion,
            _ => {}
        }

        AI_LABEL_RE
            .captures(text)
            .and_then(|caps| {
                let style = RewriteStyle::from_display_name(caps.get(1)?.as_str())?;
                let language = OutputLanguage::from_display_name(caps.get(2)?.as_str())?;
                Some(Self::AiGenerated { style, language })
            })
            .unwrap_or_else(|| Self::Custom(text.to_string()))
    }

    /// Whether the label carries no text at all, as written by editors that
    /// store `""` for "no label yet".
    pub fn is_blank(&self) -> bool {
        matches!(self, Self::Custom(text) if text.is_empty())
    }

    /// Whether the content was produced by the rewriting model.
    ///
    /// Custom labels carrying the sparkle marker (older style-only labels
    /// such as `✨ Viral Tweet`) count as AI-generated too.
    pub fn is_ai_generated(&self) -> bool {
        match self {
            Self::AiGenerated { .. } => true,
            Self::Custom(text) => text.contains(AI_LABEL_MARKER),
            Self::Manual | Self::Edit | Self::PreviousVersion => false,
        }
    }
}

impl Display for VersionLabel {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Manual => f.write_str(MANUAL_SAVE_LABEL),
            Self::AiGenerated { style, language } => {
                write!(f, "{AI_LABEL_MARKER} {style} ({language})")
            }
            Self::Edit => f.write_str(EDIT_LABEL),
            Self::PreviousVersion => f.write_str(PREVIOUS_VERSION_LABEL),
            Self::Custom(text) => f.write_str(text),
        }
    }
}

impl From<String> for VersionLabel {
    fn from(value: String) -> Self {
        Self::parse(&value)
    }
}

impl From<&str> for VersionLabel {
    fn from(value: &str) -> Self {
        Self::parse(value)
    }
}

impl From<VersionLabel> for String {
    fn from(value: VersionLabel) -> Self {
        match value {
            VersionLabel::Custom(text) => text,
            other => other.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::VersionLabel;
    use crate::model::catalog::{OutputLanguage, RewriteStyle};

    #[test]
    fn renders_the_editor_label_formats() {
        assert_eq!(VersionLabel::Manual.to_string(), "Manual Save");
        assert_eq!(
            VersionLabel::AiGenerated {
                style: RewriteStyle::Witty,
                language: OutputLanguage::English,
            }
            .to_string(),
            "✨ Witty (English)"
        );
        assert_eq!(VersionLabel::default().to_string(), "Edit");
    }

    #[test]
    fn every_structured_label_parses_back() {
        let mut labels = vec![
            VersionLabel::Manual,
            VersionLabel::Edit,
            VersionLabel::PreviousVersion,
        ];
        for style in RewriteStyle::ALL {
            for language in OutputLanguage::ALL {
                labels.push(VersionLabel::AiGenerated { style, language });
            }
        }

        for label in labels {
            assert_eq!(VersionLabel::parse(&label.to_string()), label);
        }
    }

    #[test]
    fn unknown_text_is_kept_verbatim() {
        let legacy = VersionLabel::parse("✨ Viral Tweet");
        assert_eq!(legacy, VersionLabel::Custom("✨ Viral Tweet".to_string()));
        assert!(legacy.is_ai_generated());

        let unknown_style = VersionLabel::parse("✨ Gothic (English)");
        assert!(matches!(unknown_style, VersionLabel::Custom(_)));
        assert_eq!(unknown_style.to_string(), "✨ Gothic (English)");

        assert!(!VersionLabel::parse("Original").is_ai_generated());
    }

    #[test]
    fn only_empty_text_is_blank() {
        assert!(VersionLabel::parse("").is_blank());
        assert!(!VersionLabel::parse(" ").is_blank());
        assert!(!VersionLabel::Edit.is_blank());
    }

    #[test]
    fn serializes_as_plain_string() {
        let label = VersionLabel::AiGenerated {
            style: RewriteStyle::ViralTweet,
            language: OutputLanguage::Hinglish,
        };
        let encoded = serde_json::to_string(&label).unwrap();
        assert_eq!(encoded, "\"✨ Viral Tweet (Hinglish)\"");

        let decoded: VersionLabel = serde_json::from_str(&encoded).unwrap();
        assert_eq!(decoded, label);
    }
}
