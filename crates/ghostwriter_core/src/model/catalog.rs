//! Rewrite style and output language catalogs.
//!
//! # Responsibility
//! - Define the closed set of rewrite styles and output languages.
//! - Map every entry to its display name and rewrite instruction text.
//!
//! # Invariants
//! - Display names are stable: they are embedded in persisted version labels.
//! - Table rows are ordered exactly like the enum variants.

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::str::FromStr;

/// Tone applied by the rewriting model.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RewriteStyle {
    #[default]
    #[serde(rename = "Professional")]
    Professional,
    #[serde(rename = "Viral Tweet")]
    ViralTweet,
    #[serde(rename = "Poetic")]
    Poetic,
    #[serde(rename = "Witty")]
    Witty,
    #[serde(rename = "ELI5")]
    Eli5,
}

/// Language the rewritten text is produced in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OutputLanguage {
    #[default]
    English,
    Hindi,
    Hinglish,
    Spanish,
    French,
    German,
}

struct CatalogEntry {
    name: &'static str,
    instruction: &'static str,
}

const STYLE_TABLE: [CatalogEntry; 5] = [
    CatalogEntry {
        name: "Professional",
        instruction: "Rewrite this text to be professional and concise.",
    },
    CatalogEntry {
        name: "Viral Tweet",
        instruction: "Rewrite this text as a punchy, viral tweet under 280 characters with a strong opening hook.",
    },
    CatalogEntry {
        name: "Poetic",
        instruction: "Rewrite this text as lyrical, poetic prose with vivid imagery.",
    },
    CatalogEntry {
        name: "Witty",
        instruction: "Rewrite this text to be witty and playful while keeping its meaning.",
    },
    CatalogEntry {
        name: "ELI5",
        instruction: "Explain this text so a five-year-old could understand it, using short sentences and simple words.",
    },
];

const LANGUAGE_TABLE: [CatalogEntry; 6] = [
    CatalogEntry {
        name: "English",
        instruction: "Write the output in English.",
    },
    CatalogEntry {
        name: "Hindi",
        instruction: "Write the output in Hindi using Devanagari script.",
    },
    CatalogEntry {
        name: "Hinglish",
        instruction: "Write the output in Hinglish: conversational Hindi written in Latin script, freely mixed with English.",
    },
    CatalogEntry {
        name: "Spanish",
        instruction: "Write the output in Spanish.",
    },
    CatalogEntry {
        name: "French",
        instruction: "Write the output in French.",
    },
    CatalogEntry {
        name: "German",
        instruction: "Write the output in German.",
    },
];

/// Unknown style or language name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCatalogEntry {
    /// Catalog that was searched (`style` or `language`).
    pub catalog: &'static str,
    /// Rejected input value.
    pub value: String,
}

impl Display for UnknownCatalogEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown {}: `{}`", self.catalog, self.value)
    }
}

impl Error for UnknownCatalogEntry {}

impl RewriteStyle {
    /// Every style in catalog order.
    pub const ALL: [RewriteStyle; 5] = [
        RewriteStyle::Professional,
        RewriteStyle::ViralTweet,
        RewriteStyle::Poetic,
        RewriteStyle::Witty,
        RewriteStyle::Eli5,
    ];

    /// Human-readable name, as shown in labels and pickers.
    pub fn display_name(self) -> &'static str {
        STYLE_TABLE[self as usize].name
    }

    /// Instruction sentence handed to the rewriting model.
    pub fn instruction(self) -> &'static str {
        STYLE_TABLE[self as usize].instruction
    }

    /// Exact display-name lookup, used when parsing persisted labels.
    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|style| style.display_name() == name)
    }
}

impl Display for RewriteStyle {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for RewriteStyle {
    type Err = UnknownCatalogEntry;

    /// Accepts display names case-insensitively, with `-`/`_` standing in for
    /// spaces (`viral-tweet`, `Viral Tweet`, `eli5`).
    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = fold_name(value);
        Self::ALL
            .into_iter()
            .find(|style| fold_name(style.display_name()) == wanted)
            .ok_or_else(|| UnknownCatalogEntry {
                catalog: "style",
                value: value.to_string(),
            })
    }
}

impl OutputLanguage {
    /// Every language in catalog order.
    pub const ALL: [OutputLanguage; 6] = [
        OutputLanguage::English,
        OutputLanguage::Hindi,
        OutputLanguage::Hinglish,
        OutputLanguage::Spanish,
        OutputLanguage::French,
        OutputLanguage::German,
    ];

    pub fn display_name(self) -> &'static str {
        LANGUAGE_TABLE[self as usize].name
    }

    pub fn instruction(self) -> &'static str {
        LANGUAGE_TABLE[self as usize].instruction
    }

    pub fn from_display_name(name: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|language| language.display_name() == name)
    }
}

impl Display for OutputLanguage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for OutputLanguage {
    type Err = UnknownCatalogEntry;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = fold_name(value);
        Self::ALL
            .into_iter()
            .find(|language| fold_name(language.display_name()) == wanted)
            .ok_or_else(|| UnknownCatalogEntry {
                catalog: "language",
                value: value.to_string(),
            })
    }
}

fn fold_name(value: &str) -> String {
    value
        .trim()
        .chars()
        .filter(|ch| !matches!(ch, ' ' | '-' | '_'))
        .flat_map(char::to_lowercase)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::{OutputLanguage, RewriteStyle};
    use std::collections::HashSet;

    #[test]
    fn tables_follow_variant_order() {
        let style_names: Vec<_> = RewriteStyle::ALL
            .iter()
            .map(|style| style.display_name())
            .collect();
        assert_eq!(
            style_names,
            ["Professional", "Viral Tweet", "Poetic", "Witty", "ELI5"]
        );

        let language_names: Vec<_> = OutputLanguage::ALL
            .iter()
            .map(|language| language.display_name())
            .collect();
        assert_eq!(
            language_names,
            ["English", "Hindi", "Hinglish", "Spanish", "French", "German"]
        );
    }

    #[test]
    fn every_entry_has_a_distinct_instruction() {
        let styles: HashSet<_> = RewriteStyle::ALL.iter().map(|s| s.instruction()).collect();
        assert_eq!(styles.len(), RewriteStyle::ALL.len());
        let languages: HashSet<_> = OutputLanguage::ALL
            .iter()
            .map(|l| l.instruction())
            .collect();
        assert_eq!(languages.len(), OutputLanguage::ALL.len());
    }

    #[test]
    fn from_str_is_lenient_about_case_and_separators() {
        assert_eq!(
            "viral-tweet".parse::<RewriteStyle>().unwrap(),
            RewriteStyle::ViralTweet
        );
        assert_eq!("eli5".parse::<RewriteStyle>().unwrap(), RewriteStyle::Eli5);
        assert_eq!(
            " HINGLISH ".parse::<OutputLanguage>().unwrap(),
            OutputLanguage::Hinglish
        );

        let err = "shakespearean".parse::<RewriteStyle>().unwrap_err();
        assert_eq!(err.catalog, "style");
        assert!(err.to_string().contains("shakespearean"));
    }

    #[test]
    fn serde_uses_display_names() {
        let encoded = serde_json::to_string(&RewriteStyle::ViralTweet).unwrap();
        assert_eq!(encoded, "\"Viral Tweet\"");
        let decoded: RewriteStyle = serde_json::from_str("\"ELI5\"").unwrap();
        assert_eq!(decoded, RewriteStyle::Eli5);
    }
}
