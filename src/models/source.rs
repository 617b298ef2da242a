//! Source model: a seed URL plus crawl depth and suggestion behavior.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Crawl depth, mapped to a page cap.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Depth {
    Shallow,
    Medium,
    Deep,
    Singular,
    Dynamic,
}

impl Depth {
    /// Default page cap for this depth.
    pub fn page_cap(&self) -> usize {
        match self {
            Self::Shallow => 5,
            Self::Medium => 15,
            Self::Deep => 35,
            Self::Singular => 1,
            Self::Dynamic => 1,
        }
    }

    /// A source is dynamic iff its depth is `dynamic`.
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Shallow => "shallow",
            Self::Medium => "medium",
            Self::Deep => "deep",
            Self::Singular => "singular",
            Self::Dynamic => "dynamic",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "shallow" => Some(Self::Shallow),
            "medium" => Some(Self::Medium),
            "deep" => Some(Self::Deep),
            "singular" => Some(Self::Singular),
            "dynamic" => Some(Self::Dynamic),
            _ => None,
        }
    }
}

/// Whether discovered-link snippets come from in-page context (`surface`)
/// or the target page's lead paragraph (`dive`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuggestionMode {
    Surface,
    Dive,
}

impl SuggestionMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Surface => "surface",
            Self::Dive => "dive",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "surface" => Some(Self::Surface),
            "dive" => Some(Self::Dive),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: Uuid,
    pub owner: Uuid,
    pub conversation: Uuid,
    pub initial_url: String,
    pub depth: Depth,
    pub same_domain_only: bool,
    pub suggestion_mode: SuggestionMode,
    pub label: Option<String>,
}

impl Source {
    /// Page cap for this source's depth, raised to the seed count when the
    /// explicit seed set is larger.
    pub fn page_cap(&self, seed_count: usize) -> usize {
        self.depth.page_cap().max(seed_count)
    }
}
