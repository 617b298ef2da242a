//! Page model.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PageStatus {
    Pending,
    Crawling,
    Indexed,
    Error,
}

impl PageStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Crawling => "crawling",
            Self::Indexed => "indexed",
            Self::Error => "error",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(Self::Pending),
            "crawling" => Some(Self::Crawling),
            "indexed" => Some(Self::Indexed),
            "error" => Some(Self::Error),
            _ => None,
        }
    }
}

/// Pages store at most this many characters of cleaned text.
pub const MAX_CONTENT_CHARS: usize = 50_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page {
    pub id: Uuid,
    pub source: Uuid,
    pub url: String,
    pub title: String,
    pub path: String,
    pub content: String,
    pub status: PageStatus,
    pub owner: Uuid,
}
