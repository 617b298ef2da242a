//! CrawlJob model and its status state machine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Queued,
    Running,
    Indexing,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Queued => "queued",
            Self::Running => "running",
            Self::Indexing => "indexing",
            Self::Completed => "completed",
            Self::Failed => "failed",
            Self::Cancelled => "cancelled",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "queued" => Some(Self::Queued),
            "running" => Some(Self::Running),
            "indexing" => Some(Self::Indexing),
            "completed" => Some(Self::Completed),
            "failed" => Some(Self::Failed),
            "cancelled" => Some(Self::Cancelled),
            _ => None,
        }
    }

}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlJob {
    pub id: Uuid,
    pub source: Uuid,
    pub status: JobStatus,
    /// `None` => main crawl from `source.initial_url`.
    /// `Some([u])` => add-page job for URL `u`.
    /// `Some([u1..un])` => full re-crawl with fixed seed set.
    pub explicit_urls: Option<Vec<String>>,
    pub indexed_count: i64,
    pub discovered_count: i64,
    pub total_pages: Option<i64>,
    pub encoding_chunks_total: i64,
    pub encoding_chunks_done: i64,
    pub encoding_discovered_total: i64,
    pub encoding_discovered_done: i64,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub last_activity_at: DateTime<Utc>,
    pub error: Option<String>,
}

impl CrawlJob {
    /// An add-page job has exactly one explicit URL. The ambiguity between
    /// an add-page job and a single-seed re-crawl isn't resolvable from
    /// `explicit_urls` alone in the general case, so the scheduler commits
    /// to treating any `explicit_urls.len() == 1` job as add-page.
    pub fn is_add_page(&self) -> bool {
        matches!(&self.explicit_urls, Some(urls) if urls.len() == 1)
    }
}
