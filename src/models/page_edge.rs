//! PageEdge model: a directed outgoing link from a crawled page.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageEdge {
    pub id: Uuid,
    pub from_page: Uuid,
    /// Canonical URL. May not correspond to a page yet.
    pub to_url: String,
    pub owner: Uuid,
}
