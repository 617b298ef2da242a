//! EncodedDiscovered model: a discovered outbound link enriched with an
//! embedded snippet, used to rank unvisited pages for semantic suggestion.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EncodedDiscovered {
    pub id: Uuid,
    pub page_edge: Uuid,
    pub anchor_text: Option<String>,
    pub snippet: String,
    /// `None` => pending embedding. `Some(_)` => available for suggestion.
    pub embedding: Option<Vec<f32>>,
    pub owner: Uuid,
}
