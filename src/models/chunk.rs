//! Chunk model: a slice of page text with a vector embedding.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub id: Uuid,
    pub page: Uuid,
    pub content: String,
    pub start_index: Option<i32>,
    pub end_index: Option<i32>,
    pub embedding: Vec<f32>,
    pub owner: Uuid,
}
