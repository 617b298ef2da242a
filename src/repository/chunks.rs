//! Chunk inserts.

use uuid::Uuid;

use super::{map_db_error, StoreGateway, StoreResult};

/// A chunk ready to be written, before it has an id.
pub struct NewChunk {
    pub page: Uuid,
    pub owner: Uuid,
    pub content: String,
    pub start_index: Option<i32>,
    pub end_index: Option<i32>,
    pub embedding: Vec<f32>,
}

impl StoreGateway {
    /// Insert one batch of chunks in a single round trip.
    pub async fn insert_chunks(&self, chunks: &[NewChunk]) -> StoreResult<()> {
        if chunks.is_empty() {
            return Ok(());
        }
        let mut tx = self.pool().begin().await.map_err(map_db_error)?;
        for chunk in chunks {
            sqlx::query(
                r#"
                insert into chunks (page, owner, content, start_index, end_index, embedding)
                values ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(chunk.page)
            .bind(chunk.owner)
            .bind(&chunk.content)
            .bind(chunk.start_index)
            .bind(chunk.end_index)
            .bind(&chunk.embedding)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        }
        tx.commit().await.map_err(map_db_error)?;
        Ok(())
    }

    pub async fn has_chunks_for_page(&self, page: Uuid) -> StoreResult<bool> {
        let row = sqlx::query("select exists(select 1 from chunks where page = $1) as exists")
            .bind(page)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;
        use sqlx::Row;
        row.try_get("exists").map_err(|e| map_db_error(e.into()))
    }
}
