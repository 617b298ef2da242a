//! Re-crawl helper: wipe a source's derived data, then queue a fresh job
//! with an explicit seed set.

use uuid::Uuid;

use super::{map_db_error, StoreGateway, StoreResult};
use crate::models::CrawlJob;

impl StoreGateway {
    /// Delete the source's pages, edges, chunks, and encoded-discovered
    /// rows, then create a new job with the given explicit seed URLs.
    /// Cascading foreign keys take care of edges/chunks/discovered once
    /// their owning pages are gone.
    pub async fn recrawl_with_seeds(
        &self,
        source_id: Uuid,
        seeds: Vec<String>,
    ) -> StoreResult<CrawlJob> {
        let mut tx = self.pool().begin().await.map_err(map_db_error)?;

        sqlx::query("delete from pages where source = $1")
            .bind(source_id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        tx.commit().await.map_err(map_db_error)?;

        self.create_job(source_id, Some(seeds)).await
    }
}
