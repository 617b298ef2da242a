//! Encoded-discovered link rows: one per edge for dynamic sources.

use sqlx::Row;
use uuid::Uuid;

use super::{map_db_error, StoreGateway, StoreResult};
use crate::models::EncodedDiscovered;

/// An encoded-discovered row paired with its edge's target URL, for
/// callers (the indexer) that need to know what to fetch or compare.
#[derive(Debug, Clone)]
pub struct PendingDiscoveredLink {
    pub row: EncodedDiscovered,
    pub to_url: String,
}

impl StoreGateway {
    /// Upsert one encoded-discovered row per edge. `embedding` starts
    /// `None`; it is filled in by the indexer.
    pub async fn upsert_encoded_discovered(
        &self,
        page_edge: Uuid,
        owner: Uuid,
        anchor_text: Option<&str>,
        snippet: &str,
    ) -> StoreResult<EncodedDiscovered> {
        let row = sqlx::query(
            r#"
            insert into encoded_discovered (page_edge, owner, anchor_text, snippet)
            values ($1, $2, $3, $4)
            on conflict (page_edge) do update set page_edge = excluded.page_edge
            returning id, page_edge, anchor_text, snippet, embedding, owner
            "#,
        )
        .bind(page_edge)
        .bind(owner)
        .bind(anchor_text)
        .bind(snippet)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        row_to_discovered(&row)
    }

    /// Encoded-discovered rows with `embedding = null` for this source's
    /// pages whose target is not already an indexed page anywhere in the
    /// owning conversation's sources, paired with the edge's `to_url`.
    pub async fn pending_discovered_for_source(
        &self,
        source: Uuid,
    ) -> StoreResult<Vec<PendingDiscoveredLink>> {
        let rows = sqlx::query(
            r#"
            select ed.id, ed.page_edge, ed.anchor_text, ed.snippet, ed.embedding, ed.owner,
                   pe.to_url as to_url
            from encoded_discovered ed
            join page_edges pe on pe.id = ed.page_edge
            join pages p on p.id = pe.from_page
            join sources psrc on psrc.id = p.source
            where p.source = $1
              and ed.embedding is null
              and not exists (
                  select 1 from pages ip
                  join sources isrc on isrc.id = ip.source
                  where isrc.conversation = psrc.conversation
                    and ip.url = pe.to_url
                    and ip.status = 'indexed'
              )
            "#,
        )
        .bind(source)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;
        rows.iter()
            .map(|row| {
                Ok(PendingDiscoveredLink {
                    row: row_to_discovered(row)?,
                    to_url: row.try_get("to_url").map_err(|e| map_db_error(e.into()))?,
                })
            })
            .collect()
    }

    pub async fn count_pending_discovered_for_source(&self, source: Uuid) -> StoreResult<i64> {
        let row = sqlx::query(
            r#"
            select count(*) as count
            from encoded_discovered ed
            join page_edges pe on pe.id = ed.page_edge
            join pages p on p.id = pe.from_page
            where p.source = $1 and ed.embedding is null
            "#,
        )
        .bind(source)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        row.try_get("count").map_err(|e| map_db_error(e.into()))
    }

    pub async fn set_discovered_embedding(
        &self,
        id: Uuid,
        snippet: &str,
        embedding: &[f32],
    ) -> StoreResult<()> {
        sqlx::query(
            "update encoded_discovered set snippet = $2, embedding = $3, updated_at = now() where id = $1",
        )
        .bind(id)
        .bind(snippet)
        .bind(embedding)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    /// Clear embeddings of encoded-discovered rows whose `to_url` is now an
    /// indexed page anywhere in the same conversation's sources, not just
    /// this one — a discovered link can point at a page that belongs to a
    /// sibling source in the same conversation.
    pub async fn clear_embeddings_for_indexed_links(&self, source: Uuid) -> StoreResult<u64> {
        let result = sqlx::query(
            r#"
            update encoded_discovered ed
            set embedding = null, updated_at = now()
            from page_edges pe, pages fp, sources fsrc, pages ip, sources isrc
            where ed.page_edge = pe.id
              and pe.from_page = fp.id
              and fp.source = $1
              and fsrc.id = fp.source
              and isrc.id = ip.source
              and isrc.conversation = fsrc.conversation
              and ip.url = pe.to_url
              and ip.status = 'indexed'
              and ed.embedding is not null
            "#,
        )
        .bind(source)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(result.rows_affected())
    }
}

fn row_to_discovered(row: &sqlx::postgres::PgRow) -> StoreResult<EncodedDiscovered> {
    Ok(EncodedDiscovered {
        id: row.try_get("id").map_err(|e| map_db_error(e.into()))?,
        page_edge: row.try_get("page_edge").map_err(|e| map_db_error(e.into()))?,
        anchor_text: row
            .try_get("anchor_text")
            .map_err(|e| map_db_error(e.into()))?,
        snippet: row.try_get("snippet").map_err(|e| map_db_error(e.into()))?,
        embedding: row
            .try_get("embedding")
            .map_err(|e| map_db_error(e.into()))?,
        owner: row.try_get("owner").map_err(|e| map_db_error(e.into()))?,
    })
}
