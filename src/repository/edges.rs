//! Outbound-link edges, upserted in caller-controlled batches.

use sqlx::Row;
use uuid::Uuid;

use super::{map_db_error, StoreGateway, StoreResult};
use crate::models::PageEdge;

impl StoreGateway {
    /// Upsert one batch of `(from_page, to_url)` edges. Duplicate rows are
    /// treated as success and the existing row is returned.
    pub async fn upsert_edges(
        &self,
        from_page: Uuid,
        owner: Uuid,
        to_urls: &[String],
    ) -> StoreResult<Vec<PageEdge>> {
        let mut edges = Vec::with_capacity(to_urls.len());
        for to_url in to_urls {
            let row = sqlx::query(
                r#"
                insert into page_edges (from_page, to_url, owner)
                values ($1, $2, $3)
                on conflict (from_page, to_url) do update set from_page = excluded.from_page
                returning id, from_page, to_url, owner
                "#,
            )
            .bind(from_page)
            .bind(to_url)
            .bind(owner)
            .fetch_one(&self.pool)
            .await
            .map_err(map_db_error)?;
            edges.push(row_to_edge(&row)?);
        }
        Ok(edges)
    }

    pub async fn edges_for_to_url(&self, source: Uuid, to_url: &str) -> StoreResult<Vec<PageEdge>> {
        let rows = sqlx::query(
            r#"
            select pe.id, pe.from_page, pe.to_url, pe.owner
            from page_edges pe
            join pages p on p.id = pe.from_page
            where p.source = $1 and pe.to_url = $2
            "#,
        )
        .bind(source)
        .bind(to_url)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;
        rows.iter().map(row_to_edge).collect()
    }
}

fn row_to_edge(row: &sqlx::postgres::PgRow) -> StoreResult<PageEdge> {
    Ok(PageEdge {
        id: row.try_get("id").map_err(|e| map_db_error(e.into()))?,
        from_page: row.try_get("from_page").map_err(|e| map_db_error(e.into()))?,
        to_url: row.try_get("to_url").map_err(|e| map_db_error(e.into()))?,
        owner: row.try_get("owner").map_err(|e| map_db_error(e.into()))?,
    })
}
