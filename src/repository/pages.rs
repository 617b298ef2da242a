//! Page inserts and reads.

use sqlx::Row;
use uuid::Uuid;

use super::{map_db_error, StoreGateway, StoreResult};
use crate::models::{Page, PageStatus};

impl StoreGateway {
    /// Insert a page. If `(source, url)` already exists, the existing row
    /// is returned unchanged: page inserts are idempotent on the
    /// `(source, url)` natural key.
    pub async fn insert_page(
        &self,
        source: Uuid,
        owner: Uuid,
        url: &str,
        title: &str,
        path: &str,
        content: &str,
        status: PageStatus,
    ) -> StoreResult<Page> {
        let row = sqlx::query(
            r#"
            insert into pages (source, owner, url, title, path, content, status)
            values ($1, $2, $3, $4, $5, $6, $7)
            on conflict (source, url) do update set source = excluded.source
            returning id, source, url, title, path, content, status, owner
            "#,
        )
        .bind(source)
        .bind(owner)
        .bind(url)
        .bind(title)
        .bind(path)
        .bind(content)
        .bind(status.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;

        row_to_page(&row)
    }

    pub async fn mark_indexed(&self, page_id: Uuid) -> StoreResult<()> {
        sqlx::query("update pages set status = 'indexed', updated_at = now() where id = $1")
            .bind(page_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    pub async fn get_page_by_url(&self, source: Uuid, url: &str) -> StoreResult<Option<Page>> {
        let row = sqlx::query(
            "select id, source, url, title, path, content, status, owner \
             from pages where source = $1 and url = $2",
        )
        .bind(source)
        .bind(url)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;
        row.as_ref().map(row_to_page).transpose()
    }

    /// Pages with `status=crawling`: the pages this job just fetched and
    /// hasn't indexed yet. Already-`indexed` pages from an earlier job are
    /// excluded so re-runs don't re-chunk them. Empty-content pages are
    /// still included here so they get marked indexed below, the same as
    /// the add-page path does unconditionally.
    pub async fn indexable_pages_for_source(&self, source: Uuid) -> StoreResult<Vec<Page>> {
        let rows = sqlx::query(
            "select id, source, url, title, path, content, status, owner \
             from pages where source = $1 and status = 'crawling'",
        )
        .bind(source)
        .fetch_all(&self.pool)
        .await
        .map_err(map_db_error)?;
        rows.iter().map(row_to_page).collect()
    }

    /// True if a page with this canonical URL is indexed for the source.
    /// Used to clear stale discovered-link rows once their target has
    /// actually been crawled and indexed.
    pub async fn has_indexed_page_with_url(&self, source: Uuid, url: &str) -> StoreResult<bool> {
        let row = sqlx::query(
            "select exists(select 1 from pages where source = $1 and url = $2 and status = 'indexed') as exists",
        )
        .bind(source)
        .bind(url)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        row.try_get("exists").map_err(|e| map_db_error(e.into()))
    }
}

fn row_to_page(row: &sqlx::postgres::PgRow) -> StoreResult<Page> {
    let status_str: String = row.try_get("status").map_err(|e| map_db_error(e.into()))?;
    Ok(Page {
        id: row.try_get("id").map_err(|e| map_db_error(e.into()))?,
        source: row.try_get("source").map_err(|e| map_db_error(e.into()))?,
        url: row.try_get("url").map_err(|e| map_db_error(e.into()))?,
        title: row.try_get("title").map_err(|e| map_db_error(e.into()))?,
        path: row.try_get("path").map_err(|e| map_db_error(e.into()))?,
        content: row.try_get("content").map_err(|e| map_db_error(e.into()))?,
        status: PageStatus::from_str(&status_str)
            .ok_or_else(|| super::StoreError::NotFound(format!("unknown status {status_str}")))?,
        owner: row.try_get("owner").map_err(|e| map_db_error(e.into()))?,
    })
}
