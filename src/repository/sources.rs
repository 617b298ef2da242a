//! Source reads and the one-time label write.

use sqlx::Row;
use uuid::Uuid;

use super::{map_db_error, StoreGateway, StoreResult};
use crate::models::{Depth, Source, SuggestionMode};

impl StoreGateway {
    pub async fn get_source(&self, id: Uuid) -> StoreResult<Source> {
        let row = sqlx::query(
            r#"
            select id, owner, conversation, initial_url, depth,
                   same_domain_only, suggestion_mode, label
            from sources where id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?
        .ok_or_else(|| super::StoreError::NotFound(format!("source {id}")))?;

        row_to_source(&row)
    }

    /// Copy the page title (truncated to 100 chars) into `source.label`,
    /// but only if the label has never been set. Once only.
    pub async fn set_label_if_absent(&self, source_id: Uuid, title: &str) -> StoreResult<()> {
        let truncated: String = title.chars().take(100).collect();
        sqlx::query(
            "update sources set label = $2, updated_at = now() where id = $1 and label is null",
        )
        .bind(source_id)
        .bind(truncated)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }
}

fn row_to_source(row: &sqlx::postgres::PgRow) -> StoreResult<Source> {
    let depth_str: String = row.try_get("depth").map_err(|e| map_db_error(e.into()))?;
    let mode_str: String = row
        .try_get("suggestion_mode")
        .map_err(|e| map_db_error(e.into()))?;

    Ok(Source {
        id: row.try_get("id").map_err(|e| map_db_error(e.into()))?,
        owner: row.try_get("owner").map_err(|e| map_db_error(e.into()))?,
        conversation: row
            .try_get("conversation")
            .map_err(|e| map_db_error(e.into()))?,
        initial_url: row
            .try_get("initial_url")
            .map_err(|e| map_db_error(e.into()))?,
        depth: Depth::from_str(&depth_str)
            .ok_or_else(|| super::StoreError::NotFound(format!("unknown depth {depth_str}")))?,
        same_domain_only: row
            .try_get("same_domain_only")
            .map_err(|e| map_db_error(e.into()))?,
        suggestion_mode: SuggestionMode::from_str(&mode_str).ok_or_else(|| {
            super::StoreError::NotFound(format!("unknown suggestion_mode {mode_str}"))
        })?,
        label: row.try_get("label").map_err(|e| map_db_error(e.into()))?,
    })
}
