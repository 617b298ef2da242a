//! Job lifecycle: claim, status transitions, counter updates.

use chrono::{DateTime, Utc};
use sqlx::types::Json;
use sqlx::Row;
use uuid::Uuid;

use super::{map_db_error, StoreGateway, StoreResult, STALE_JOB_THRESHOLD_SECS};
use crate::models::{CrawlJob, JobStatus};

impl StoreGateway {
    pub async fn get_job(&self, id: Uuid) -> StoreResult<CrawlJob> {
        let row = sqlx::query(JOB_COLUMNS)
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_db_error)?
            .ok_or_else(|| super::StoreError::NotFound(format!("job {id}")))?;
        row_to_job(&row)
    }

    /// Claim the next queued job, atomically. First requeues jobs that have
    /// gone stale, then conditionally flips the oldest queued row to
    /// `running`. Returns `None` on a claim race — that is not an error.
    pub async fn claim_next_job(&self) -> StoreResult<Option<CrawlJob>> {
        sqlx::query(
            r#"
            update crawl_jobs
            set status = 'queued', updated_at = now()
            where status = 'running'
              and last_activity_at < now() - make_interval(secs => $1)
            "#,
        )
        .bind(STALE_JOB_THRESHOLD_SECS as f64)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;

        let row = sqlx::query(
            &format!(
                r#"
                update crawl_jobs
                set status = 'running', last_activity_at = now(), updated_at = now(),
                    started_at = coalesce(started_at, now())
                where id = (
                    select id from crawl_jobs
                    where status = 'queued'
                    order by created_at asc
                    limit 1
                    for update skip locked
                )
                returning {JOB_FIELDS}
                "#
            ),
        )
        .fetch_optional(&self.pool)
        .await
        .map_err(map_db_error)?;

        row.as_ref().map(row_to_job).transpose()
    }

    pub async fn touch_activity(&self, job_id: Uuid) -> StoreResult<()> {
        sqlx::query("update crawl_jobs set last_activity_at = now() where id = $1")
            .bind(job_id)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    pub async fn update_counts(
        &self,
        job_id: Uuid,
        indexed_count: i64,
        discovered_count: i64,
    ) -> StoreResult<()> {
        sqlx::query(
            r#"
            update crawl_jobs
            set indexed_count = $2, discovered_count = $3,
                last_activity_at = now(), updated_at = now()
            where id = $1
            "#,
        )
        .bind(job_id)
        .bind(indexed_count)
        .bind(discovered_count)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    /// Set the page cap once at the start of a crawl.
    pub async fn set_total_pages(&self, job_id: Uuid, total_pages: i64) -> StoreResult<()> {
        sqlx::query("update crawl_jobs set total_pages = $2, updated_at = now() where id = $1")
            .bind(job_id)
            .bind(total_pages)
            .execute(&self.pool)
            .await
            .map_err(map_db_error)?;
        Ok(())
    }

    pub async fn set_indexing(&self, job_id: Uuid, encoding_discovered_total: i64) -> StoreResult<()> {
        sqlx::query(
            r#"
            update crawl_jobs
            set status = 'indexing', encoding_discovered_total = $2,
                last_activity_at = now(), updated_at = now()
            where id = $1
            "#,
        )
        .bind(job_id)
        .bind(encoding_discovered_total)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    pub async fn set_encoding_chunks_total(&self, job_id: Uuid, total: i64) -> StoreResult<()> {
        sqlx::query(
            "update crawl_jobs set encoding_chunks_total = $2, updated_at = now() where id = $1",
        )
        .bind(job_id)
        .bind(total)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    pub async fn increment_encoding_chunks_done(&self, job_id: Uuid, by: i64) -> StoreResult<()> {
        sqlx::query(
            r#"
            update crawl_jobs
            set encoding_chunks_done = encoding_chunks_done + $2,
                last_activity_at = now(), updated_at = now()
            where id = $1
            "#,
        )
        .bind(job_id)
        .bind(by)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    pub async fn increment_encoding_discovered_done(&self, job_id: Uuid, by: i64) -> StoreResult<()> {
        sqlx::query(
            r#"
            update crawl_jobs
            set encoding_discovered_done = encoding_discovered_done + $2,
                last_activity_at = now(), updated_at = now()
            where id = $1
            "#,
        )
        .bind(job_id)
        .bind(by)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    pub async fn complete_job(&self, job_id: Uuid) -> StoreResult<()> {
        sqlx::query(
            r#"
            update crawl_jobs
            set status = 'completed', completed_at = now(), updated_at = now()
            where id = $1
            "#,
        )
        .bind(job_id)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    /// Mark a job failed (fatal-for-job error). Permitted from any
    /// non-terminal state.
    pub async fn fail_job(&self, job_id: Uuid, error: &str) -> StoreResult<()> {
        sqlx::query(
            r#"
            update crawl_jobs
            set status = 'failed', error = $2, completed_at = now(), updated_at = now()
            where id = $1 and status not in ('completed', 'failed', 'cancelled')
            "#,
        )
        .bind(job_id)
        .bind(error)
        .execute(&self.pool)
        .await
        .map_err(map_db_error)?;
        Ok(())
    }

    /// Create a job for a re-crawl with an explicit seed set.
    pub async fn create_job(
        &self,
        source_id: Uuid,
        explicit_urls: Option<Vec<String>>,
    ) -> StoreResult<CrawlJob> {
        let row = sqlx::query(
            &format!(
                r#"
                insert into crawl_jobs (source, status, explicit_urls)
                values ($1, 'queued', $2)
                returning {JOB_FIELDS}
                "#
            ),
        )
        .bind(source_id)
        .bind(explicit_urls.map(Json))
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        row_to_job(&row)
    }

    /// True if the source already has an active (queued/running/indexing)
    /// main crawl job.
    pub async fn has_active_main_crawl(&self, source_id: Uuid) -> StoreResult<bool> {
        let row = sqlx::query(
            r#"
            select exists(
                select 1 from crawl_jobs
                where source = $1
                  and explicit_urls is null
                  and status in ('queued', 'running', 'indexing')
            ) as exists
            "#,
        )
        .bind(source_id)
        .fetch_one(&self.pool)
        .await
        .map_err(map_db_error)?;
        row.try_get("exists").map_err(|e| map_db_error(e.into()))
    }
}

const JOB_FIELDS: &str = "id, source, status, explicit_urls, indexed_count, discovered_count, \
    total_pages, encoding_chunks_total, encoding_chunks_done, encoding_discovered_total, \
    encoding_discovered_done, started_at, completed_at, last_activity_at, error";

const JOB_COLUMNS: &str = "select id, source, status, explicit_urls, indexed_count, \
    discovered_count, total_pages, encoding_chunks_total, encoding_chunks_done, \
    encoding_discovered_total, encoding_discovered_done, started_at, completed_at, \
    last_activity_at, error from crawl_jobs where id = $1";

fn row_to_job(row: &sqlx::postgres::PgRow) -> StoreResult<CrawlJob> {
    let status_str: String = row.try_get("status").map_err(|e| map_db_error(e.into()))?;
    let explicit_urls: Option<Json<Vec<String>>> = row
        .try_get("explicit_urls")
        .map_err(|e| map_db_error(e.into()))?;

    Ok(CrawlJob {
        id: row.try_get("id").map_err(|e| map_db_error(e.into()))?,
        source: row.try_get("source").map_err(|e| map_db_error(e.into()))?,
        status: JobStatus::from_str(&status_str)
            .ok_or_else(|| super::StoreError::NotFound(format!("unknown status {status_str}")))?,
        explicit_urls: explicit_urls.map(|Json(v)| v),
        indexed_count: row
            .try_get("indexed_count")
            .map_err(|e| map_db_error(e.into()))?,
        discovered_count: row
            .try_get("discovered_count")
            .map_err(|e| map_db_error(e.into()))?,
        total_pages: row
            .try_get("total_pages")
            .map_err(|e| map_db_error(e.into()))?,
        encoding_chunks_total: row
            .try_get("encoding_chunks_total")
            .map_err(|e| map_db_error(e.into()))?,
        encoding_chunks_done: row
            .try_get("encoding_chunks_done")
            .map_err(|e| map_db_error(e.into()))?,
        encoding_discovered_total: row
            .try_get("encoding_discovered_total")
            .map_err(|e| map_db_error(e.into()))?,
        encoding_discovered_done: row
            .try_get("encoding_discovered_done")
            .map_err(|e| map_db_error(e.into()))?,
        started_at: row
            .try_get::<Option<DateTime<Utc>>, _>("started_at")
            .map_err(|e| map_db_error(e.into()))?,
        completed_at: row
            .try_get::<Option<DateTime<Utc>>, _>("completed_at")
            .map_err(|e| map_db_error(e.into()))?,
        last_activity_at: row
            .try_get("last_activity_at")
            .map_err(|e| map_db_error(e.into()))?,
        error: row.try_get("error").map_err(|e| map_db_error(e.into()))?,
    })
}
