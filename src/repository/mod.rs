//! Store gateway — the only component that touches the record store.
//!
//! Every other component in this crate talks to Postgres exclusively
//! through a `StoreGateway`. All writes are idempotent with respect to
//! their natural keys; callers never see a unique violation, they get the
//! existing row back.

mod chunks;
mod discovered;
mod edges;
mod jobs;
mod pages;
mod recrawl;
mod sources;

use sqlx::postgres::{PgListener, PgPoolOptions};
use sqlx::PgPool;

pub use crate::error::{StoreError, StoreResult};
pub use chunks::NewChunk;
pub use discovered::PendingDiscoveredLink;

/// Postgres channel name the `crawl_jobs_notify_insert` trigger publishes
/// to. See `migrations/0001_init.sql`.
pub const QUEUED_JOB_CHANNEL: &str = "crawl_jobs_queued";

/// A job is considered abandoned (and re-queued) once its
/// `last_activity_at` is this old.
pub const STALE_JOB_THRESHOLD_SECS: i64 = 5 * 60;

#[derive(Clone)]
pub struct StoreGateway {
    pool: PgPool,
}

impl StoreGateway {
    /// Connect to Postgres and run pending migrations.
    pub async fn connect(database_url: &str) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(10)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations").run(&pool).await.map_err(|e| {
            StoreError::Database(sqlx::Error::Migrate(Box::new(e)))
        })?;

        Ok(Self { pool })
    }

    /// Wrap an already-connected, already-migrated pool. Used by
    /// integration tests, which get their pool (migrated) from
    /// `#[sqlx::test]`.
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Subscribe to the queued-job change-event channel.
    pub async fn listen_for_queued_jobs(&self) -> StoreResult<PgListener> {
        let mut listener = PgListener::connect_with(&self.pool).await?;
        listener.listen(QUEUED_JOB_CHANNEL).await?;
        Ok(listener)
    }
}

/// Map a Postgres error into a `StoreError`, recognizing foreign-key
/// violations (SQLSTATE 23503) as the "parent deleted" fatal-for-job kind.
pub(crate) fn map_db_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(ref db_err) = err {
        if db_err.code().as_deref() == Some("23503") {
            return StoreError::ParentDeleted(db_err.message().to_string());
        }
    }
    StoreError::Database(err)
}
