//! Bounded-concurrency job scheduler: wakes on `LISTEN`/`NOTIFY`, falls
//! back to polling, and dispatches each claimed job to the add-page or
//! main-crawl pipeline.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::crawl::{add_page, engine};
use crate::fetch::HttpFetcher;
use crate::indexer::EmbeddingClient;
use crate::repository::StoreGateway;

/// Run the scheduler loop until `shutdown` resolves. Each claimed job runs
/// on its own task, bounded by `max_concurrent_jobs` permits.
pub async fn run(
    store: StoreGateway,
    fetcher: HttpFetcher,
    embedder: EmbeddingClient,
    max_concurrent_jobs: usize,
    fallback_poll_ms: u64,
    mut shutdown: tokio::sync::oneshot::Receiver<()>,
) {
    let semaphore = Arc::new(Semaphore::new(max_concurrent_jobs));
    let poll_interval = Duration::from_millis(fallback_poll_ms);

    let mut listener = match store.listen_for_queued_jobs().await {
        Ok(listener) => Some(listener),
        Err(err) => {
            warn!(error = %err, "scheduler: could not start LISTEN, falling back to polling only");
            None
        }
    };

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("scheduler: shutdown requested, draining in-flight jobs");
                break;
            }
            _ = wake(&mut listener, poll_interval) => {}
        }

        drain_queue(&store, &fetcher, &embedder, &semaphore).await;
    }

    // Wait for every in-flight job to release its permit before returning,
    // so the process doesn't exit mid-job.
    let _ = semaphore.acquire_many(max_concurrent_jobs as u32).await;
}

/// Resolve on the next `NOTIFY`, or after `poll_interval` elapses,
/// whichever comes first.
async fn wake(listener: &mut Option<sqlx::postgres::PgListener>, poll_interval: Duration) {
    match listener {
        Some(listener) => {
            tokio::select! {
                _ = tokio::time::sleep(poll_interval) => {}
                notification = listener.recv() => {
                    if notification.is_err() {
                        warn!("scheduler: LISTEN connection dropped, relying on polling");
                    }
                }
            }
        }
        None => {
            tokio::time::sleep(poll_interval).await;
        }
    }
}

/// Claim and dispatch as many queued jobs as there are free permits.
async fn drain_queue(
    store: &StoreGateway,
    fetcher: &HttpFetcher,
    embedder: &EmbeddingClient,
    semaphore: &Arc<Semaphore>,
) {
    loop {
        let permit = match semaphore.clone().try_acquire_owned() {
            Ok(permit) => permit,
            Err(_) => return,
        };

        let job = match store.claim_next_job().await {
            Ok(Some(job)) => job,
            Ok(None) => return,
            Err(err) => {
                error!(error = %err, "scheduler: claim failed");
                return;
            }
        };

        let store = store.clone();
        let fetcher = fetcher.clone();
        let embedder = embedder.clone();

        tokio::spawn(async move {
            let _permit = permit;
            let job_id = job.id;
            let result = run_job(&store, &fetcher, &embedder, &job).await;
            if let Err(err) = result {
                warn!(job = %job_id, error = %err, "scheduler: job failed");
                if let Err(mark_err) = store.fail_job(job_id, &err.to_string()).await {
                    error!(job = %job_id, error = %mark_err, "scheduler: failed to record job failure");
                }
            }
        });
    }
}

async fn run_job(
    store: &StoreGateway,
    fetcher: &HttpFetcher,
    embedder: &EmbeddingClient,
    job: &crate::models::CrawlJob,
) -> Result<(), crate::error::JobError> {
    let source = store.get_source(job.source).await?;
    if job.is_add_page() {
        add_page::run(store, fetcher, embedder, &source, job).await
    } else {
        engine::run(store, fetcher, embedder, &source, job).await
    }
}
