//! Single-URL add-page fast path: one fetch, one page, the same per-page
//! edge/discovered-link handling as the BFS engine, then a single-page
//! indexing pass.

use crate::error::JobError;
use crate::fetch::HttpFetcher;
use crate::indexer::{self, EmbeddingClient};
use crate::models::{CrawlJob, Source};
use crate::normalize::normalize_url;
use crate::repository::StoreGateway;

/// Run an add-page job. `job.explicit_urls` must hold exactly one URL
/// (`CrawlJob::is_add_page`); the fetch failing aborts the job outright,
/// since there's no BFS loop here to swallow a single bad fetch into.
pub async fn run(
    store: &StoreGateway,
    fetcher: &HttpFetcher,
    embedder: &EmbeddingClient,
    source: &Source,
    job: &CrawlJob,
) -> Result<(), JobError> {
    let raw_url = job
        .explicit_urls
        .as_ref()
        .and_then(|urls| urls.first())
        .expect("add-page job has exactly one explicit url");
    let url = normalize_url(raw_url);

    store.set_total_pages(job.id, 1).await?;

    let html = fetcher.fetch_text(&url).await?;

    let page = super::shared::insert_fetched_page(store, source, &url, &html).await?;
    let links = super::shared::outgoing_links(source, &url, &html);
    super::shared::persist_edges_and_discovered(store, source, page.id, &url, &links).await?;

    store.update_counts(job.id, 1, links.len() as i64).await?;

    let encoding_discovered_total = if source.depth.is_dynamic() {
        store.count_pending_discovered_for_source(source.id).await?
    } else {
        0
    };
    store.set_indexing(job.id, encoding_discovered_total).await?;

    indexer::run_for_page(store, fetcher, embedder, source, &page, job.id).await?;

    store.complete_job(job.id).await?;
    Ok(())
}
