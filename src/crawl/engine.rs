//! Main BFS crawl engine.

use std::collections::{HashSet, VecDeque};
use std::time::Duration;

use tracing::warn;
use url::Url;

use crate::error::{JobError, StoreError};
use crate::fetch::{HttpFetcher, RobotsPolicy};
use crate::indexer::{self, EmbeddingClient};
use crate::models::{CrawlJob, Source};
use crate::normalize::normalize_url;
use crate::repository::StoreGateway;

const POLITENESS_SLEEP: Duration = Duration::from_secs(1);

/// Run the BFS crawl for a claimed main-crawl (or full re-crawl) job, then
/// its indexing pass, ending in `completed`.
pub async fn run(
    store: &StoreGateway,
    fetcher: &HttpFetcher,
    embedder: &EmbeddingClient,
    source: &Source,
    job: &CrawlJob,
) -> Result<(), JobError> {
    let seeds: Vec<String> = match &job.explicit_urls {
        Some(urls) if !urls.is_empty() => urls.iter().map(|u| normalize_url(u)).collect(),
        _ => vec![normalize_url(&source.initial_url)],
    };
    let page_cap = source.page_cap(seeds.len());
    store.set_total_pages(job.id, page_cap as i64).await?;

    let robots = fetch_robots_policy(&seeds, fetcher).await;

    let mut visited: HashSet<String> = HashSet::new();
    let mut discovered: HashSet<String> = HashSet::new();
    let mut queue: VecDeque<String> = VecDeque::new();
    for seed in &seeds {
        if discovered.insert(seed.clone()) {
            queue.push_back(seed.clone());
        }
    }

    let mut indexed_count: i64 = 0;

    while let Some(candidate) = queue.pop_front() {
        if visited.len() >= page_cap {
            break;
        }
        let url = normalize_url(&candidate);
        if visited.contains(&url) {
            continue;
        }
        if !robots.is_allowed(&url) {
            // Not a visited page, but it still counts toward
            // discovered_count.
            continue;
        }
        visited.insert(url.clone());

        match crawl_one(store, fetcher, source, &url, &mut discovered, &mut queue).await {
            Ok(Some(())) => {
                indexed_count += 1;
            }
            Ok(None) => {}
            Err(JobError::Store(StoreError::ParentDeleted(msg))) => {
                return Err(JobError::Store(StoreError::ParentDeleted(msg)));
            }
            Err(err) => {
                warn!(url = %url, error = %err, "crawl: per-url error, skipping");
            }
        }

        store
            .update_counts(job.id, indexed_count, discovered.len() as i64)
            .await?;
        tokio::time::sleep(POLITENESS_SLEEP).await;
    }

    let encoding_discovered_total = if source.depth.is_dynamic() {
        store.count_pending_discovered_for_source(source.id).await?
    } else {
        0
    };
    store.set_indexing(job.id, encoding_discovered_total).await?;

    indexer::run_for_source(store, fetcher, embedder, source, job.id).await?;

    store
        .update_counts(job.id, indexed_count, discovered.len() as i64)
        .await?;
    store.complete_job(job.id).await?;
    Ok(())
}

/// Fetch, parse, insert, and link-extract one candidate page. Returns
/// `Ok(Some(()))` on success, `Ok(None)` when the page itself failed but
/// the job should continue, and a fatal `Err` only for "parent deleted".
async fn crawl_one(
    store: &StoreGateway,
    fetcher: &HttpFetcher,
    source: &Source,
    url: &str,
    discovered: &mut HashSet<String>,
    queue: &mut VecDeque<String>,
) -> Result<Option<()>, JobError> {
    let html = match fetcher.fetch_text(url).await {
        Ok(html) => html,
        Err(err) => {
            warn!(url = %url, error = %err, "crawl: fetch failed");
            return Ok(None);
        }
    };

    let page = super::shared::insert_fetched_page(store, source, url, &html).await?;

    let links = super::shared::outgoing_links(source, url, &html);
    for link in &links {
        if discovered.insert(link.url.clone()) {
            queue.push_back(link.url.clone());
        }
    }

    super::shared::persist_edges_and_discovered(store, source, page.id, url, &links).await?;

    Ok(Some(()))
}

async fn fetch_robots_policy(seeds: &[String], fetcher: &HttpFetcher) -> RobotsPolicy {
    let Some(first) = seeds.first() else {
        return RobotsPolicy::permissive();
    };
    let Ok(parsed) = Url::parse(first) else {
        return RobotsPolicy::permissive();
    };
    let Some(origin) = parsed.host_str().map(|host| format!("{}://{host}", parsed.scheme())) else {
        return RobotsPolicy::permissive();
    };
    RobotsPolicy::fetch(&origin, fetcher).await
}
