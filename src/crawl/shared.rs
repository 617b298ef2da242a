//! Per-page logic shared by the BFS engine and the add-page fast path:
//! insert the fetched page, extract its outgoing links, and persist edges
//! plus (for dynamic sources) encoded-discovered rows.

use url::Url;

use crate::error::{JobError, StoreError};
use crate::fetch::{extract_links_with_context, extract_main_content, extract_title, strip_title_suffix, LinkContext};
use crate::models::{Page, PageStatus, Source, SuggestionMode};
use crate::repository::StoreGateway;

use std::time::Duration;

const EDGE_BATCH_SIZE: usize = 50;
const EDGE_BATCH_PAUSE: Duration = Duration::from_millis(100);
const DYNAMIC_LINK_CAP: usize = 200;
const DYNAMIC_DISCOVERED_CAP_PER_PAGE: usize = 500;

/// Parse and insert one fetched page, updating the source label on first
/// write.
pub async fn insert_fetched_page(
    store: &StoreGateway,
    source: &Source,
    url: &str,
    html: &str,
) -> Result<Page, JobError> {
    let title = extract_title(html);
    let content = extract_main_content(html);
    let path = Url::parse(url).map(|u| u.path().to_string()).unwrap_or_default();

    let page = store
        .insert_page(source.id, source.owner, url, &title, &path, &content, PageStatus::Crawling)
        .await?;

    store
        .set_label_if_absent(source.id, &strip_title_suffix(&title))
        .await?;

    Ok(page)
}

/// The page's outgoing links, capped for dynamic sources.
pub fn outgoing_links(source: &Source, url: &str, html: &str) -> Vec<LinkContext> {
    let mut links = extract_links_with_context(html, url, source.same_domain_only);
    if source.depth.is_dynamic() && links.len() > DYNAMIC_LINK_CAP {
        links.truncate(DYNAMIC_LINK_CAP);
    }
    links
}

/// Upsert edges in batches and, for dynamic sources, an encoded-discovered
/// row per edge up to the per-page cap. A foreign-key violation (the
/// source's parent was deleted mid-crawl) aborts the job; any other batch
/// error is logged and the remaining batches still run.
pub async fn persist_edges_and_discovered(
    store: &StoreGateway,
    source: &Source,
    from_page: uuid::Uuid,
    url: &str,
    links: &[LinkContext],
) -> Result<(), JobError> {
    let is_dynamic = source.depth.is_dynamic();
    let to_urls: Vec<String> = links.iter().map(|l| l.url.clone()).collect();
    let mut discovered_rows_this_page = 0usize;

    for batch in to_urls.chunks(EDGE_BATCH_SIZE) {
        let edges = match store.upsert_edges(from_page, source.owner, batch).await {
            Ok(edges) => edges,
            Err(StoreError::ParentDeleted(msg)) => {
                return Err(JobError::Store(StoreError::ParentDeleted(msg)))
            }
            Err(err) => {
                tracing::warn!(url = %url, error = %err, "crawl: edge batch upsert failed");
                tokio::time::sleep(EDGE_BATCH_PAUSE).await;
                continue;
            }
        };

        if is_dynamic {
            for edge in &edges {
                if discovered_rows_this_page >= DYNAMIC_DISCOVERED_CAP_PER_PAGE {
                    break;
                }
                let Some(link) = links.iter().find(|l| l.url == edge.to_url) else {
                    continue;
                };
                let snippet = match source.suggestion_mode {
                    SuggestionMode::Surface => link.snippet.as_str(),
                    SuggestionMode::Dive => "Link from page",
                };
                store
                    .upsert_encoded_discovered(edge.id, source.owner, link.anchor_text.as_deref(), snippet)
                    .await?;
                discovered_rows_this_page += 1;
            }
        }

        tokio::time::sleep(EDGE_BATCH_PAUSE).await;
    }

    Ok(())
}
