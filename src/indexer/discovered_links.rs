//! Embedding of discovered-link snippets, surface and dive modes.

use std::sync::OnceLock;
use std::time::Duration;

use regex::Regex;
use tracing::warn;
use uuid::Uuid;

use super::embedder::{EmbeddingClient, EMBED_BATCH_SIZE};
use crate::error::{IndexError, JobError};
use crate::fetch::{extract_main_content, HttpFetcher};
use crate::models::{Source, SuggestionMode};
use crate::repository::{PendingDiscoveredLink, StoreGateway};

const DIVE_LEAD_CHARS: usize = 200;
const DIVE_REQUEST_SPACING: Duration = Duration::from_millis(400);

/// Embed every pending encoded-discovered row for `source`, then clear the
/// embeddings of rows whose target has since become an indexed page.
///
/// Progress is reported via `increment_encoding_discovered_done` after
/// every unit of work: a batch in surface mode (size
/// [`EMBED_BATCH_SIZE`]), a single link in dive mode. An embedding-count
/// mismatch stops this pass early rather than failing the job; whatever
/// was embedded before the mismatch stays encoded.
pub async fn index_discovered_links(
    store: &StoreGateway,
    fetcher: &HttpFetcher,
    embedder: &EmbeddingClient,
    source: &Source,
    job_id: Uuid,
) -> Result<(), JobError> {
    store.clear_embeddings_for_indexed_links(source.id).await?;

    let pending = store.pending_discovered_for_source(source.id).await?;
    if pending.is_empty() {
        return Ok(());
    }

    match source.suggestion_mode {
        SuggestionMode::Surface => {
            for batch in pending.chunks(EMBED_BATCH_SIZE) {
                let inputs: Vec<String> = batch.iter().map(|p| p.row.snippet.clone()).collect();
                let vectors = match embedder.embed_batch(&inputs).await {
                    Ok(vectors) => vectors,
                    Err(IndexError::CountMismatch { expected, got }) => {
                        warn!(expected, got, "discovered-link embedding count mismatch, stopping pass early");
                        return Ok(());
                    }
                    Err(err) => return Err(JobError::Index(err)),
                };
                for (link, vector) in batch.iter().zip(vectors) {
                    store
                        .set_discovered_embedding(link.row.id, &link.row.snippet, &vector)
                        .await?;
                }
                store
                    .increment_encoding_discovered_done(job_id, batch.len() as i64)
                    .await?;
            }
        }
        SuggestionMode::Dive => {
            for link in &pending {
                let snippet = dive_lead(fetcher, link).await;
                let vectors = match embedder.embed_batch(std::slice::from_ref(&snippet)).await {
                    Ok(vectors) => vectors,
                    Err(IndexError::CountMismatch { expected, got }) => {
                        warn!(expected, got, "discovered-link embedding count mismatch, stopping pass early");
                        return Ok(());
                    }
                    Err(err) => return Err(JobError::Index(err)),
                };
                if let Some(vector) = vectors.into_iter().next() {
                    store
                        .set_discovered_embedding(link.row.id, &snippet, &vector)
                        .await?;
                }
                store.increment_encoding_discovered_done(job_id, 1).await?;
                tokio::time::sleep(DIVE_REQUEST_SPACING).await;
            }
        }
    }

    Ok(())
}

/// The dive-mode snippet: the target page's lead paragraph, fluff-stripped
/// and truncated. Falls back to the existing snippet if the fetch fails.
async fn dive_lead(fetcher: &HttpFetcher, link: &PendingDiscoveredLink) -> String {
    match fetcher.fetch_text(&link.to_url).await {
        Ok(html) => {
            let content = extract_main_content(&html);
            let lead = strip_fluff(&content);
            truncate_chars(&lead, DIVE_LEAD_CHARS)
        }
        Err(_) => link.row.snippet.clone(),
    }
}

fn from_encyclopedia_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?i)^From [^,]+, the free encyclopedia\.?\s*").expect("static pattern")
    })
}

fn coordinate_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"\d{1,3}°\d{1,2}(?:′|')\d{0,2}(?:\.\d+)?(?:″|\")?\s*[NSEW]\b")
            .expect("static pattern")
    })
}

fn css_rule_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\.[\w-]+\s*\{[^}]*\}").expect("static pattern"))
}

/// Strip boilerplate that leaks into extracted text on encyclopedia-style
/// pages: leading "From X, the free encyclopedia", coordinate fragments,
/// and stray CSS rules.
fn strip_fluff(text: &str) -> String {
    let text = from_encyclopedia_pattern().replace(text, "");
    let text = coordinate_pattern().replace_all(&text, "");
    let text = css_rule_pattern().replace_all(&text, "");
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn truncate_chars(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    text.chars().take(max).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_encyclopedia_boilerplate() {
        let text = "From Example, the free encyclopedia Foo bar baz content follows.";
        assert_eq!(strip_fluff(text), "Foo bar baz content follows.");
    }

    #[test]
    fn strips_coordinate_fragments() {
        let text = "Intro sentence. 40°42′46″N 74°00′21″W More text.";
        let stripped = strip_fluff(text);
        assert!(!stripped.contains('°'));
    }

    #[test]
    fn truncates_to_lead_length() {
        let text = "z".repeat(500);
        assert_eq!(truncate_chars(&text, DIVE_LEAD_CHARS).chars().count(), DIVE_LEAD_CHARS);
    }
}
