//! Chunking, embedding, and discovered-link encoding.

pub mod chunker;
pub mod discovered_links;
pub mod embedder;

pub use embedder::EmbeddingClient;

use tracing::warn;
use uuid::Uuid;

use crate::error::{IndexError, JobError};
use crate::fetch::HttpFetcher;
use crate::models::{Page, Source};
use crate::repository::{NewChunk, StoreGateway};
use chunker::chunk_text;
use embedder::EMBED_BATCH_SIZE;

/// Whether a chunking/embedding pass ran to completion or stopped early on
/// an embedding-count mismatch. A mismatch is not fatal for the job: the
/// indexing pass just stops where it is, leaving
/// `encoding_chunks_done < encoding_chunks_total` as a supported partial
/// end state.
enum PassOutcome {
    Completed,
    StoppedEarly,
}

/// Chunk and embed every page indexed during this job, then embed the
/// source's pending discovered-link snippets.
pub async fn run_for_source(
    store: &StoreGateway,
    fetcher: &HttpFetcher,
    embedder: &EmbeddingClient,
    source: &Source,
    job_id: Uuid,
) -> Result<(), JobError> {
    let pages = store.indexable_pages_for_source(source.id).await?;

    let total_chunks: usize = pages.iter().map(|p| chunk_text(&p.content).len()).sum();
    store
        .set_encoding_chunks_total(job_id, total_chunks as i64)
        .await?;

    for page in &pages {
        match index_page_chunks(store, embedder, page, job_id).await? {
            PassOutcome::Completed => store.mark_indexed(page.id).await?,
            PassOutcome::StoppedEarly => return Ok(()),
        }
    }

    discovered_links::index_discovered_links(store, fetcher, embedder, source, job_id).await?;
    Ok(())
}

/// Single-page variant for the add-page pipeline.
pub async fn run_for_page(
    store: &StoreGateway,
    fetcher: &HttpFetcher,
    embedder: &EmbeddingClient,
    source: &Source,
    page: &Page,
    job_id: Uuid,
) -> Result<(), JobError> {
    let spans = chunk_text(&page.content);
    store
        .set_encoding_chunks_total(job_id, spans.len() as i64)
        .await?;
    match index_page_chunks(store, embedder, page, job_id).await? {
        PassOutcome::Completed => store.mark_indexed(page.id).await?,
        PassOutcome::StoppedEarly => return Ok(()),
    }

    discovered_links::index_discovered_links(store, fetcher, embedder, source, job_id).await?;
    Ok(())
}

async fn index_page_chunks(
    store: &StoreGateway,
    embedder: &EmbeddingClient,
    page: &Page,
    job_id: Uuid,
) -> Result<PassOutcome, JobError> {
    let spans = chunk_text(&page.content);
    for batch in spans.chunks(EMBED_BATCH_SIZE) {
        let inputs: Vec<String> = batch.iter().map(|s| s.content.clone()).collect();
        let vectors = match embedder.embed_batch(&inputs).await {
            Ok(vectors) => vectors,
            Err(IndexError::CountMismatch { expected, got }) => {
                warn!(page = %page.id, expected, got, "embedding count mismatch, stopping indexing pass early");
                return Ok(PassOutcome::StoppedEarly);
            }
            Err(err) => return Err(JobError::Index(err)),
        };
        let new_chunks: Vec<NewChunk> = batch
            .iter()
            .zip(vectors)
            .map(|(span, embedding)| NewChunk {
                page: page.id,
                owner: page.owner,
                content: span.content.clone(),
                start_index: span.start_index,
                end_index: span.end_index,
                embedding,
            })
            .collect();
        store.insert_chunks(&new_chunks).await?;
        store
            .increment_encoding_chunks_done(job_id, batch.len() as i64)
            .await?;
    }
    Ok(PassOutcome::Completed)
}
