//! Data models for the crawl-and-embed worker.

mod chunk;
mod crawl_job;
mod encoded_discovered;
mod page;
mod page_edge;
mod source;

pub use chunk::Chunk;
pub use crawl_job::{CrawlJob, JobStatus};
pub use encoded_discovered::EncodedDiscovered;
pub use page::{Page, PageStatus, MAX_CONTENT_CHARS};
pub use page_edge::PageEdge;
pub use source::{Depth, Source, SuggestionMode};
