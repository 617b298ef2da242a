//! Background crawl-and-embed worker: claims crawl jobs, fetches and
//! parses pages, extracts and persists outbound links, chunks and embeds
//! page content, and encodes discovered-link snippets for semantic
//! suggestion, reporting progress throughout.

pub mod config;
pub mod crawl;
pub mod error;
pub mod fetch;
pub mod indexer;
pub mod models;
pub mod normalize;
pub mod repository;
pub mod scheduler;

pub use config::Config;
pub use error::{FetchError, IndexError, JobError, StoreError};
pub use repository::StoreGateway;
