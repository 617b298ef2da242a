//! Error kinds for the worker, one enum per component boundary.
//!
//! Every fallible call site in this crate returns one of these instead of
//! propagating driver errors directly, so callers can match on the kind
//! that matters to them: transient vs. fatal-for-job vs. "not an error at
//! all".

use thiserror::Error;

/// Errors from the store gateway.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// The row referenced a parent (conversation/source) that no longer
    /// exists. Fatal for the job that triggered it.
    #[error("parent record deleted: {0}")]
    ParentDeleted(String),

    #[error("row not found: {0}")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Errors from fetching and parsing a page.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("non-2xx response: {0}")]
    Status(reqwest::StatusCode),

    #[error("disallowed by robots.txt")]
    RobotsDisallowed,
}

pub type FetchResult<T> = Result<T, FetchError>;

/// Errors from the indexer's embedding calls.
#[derive(Error, Debug)]
pub enum IndexError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("embeddings endpoint returned non-2xx status {0}")]
    Status(reqwest::StatusCode),

    #[error("embeddings endpoint returned {got} vectors for {expected} inputs")]
    CountMismatch { expected: usize, got: usize },

    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type IndexResult<T> = Result<T, IndexError>;

/// A failure that aborts the whole job (as opposed to a per-URL recoverable
/// error, which is logged and swallowed at the crawl-loop call site).
#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Index(#[from] IndexError),

    #[error(transparent)]
    Fetch(#[from] FetchError),
}
