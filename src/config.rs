//! Process configuration.
//!
//! Flat record, read entirely from the environment (optionally backed by a
//! `.env` file loaded in `main` before anything else): no config file, no
//! CLI flags beyond process start.

use std::env;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Recognized configuration surface.
#[derive(Debug, Clone)]
pub struct Config {
    pub store_url: String,
    pub embeddings_credential: String,
    pub embeddings_base_url: String,
    pub embeddings_model: String,
    pub max_concurrent_jobs: usize,
    pub fallback_poll_ms: u64,
}

impl Config {
    /// Load configuration from the environment, failing process startup
    /// with a non-zero exit if required credentials are missing.
    pub fn from_env() -> Result<Self, ConfigError> {
        let store_url = require("DATABASE_URL")?;
        let embeddings_credential = require("EMBEDDINGS_API_KEY")?;

        let embeddings_base_url = env::var("EMBEDDINGS_BASE_URL")
            .unwrap_or_else(|_| "https://api.openai.com/v1".to_string());
        let embeddings_model =
            env::var("EMBEDDINGS_MODEL").unwrap_or_else(|_| "text-embedding-3-small".to_string());

        let max_concurrent_jobs = parse_or_default("MAX_CONCURRENT_JOBS", 3)?;
        let fallback_poll_ms = parse_or_default("FALLBACK_POLL_MS", 60_000)?;

        Ok(Self {
            store_url,
            embeddings_credential,
            embeddings_base_url,
            embeddings_model,
            max_concurrent_jobs,
            fallback_poll_ms,
        })
    }
}

fn require(name: &'static str) -> Result<String, ConfigError> {
    env::var(name).map_err(|_| ConfigError::MissingVar(name))
}

fn parse_or_default<T>(name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
{
    match env::var(name) {
        Ok(value) => value.parse().map_err(|_| ConfigError::InvalidValue { name, value }),
        Err(_) => Ok(default),
    }
}
