//! Embeddings endpoint client.
//!
//! Pattern follows the bearer-token JSON client used elsewhere in the
//! pack for external model APIs: build once, reuse the client, fail on
//! non-2xx.

use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{IndexError, IndexResult};

/// Inputs are batched at this size for every embeddings call.
pub const EMBED_BATCH_SIZE: usize = 10;

#[derive(Clone)]
pub struct EmbeddingClient {
    api_key: String,
    base_url: String,
    model: String,
    http: reqwest::Client,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingDatum>,
}

#[derive(Deserialize)]
struct EmbeddingDatum {
    embedding: Vec<f32>,
}

impl EmbeddingClient {
    pub fn new(api_key: String, base_url: String, model: String) -> Self {
        Self {
            api_key,
            base_url,
            model,
            http: reqwest::Client::new(),
        }
    }

    fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        let mut auth = HeaderValue::from_str(&format!("Bearer {}", self.api_key))
            .unwrap_or_else(|_| HeaderValue::from_static("Bearer invalid"));
        auth.set_sensitive(true);
        headers.insert(AUTHORIZATION, auth);
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers
    }

    /// Embed one batch of inputs, one vector per input in order. Aborts
    /// with [`IndexError::CountMismatch`] if the endpoint returns a
    /// different number of vectors than inputs sent.
    pub async fn embed_batch(&self, inputs: &[String]) -> IndexResult<Vec<Vec<f32>>> {
        if inputs.is_empty() {
            return Ok(Vec::new());
        }

        let url = format!("{}/embeddings", self.base_url.trim_end_matches('/'));
        debug!(model = %self.model, count = inputs.len(), "embeddings request");

        let response = self
            .http
            .post(&url)
            .headers(self.headers())
            .json(&EmbeddingRequest {
                model: &self.model,
                input: inputs,
            })
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IndexError::Status(response.status()));
        }

        let parsed: EmbeddingResponse = response.json().await?;
        if parsed.data.len() != inputs.len() {
            return Err(IndexError::CountMismatch {
                expected: inputs.len(),
                got: parsed.data.len(),
            });
        }

        Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
    }
}
