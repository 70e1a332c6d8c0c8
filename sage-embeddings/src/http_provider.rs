//! HTTP embedding provider.
//!
//! Blocking client for an OpenAI-compatible `/embeddings` endpoint.
//! Transport failures are retried a few times with a fixed pause; a
//! well-formed error response or a vector-count mismatch is not retried,
//! the server will not change its mind.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use sage_core::errors::{EmbeddingError, SageResult};
use sage_core::traits::EmbeddingProvider;

const TRANSPORT_RETRIES: usize = 3;
const RETRY_PAUSE: Duration = Duration::from_secs(1);

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
    index: usize,
    embedding: Vec<f32>,
}

/// Embedding provider backed by a remote HTTP service.
pub struct HttpProvider {
    client: reqwest::blocking::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
    dimensions: usize,
}

impl HttpProvider {
    pub fn new(endpoint: &str, model: &str, api_key: Option<&str>, dimensions: usize) -> Self {
        Self {
            client: reqwest::blocking::Client::new(),
            endpoint: endpoint.to_string(),
            model: model.to_string(),
            api_key: api_key.map(str::to_string),
            dimensions,
        }
    }

    fn request_once(&self, texts: &[String]) -> Result<EmbeddingResponse, String> {
        let mut request = self.client.post(&self.endpoint).json(&EmbeddingRequest {
            model: &self.model,
            input: texts,
        });
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }
        let response = request.send().map_err(|e| e.to_string())?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(format!("status {status}: {body}"));
        }
        response.json::<EmbeddingResponse>().map_err(|e| e.to_string())
    }
}

impl EmbeddingProvider for HttpProvider {
    fn embed_batch(&self, texts: &[String]) -> SageResult<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }

        let mut last_error = String::new();
        for attempt in 1..=TRANSPORT_RETRIES {
            match self.request_once(texts) {
                Ok(response) => {
                    if response.data.len() != texts.len() {
                        return Err(EmbeddingError::CountMismatch {
                            expected: texts.len(),
                            got: response.data.len(),
                        }
                        .into());
                    }
                    // The API may return data out of order; `index` is
                    // authoritative.
                    let mut vectors: Vec<Vec<f32>> = vec![Vec::new(); texts.len()];
                    for datum in response.data {
                        if datum.index >= texts.len() {
                            return Err(EmbeddingError::MalformedResponse {
                                reason: format!("index {} out of range", datum.index),
                            }
                            .into());
                        }
                        vectors[datum.index] = datum.embedding;
                    }
                    debug!(count = texts.len(), model = %self.model, "embeddings fetched");
                    return Ok(vectors);
                }
                Err(reason) => {
                    warn!(attempt, error = %reason, "embedding request failed");
                    last_error = reason;
                    if attempt < TRANSPORT_RETRIES {
                        std::thread::sleep(RETRY_PAUSE);
                    }
                }
            }
        }

        Err(EmbeddingError::RetriesExhausted {
            attempts: TRANSPORT_RETRIES,
            reason: last_error,
        }
        .into())
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn name(&self) -> &str {
        &self.model
    }
}
