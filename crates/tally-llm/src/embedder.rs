//! External embedding provider
//!
//! Calls Ollama's embeddings endpoint. Used by the external-embedding
//! search strategy, whose vectors come from a model hosted outside the
//! process rather than from the local `MockEmbeddingModel`.

use crate::LlmError;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tally_domain::traits::EmbeddingModel;
use tracing::debug;

/// Default embedding model
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

/// Ollama embedding client
pub struct OllamaEmbedder {
    endpoint: String,
    model: String,
    dimension: usize,
    client: reqwest::Client,
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    embedding: Vec<f32>,
}

impl OllamaEmbedder {
    /// Create an embedder for `model`, expecting vectors of `dimension`
    pub fn new(
        endpoint: impl Into<String>,
        model: impl Into<String>,
        dimension: usize,
    ) -> Result<Self, LlmError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(crate::ollama::DEFAULT_TIMEOUT_SECS))
            .build()
            .map_err(|e| LlmError::Communication(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            model: model.into(),
            dimension,
            client,
        })
    }

    /// Embed text through the HTTP API
    pub async fn embed_async(&self, text: &str) -> Result<Vec<f32>, LlmError> {
        if text.trim().is_empty() {
            return Err(LlmError::Other("Empty text cannot be embedded".to_string()));
        }

        let url = format!("{}/api/embeddings", self.endpoint);
        debug!(model = %self.model, "Ollama embedding request");

        let response = self
            .client
            .post(&url)
            .json(&EmbeddingRequest {
                model: &self.model,
                prompt: text,
            })
            .send()
            .await
            .map_err(|e| LlmError::Communication(format!("Request failed: {}", e)))?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(LlmError::ModelNotAvailable(self.model.clone()));
        }
        if !response.status().is_success() {
            return Err(LlmError::Communication(format!("HTTP {}", response.status())));
        }

        let body: EmbeddingResponse = response
            .json()
            .await
            .map_err(|e| LlmError::InvalidResponse(format!("Failed to parse embedding: {}", e)))?;

        if body.embedding.len() != self.dimension {
            return Err(LlmError::InvalidResponse(format!(
                "Embedding dimension {} does not match expected {}",
                body.embedding.len(),
                self.dimension
            )));
        }

        Ok(body.embedding)
    }
}

impl EmbeddingModel for OllamaEmbedder {
    type Error = LlmError;

    fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        crate::block_on(self.embed_async(text))
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}
