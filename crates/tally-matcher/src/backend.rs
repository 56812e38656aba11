//! Search backend capabilities
//!
//! Strategies do not own a search engine. They reach one through these
//! traits; the in-memory [`HistoryCorpus`] implements both.

use crate::error::StrategyError;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tally_store::{HistoryCorpus, ScoredRecord};

/// One raw hit from a search backend
#[derive(Debug, Clone, PartialEq)]
pub struct CorpusHit {
    /// Record identifier
    pub id: String,
    /// Display text of the record
    pub display_text: String,
    /// Posting fields of the record
    pub posting_fields: BTreeMap<String, String>,
    /// Backend-native score in `[0, 1]`
    pub score: f64,
}

impl From<ScoredRecord> for CorpusHit {
    fn from(hit: ScoredRecord) -> Self {
        Self {
            id: hit.record.id,
            display_text: hit.record.text,
            posting_fields: hit.record.posting_fields,
            score: hit.score,
        }
    }
}

/// Full-text relevance search
#[async_trait]
pub trait TextSearchBackend: Send + Sync {
    /// Most relevant records for `text`, best first
    async fn search_text(&self, text: &str, limit: usize) -> Result<Vec<CorpusHit>, StrategyError>;
}

/// Nearest-neighbour search over embeddings
#[async_trait]
pub trait VectorSearchBackend: Send + Sync {
    /// Nearest records to `embedding`, most similar first
    async fn search_vector(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<CorpusHit>, StrategyError>;
}

#[async_trait]
impl TextSearchBackend for HistoryCorpus {
    async fn search_text(&self, text: &str, limit: usize) -> Result<Vec<CorpusHit>, StrategyError> {
        Ok(self
            .text_search(text, limit)
            .into_iter()
            .map(CorpusHit::from)
            .collect())
    }
}

#[async_trait]
impl VectorSearchBackend for HistoryCorpus {
    async fn search_vector(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<CorpusHit>, StrategyError> {
        self.vector_search(embedding, limit)
            .map(|hits| hits.into_iter().map(CorpusHit::from).collect())
            .map_err(|e| StrategyError::Backend(e.to_string()))
    }
}

#[async_trait]
impl<T: TextSearchBackend + ?Sized> TextSearchBackend for Arc<T> {
    async fn search_text(&self, text: &str, limit: usize) -> Result<Vec<CorpusHit>, StrategyError> {
        (**self).search_text(text, limit).await
    }
}

#[async_trait]
impl<T: VectorSearchBackend + ?Sized> VectorSearchBackend for Arc<T> {
    async fn search_vector(
        &self,
        embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<CorpusHit>, StrategyError> {
        (**self).search_vector(embedding, limit).await
    }
}
