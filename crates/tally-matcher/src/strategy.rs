//! Search strategies
//!
//! A strategy turns one line's search text into normalized-confidence
//! candidates. Backends report native scores in `[0, 1]`; every strategy maps
//! them through the same affine confidence curve so results from different
//! backends are comparable.

use crate::backend::{CorpusHit, TextSearchBackend, VectorSearchBackend};
use crate::error::StrategyError;
use async_trait::async_trait;
use std::fmt::Display;
use std::sync::Arc;
use tally_domain::traits::EmbeddingModel;
use tally_domain::{similarity_to_confidence, MatchCandidate, StrategyKind};
use tracing::debug;

/// A pluggable search backend family
#[async_trait]
pub trait SearchStrategy: Send + Sync {
    /// Which strategy family this is
    fn kind(&self) -> StrategyKind;

    /// Search for at most `limit` candidates
    async fn search(&self, text: &str, limit: usize) -> Result<Vec<MatchCandidate>, StrategyError>;
}

fn to_candidate(hit: CorpusHit, strategy: StrategyKind) -> MatchCandidate {
    MatchCandidate {
        confidence_percent: similarity_to_confidence(hit.score),
        external_id: hit.id,
        display_text: hit.display_text,
        strategy,
        posting_fields: hit.posting_fields,
        raw_score: hit.score,
    }
}

/// Fuzzy full-text relevance strategy
pub struct FuzzyTextStrategy<B> {
    backend: B,
}

impl<B: TextSearchBackend> FuzzyTextStrategy<B> {
    /// Create a strategy over a text backend
    pub fn new(backend: B) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl<B: TextSearchBackend> SearchStrategy for FuzzyTextStrategy<B> {
    fn kind(&self) -> StrategyKind {
        StrategyKind::FuzzyText
    }

    async fn search(&self, text: &str, limit: usize) -> Result<Vec<MatchCandidate>, StrategyError> {
        let hits = self.backend.search_text(text, limit).await?;
        debug!(hits = hits.len(), "Fuzzy text search complete");
        Ok(hits
            .into_iter()
            .take(limit)
            .map(|hit| to_candidate(hit, StrategyKind::FuzzyText))
            .collect())
    }
}

/// Embed-then-search strategy
///
/// Used for both the local vector-similarity strategy and the external
/// embedding provider; they differ only in which model embeds the query and
/// which index is searched. Embedding models are synchronous, so the query is
/// embedded on the blocking pool.
pub struct EmbeddingStrategy<E, B> {
    kind: StrategyKind,
    embedder: Arc<E>,
    backend: B,
}

impl<E, B> EmbeddingStrategy<E, B>
where
    E: EmbeddingModel + Send + Sync + 'static,
    E::Error: Display,
    B: VectorSearchBackend,
{
    /// Local embedding model against the historical vector index
    pub fn vector_similarity(embedder: Arc<E>, backend: B) -> Self {
        Self {
            kind: StrategyKind::VectorSimilarity,
            embedder,
            backend,
        }
    }

    /// Externally hosted embedding provider against its own index
    pub fn external_embedding(embedder: Arc<E>, backend: B) -> Self {
        Self {
            kind: StrategyKind::ExternalEmbedding,
            embedder,
            backend,
        }
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>, StrategyError> {
        let embedder = Arc::clone(&self.embedder);
        let text = text.to_string();
        tokio::task::spawn_blocking(move || {
            embedder
                .embed(&text)
                .map_err(|e| StrategyError::Embedding(e.to_string()))
        })
        .await
        .map_err(|e| StrategyError::Join(e.to_string()))?
    }
}

#[async_trait]
impl<E, B> SearchStrategy for EmbeddingStrategy<E, B>
where
    E: EmbeddingModel + Send + Sync + 'static,
    E::Error: Display,
    B: VectorSearchBackend,
{
    fn kind(&self) -> StrategyKind {
        self.kind
    }

    async fn search(&self, text: &str, limit: usize) -> Result<Vec<MatchCandidate>, StrategyError> {
        let embedding = self.embed(text).await?;
        let hits = self.backend.search_vector(&embedding, limit).await?;
        debug!(strategy = %self.kind, hits = hits.len(), "Vector search complete");
        Ok(hits
            .into_iter()
            .take(limit)
            .map(|hit| to_candidate(hit, self.kind))
            .collect())
    }
}
