//! Trait definitions for external interactions
//!
//! These traits define the boundaries between the pipeline and the
//! capability providers it consumes. Implementations live in other crates.

use crate::ModelSettings;

/// Trait for LLM provider operations
///
/// Implemented by the infrastructure layer (tally-llm)
pub trait LlmProvider {
    /// Error type for LLM operations
    type Error;

    /// Generate a text completion with the given model settings
    fn generate(&self, prompt: &str, settings: &ModelSettings) -> Result<String, Self::Error>;
}

/// Trait for text embedding models
///
/// Implemented by tally-store (local, deterministic) and tally-llm
/// (external provider)
pub trait EmbeddingModel {
    /// Error type for embedding operations
    type Error;

    /// Generate an embedding vector for the given text
    fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error>;

    /// Get the dimension of embeddings produced by this model
    fn dimension(&self) -> usize;
}
