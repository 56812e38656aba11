//! Tally Storage Layer
//!
//! Reference, in-memory capability providers for the matching pipeline.
//!
//! # Architecture
//!
//! - `HistoryCorpus`: historical postings with fuzzy text search and an HNSW
//!   vector index
//! - `EmailCorpus`: cached emails with date-windowed similarity and keyword
//!   queries
//! - `MockEmbeddingModel`: deterministic local embeddings
//!
//! Nothing here is persisted; fixtures are loaded from JSON on startup.
//!
//! # Examples
//!
//! ```
//! use tally_store::HistoryCorpus;
//!
//! let corpus = HistoryCorpus::from_json(r#"[{"id": "h1", "text": "BO1:ACME LLC"}]"#).unwrap();
//! let hits = corpus.text_search("BO1:ACME", 10);
//! assert_eq!(hits[0].record.id, "h1");
//! ```

#![warn(missing_docs)]

pub mod embedding;
pub mod emails;
pub mod history;
pub mod vector_index;

use thiserror::Error;

pub use embedding::{cosine_similarity, EmbeddingError, MockEmbeddingModel};
pub use emails::EmailCorpus;
pub use history::{HistoricalRecord, HistoryCorpus, ScoredRecord};
pub use vector_index::{VectorIndex, VectorIndexError};

/// Errors that can occur during storage operations
#[derive(Error, Debug)]
pub enum StoreError {
    /// Fixture file could not be read
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Fixture JSON is invalid
    #[error("Invalid fixture JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Two records share an id
    #[error("Duplicate record id: {0}")]
    DuplicateId(String),

    /// Embedding a record failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Vector index error
    #[error("Vector index error: {0}")]
    Index(#[from] VectorIndexError),

    /// Vector query before embeddings were built
    #[error("Corpus has not been indexed")]
    NotIndexed,
}
