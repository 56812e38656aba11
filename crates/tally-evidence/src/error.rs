//! Error types for evidence gathering

use thiserror::Error;

/// Errors that can occur while gathering fallback evidence
///
/// Only the precondition variants reach callers of the public entry points;
/// backend variants are logged and degraded to empty results.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvidenceError {
    /// Email search was asked to run without a company name
    #[error("Company name is required for email evidence search")]
    MissingCompanyName,

    /// Company extraction was asked to run on an empty note
    #[error("Payment note text is empty")]
    MissingNoteText,

    /// Language model call failed
    #[error("LLM error: {0}")]
    Llm(String),

    /// Query text could not be embedded
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Email collaborator failed
    #[error("Backend error: {0}")]
    Backend(String),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),
}
