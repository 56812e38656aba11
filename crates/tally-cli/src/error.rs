//! Error types for the CLI application.

use thiserror::Error;

/// Result type alias for CLI operations.
pub type Result<T> = std::result::Result<T, CliError>;

/// CLI-specific errors.
#[derive(Debug, Error)]
pub enum CliError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Fixture or corpus loading error
    #[error("Corpus error: {0}")]
    Store(#[from] tally_store::StoreError),

    /// LLM or embedding provider setup error
    #[error("Provider error: {0}")]
    Llm(#[from] tally_llm::LlmError),

    /// Missing required pipeline input
    #[error("{0}")]
    Evidence(#[from] tally_evidence::EvidenceError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// TOML parsing error
    #[error("TOML parsing error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Background task failed
    #[error("Task failed: {0}")]
    Task(String),
}
