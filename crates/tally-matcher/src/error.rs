//! Error types for the matcher

use thiserror::Error;

/// Errors a search strategy can report
///
/// The orchestrator never propagates these; a failing strategy contributes
/// zero candidates and the failure is recorded in the outcome's report.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StrategyError {
    /// Search backend failed or timed out
    #[error("Backend error: {0}")]
    Backend(String),

    /// Query text could not be embedded
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Blocking task panicked or was cancelled
    #[error("Task join error: {0}")]
    Join(String),
}
