//! Configuration for evidence gathering

use crate::error::EvidenceError;
use serde::{Deserialize, Serialize};

/// Configuration for email evidence search and summarization
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvidenceConfig {
    /// Days before the center date searched in the cached corpus
    pub cached_days_before: u32,

    /// Days after the center date searched in the cached corpus
    pub cached_days_after: u32,

    /// Days before the center date searched in a live mailbox
    pub live_days_before: u32,

    /// Days after the center date searched in a live mailbox
    pub live_days_after: u32,

    /// Messages fetched from a collaborator before rescoring
    pub candidate_pool: usize,

    /// Ranked evidence returned after rescoring
    pub result_limit: usize,

    /// Leading ranked emails handed to the summarizer
    pub summary_email_count: usize,

    /// Body characters kept per email in the summary prompt
    pub summary_body_chars: usize,

    /// Relative tolerance for extracted-amount matches
    pub amount_tolerance: f64,

    /// Subject keyword required by the live mailbox query
    pub live_subject_filter: String,
}

impl EvidenceConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), EvidenceError> {
        if self.candidate_pool == 0 {
            return Err(EvidenceError::Config(
                "candidate_pool must be greater than 0".to_string(),
            ));
        }
        if self.result_limit == 0 {
            return Err(EvidenceError::Config(
                "result_limit must be greater than 0".to_string(),
            ));
        }
        if self.result_limit > self.candidate_pool {
            return Err(EvidenceError::Config(
                "result_limit cannot exceed candidate_pool".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.amount_tolerance) {
            return Err(EvidenceError::Config(format!(
                "amount_tolerance {} out of range [0, 1)",
                self.amount_tolerance
            )));
        }
        if self.live_subject_filter.trim().is_empty() {
            return Err(EvidenceError::Config(
                "live_subject_filter must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// Wider windows and a deeper candidate pool
    pub fn thorough() -> Self {
        Self {
            cached_days_before: 14,
            cached_days_after: 14,
            live_days_before: 7,
            live_days_after: 7,
            candidate_pool: 50,
            ..Self::default()
        }
    }

    /// Smaller pools and a shorter summary prompt
    pub fn quick() -> Self {
        Self {
            candidate_pool: 10,
            result_limit: 5,
            summary_email_count: 3,
            summary_body_chars: 1000,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, EvidenceError> {
        toml::from_str(toml_str)
            .map_err(|e| EvidenceError::Config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, EvidenceError> {
        toml::to_string_pretty(self)
            .map_err(|e| EvidenceError::Config(format!("Failed to serialize to TOML: {}", e)))
    }
}

impl Default for EvidenceConfig {
    fn default() -> Self {
        Self {
            cached_days_before: 7,
            cached_days_after: 7,
            live_days_before: 3,
            live_days_after: 3,
            candidate_pool: 25,
            result_limit: 10,
            summary_email_count: 5,
            summary_body_chars: 2000,
            amount_tolerance: 0.01,
            live_subject_filter: "payment".to_string(),
        }
    }
}
