//! Configuration for the match orchestrator

use serde::{Deserialize, Serialize};
use tally_domain::{StrategyKind, MATCH_THRESHOLD};

/// Configuration for line matching
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    /// Search text shorter than this (after trimming) is not searched
    pub min_search_length: usize,

    /// Maximum candidates taken from each strategy
    pub per_strategy_limit: usize,

    /// Candidates below this confidence are dropped
    pub confidence_threshold: f64,

    /// How many ranked candidates the caller keeps per line
    pub persist_top: usize,

    /// Strategies to dispatch to, by label (`fuzzy_text`, ...)
    pub enabled_strategies: Vec<String>,
}

impl MatchConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.per_strategy_limit == 0 {
            return Err("per_strategy_limit must be greater than 0".to_string());
        }
        if self.persist_top == 0 {
            return Err("persist_top must be greater than 0".to_string());
        }
        if !(0.0..=100.0).contains(&self.confidence_threshold) {
            return Err(format!(
                "confidence_threshold {} out of range [0, 100]",
                self.confidence_threshold
            ));
        }
        for label in &self.enabled_strategies {
            if StrategyKind::parse(label).is_none() {
                return Err(format!("unknown strategy '{}'", label));
            }
        }
        Ok(())
    }

    /// Whether a strategy kind is enabled
    pub fn is_enabled(&self, kind: StrategyKind) -> bool {
        self.enabled_strategies.iter().any(|label| label == kind.as_str())
    }

    /// Strict preset: only very confident candidates
    pub fn strict() -> Self {
        Self {
            confidence_threshold: 90.0,
            ..Self::default()
        }
    }

    /// Lenient preset: surfaces weaker candidates for review
    pub fn lenient() -> Self {
        Self {
            confidence_threshold: 80.0,
            ..Self::default()
        }
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, String> {
        toml::from_str(toml_str).map_err(|e| format!("Failed to parse TOML: {}", e))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, String> {
        toml::to_string_pretty(self).map_err(|e| format!("Failed to serialize to TOML: {}", e))
    }
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            min_search_length: 5,
            per_strategy_limit: 10,
            confidence_threshold: MATCH_THRESHOLD,
            persist_top: 3,
            enabled_strategies: StrategyKind::ALL
                .iter()
                .map(|kind| kind.as_str().to_string())
                .collect(),
        }
    }
}
