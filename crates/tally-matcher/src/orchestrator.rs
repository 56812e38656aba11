//! Match orchestration
//!
//! Fans a line's search text out to every enabled strategy concurrently,
//! waits for all of them to settle, then merges, dedupes, filters and ranks.

use crate::config::MatchConfig;
use crate::strategy::SearchStrategy;
use crate::types::{LineMatch, MatchOutcome, StrategyReport};
use futures::future::join_all;
use std::collections::HashMap;
use std::sync::Arc;
use tally_domain::{MatchCandidate, ParsedLine};
use tracing::{debug, info, warn};

/// Dispatches search text to strategies and ranks the union
pub struct MatchOrchestrator {
    strategies: Vec<Arc<dyn SearchStrategy>>,
    config: MatchConfig,
}

impl MatchOrchestrator {
    /// Create an orchestrator with the default configuration
    pub fn new(strategies: Vec<Arc<dyn SearchStrategy>>) -> Self {
        Self::with_config(strategies, MatchConfig::default())
    }

    /// Create an orchestrator with a custom configuration
    pub fn with_config(strategies: Vec<Arc<dyn SearchStrategy>>, config: MatchConfig) -> Self {
        Self { strategies, config }
    }

    /// Current configuration
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Match one line's search text
    ///
    /// Returns an empty outcome when there is no text or the trimmed text is
    /// shorter than `min_search_length`. A failing strategy contributes zero
    /// candidates and never aborts the others.
    pub async fn match_text(&self, search_text: Option<&str>) -> MatchOutcome {
        let text = match search_text.map(str::trim) {
            Some(text) if text.chars().count() >= self.config.min_search_length => text,
            _ => return MatchOutcome::default(),
        };

        let enabled: Vec<&Arc<dyn SearchStrategy>> = self
            .strategies
            .iter()
            .filter(|strategy| self.config.is_enabled(strategy.kind()))
            .collect();

        let limit = self.config.per_strategy_limit;
        let results = join_all(enabled.iter().map(|strategy| strategy.search(text, limit))).await;

        let mut reports = Vec::with_capacity(results.len());
        let mut batches = Vec::with_capacity(results.len());
        for (strategy, result) in enabled.iter().zip(results) {
            let kind = strategy.kind();
            match result {
                Ok(mut candidates) => {
                    candidates.truncate(limit);
                    reports.push(StrategyReport {
                        kind,
                        hits: candidates.len(),
                        error: None,
                    });
                    batches.push(candidates);
                }
                Err(e) => {
                    warn!(strategy = %kind, error = %e, "Strategy failed, continuing without it");
                    reports.push(StrategyReport {
                        kind,
                        hits: 0,
                        error: Some(e.to_string()),
                    });
                }
            }
        }

        let candidates = rank(merge(batches), self.config.confidence_threshold);
        debug!(
            strategies = reports.len(),
            qualifying = candidates.len(),
            "Line matched"
        );

        MatchOutcome {
            candidates,
            reports,
        }
    }

    /// Match every line of a note, one line at a time
    pub async fn match_lines(&self, lines: &[ParsedLine]) -> Vec<LineMatch> {
        let mut matches = Vec::with_capacity(lines.len());
        for line in lines {
            let outcome = self.match_text(line.search_text.as_deref()).await;
            matches.push(LineMatch {
                line: line.clone(),
                outcome,
            });
        }

        let matched = matches.iter().filter(|m| !m.outcome.is_empty()).count();
        info!(lines = lines.len(), matched, "Matched payment note");
        matches
    }
}

/// Union of all batches, one entry per id
///
/// A duplicate replaces the kept entry in place only when its confidence is
/// strictly higher, so first-seen position is preserved.
fn merge(batches: Vec<Vec<MatchCandidate>>) -> Vec<MatchCandidate> {
    let mut merged: Vec<MatchCandidate> = Vec::new();
    let mut positions: HashMap<String, usize> = HashMap::new();

    for candidate in batches.into_iter().flatten() {
        match positions.get(&candidate.external_id) {
            Some(&position) => {
                if candidate.confidence_percent > merged[position].confidence_percent {
                    merged[position] = candidate;
                }
            }
            None => {
                positions.insert(candidate.external_id.clone(), merged.len());
                merged.push(candidate);
            }
        }
    }

    merged
}

/// Drop below-threshold candidates and sort by confidence, stable
fn rank(mut candidates: Vec<MatchCandidate>, threshold: f64) -> Vec<MatchCandidate> {
    candidates.retain(|c| c.confidence_percent >= threshold);
    candidates.sort_by(|a, b| b.confidence_percent.total_cmp(&a.confidence_percent));
    candidates
}
