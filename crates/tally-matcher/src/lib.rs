//! Tally Matcher
//!
//! Turns a raw payment note into per-line ranked historical matches.
//!
//! # Pipeline
//!
//! 1. [`LineClassifier`] splits the note into typed lines and decides which
//!    ones carry search text.
//! 2. [`MatchOrchestrator`] sends each line's text to every enabled
//!    [`SearchStrategy`] concurrently, then merges by id (highest confidence
//!    wins), drops candidates below the threshold and sorts.
//!
//! Strategies reach their search engines through [`TextSearchBackend`] and
//! [`VectorSearchBackend`]; the in-memory history corpus implements both.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tally_matcher::{FuzzyTextStrategy, LineClassifier, MatchOrchestrator, SearchStrategy};
//! use tally_store::HistoryCorpus;
//!
//! # async fn example(corpus: HistoryCorpus) {
//! let strategies: Vec<Arc<dyn SearchStrategy>> =
//!     vec![Arc::new(FuzzyTextStrategy::new(Arc::new(corpus)))];
//! let orchestrator = MatchOrchestrator::new(strategies);
//!
//! let lines = LineClassifier::new().classify("BO:1 BO1:ACME LLC\nTRID:42");
//! for line_match in orchestrator.match_lines(&lines).await {
//!     if let Some(best) = line_match.outcome.best() {
//!         println!("{} -> {}", line_match.line.raw_text, best.external_id);
//!     }
//! }
//! # }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod classifier;
pub mod config;
pub mod error;
pub mod orchestrator;
pub mod strategy;
pub mod types;

pub use backend::{CorpusHit, TextSearchBackend, VectorSearchBackend};
pub use classifier::LineClassifier;
pub use config::MatchConfig;
pub use error::StrategyError;
pub use orchestrator::MatchOrchestrator;
pub use strategy::{EmbeddingStrategy, FuzzyTextStrategy, SearchStrategy};
pub use types::{LineMatch, MatchOutcome, StrategyReport};
