//! Tally Domain Layer
//!
//! This crate contains the value objects and capability traits shared by every
//! other Tally crate. It carries no infrastructure: fuzzy search engines,
//! vector indexes, embedding models and language models are all reached
//! through the traits defined here or in the matcher/evidence crates.
//!
//! ## Key Concepts
//!
//! - **ParsedLine**: One physical line of a bank-statement payment note, typed
//! - **MatchCandidate**: A proposed historical posting with normalized confidence
//! - **CompanyExtraction**: Payer name recovered when no candidate qualifies
//! - **EmailEvidence**: A ranked email supporting the payment
//! - **AccountingSummary**: Posting fields an LLM read out of the evidence
//!
//! ## Architecture
//!
//! - Pure value objects, immutable once produced by the pipeline
//! - Trait definitions for synchronous external capabilities
//! - Persistence and reviewer selection live outside this workspace

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod candidate;
pub mod company;
pub mod confidence;
pub mod email;
pub mod line;
pub mod settings;
pub mod summary;
pub mod traits;

// Re-exports for convenience
pub use candidate::{MatchCandidate, StrategyKind};
pub use company::{CompanyExtraction, CompanySource};
pub use confidence::{similarity_to_confidence, MATCH_THRESHOLD};
pub use email::{DateRange, EmailEvidence, EmailMessage};
pub use line::{LineType, ParsedLine};
pub use settings::ModelSettings;
pub use summary::AccountingSummary;
