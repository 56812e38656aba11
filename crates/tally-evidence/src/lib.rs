//! Tally Evidence
//!
//! Fallback evidence for payment notes that produced no qualifying
//! historical match:
//!
//! 1. [`CompanyNameExtractor`] recovers the payer name (pattern rule, then
//!    language model).
//! 2. [`EmailEvidenceSearch`] ranks emails received around the payment date,
//!    from a cached embedding-indexed corpus or a live mailbox.
//! 3. [`Summarizer`] asks a language model for the posting fields mentioned
//!    in the top emails.
//!
//! Backend failures degrade to absent results and are logged; only missing
//! required input is returned as an error.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod company;
pub mod config;
pub mod email;
pub mod error;
mod llm;
pub mod summarizer;

pub use company::{CompanyNameExtractor, CompanyNameStrategy, ExtractionStep, LlmStrategy, PatternStrategy};
pub use config::EvidenceConfig;
pub use email::{
    CachedCorpusRanker, EmailEvidenceSearch, EmailIndex, EmailQuery, EmailRanker, EvidenceSource,
    LiveMailboxRanker, Mailbox, RankRequest,
};
pub use error::EvidenceError;
pub use summarizer::{parse_summary, Summarizer, SummaryPromptBuilder};
