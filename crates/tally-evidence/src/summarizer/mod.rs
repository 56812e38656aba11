//! Accounting summaries from evidence emails
//!
//! Two stages that can be tested without a model: [`SummaryPromptBuilder`]
//! renders the leading emails into one prompt, and [`parse_summary`] reads
//! the labeled fields back out of the answer.

mod parser;
mod prompt;

pub use parser::{parse_summary, LABELS};
pub use prompt::SummaryPromptBuilder;

use crate::config::EvidenceConfig;
use crate::llm::generate;
use std::fmt::Display;
use std::sync::Arc;
use tally_domain::traits::LlmProvider;
use tally_domain::{AccountingSummary, EmailEvidence, ModelSettings};
use tracing::{debug, warn};

/// LLM pass over the top evidence emails
pub struct Summarizer<L> {
    llm: Arc<L>,
    settings: ModelSettings,
    config: EvidenceConfig,
}

impl<L> Summarizer<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
{
    /// Create a summarizer with explicit model settings
    pub fn new(llm: Arc<L>, settings: ModelSettings, config: EvidenceConfig) -> Self {
        Self {
            llm,
            settings,
            config,
        }
    }

    /// Summarize the leading emails, in the order given
    ///
    /// Returns `None` when there are no emails or the model call fails.
    pub async fn summarize(
        &self,
        emails: &[EmailEvidence],
        company: &str,
        amount: Option<f64>,
    ) -> Option<AccountingSummary> {
        if emails.is_empty() {
            return None;
        }

        let leading = &emails[..emails.len().min(self.config.summary_email_count)];
        let prompt = SummaryPromptBuilder::new(company, amount)
            .with_emails(leading)
            .with_body_chars(self.config.summary_body_chars)
            .build();
        debug!(emails = leading.len(), prompt_chars = prompt.len(), "Summarizing evidence");

        match generate(&self.llm, prompt, &self.settings).await {
            Ok(response) => Some(parse_summary(&response)),
            Err(e) => {
                warn!(model = %self.settings.model, error = %e, "Summary LLM call failed");
                None
            }
        }
    }
}
