//! Company-name extraction
//!
//! An ordered chain of strategies; the first one that produces a name wins.
//! The pattern rule reads the `BO1:` segment of the buyer-order line. The
//! language model is consulted only when the note has no buyer-order line at
//! all: a buyer-order line whose name segment is unusable ends the chain.

use crate::error::EvidenceError;
use crate::llm::generate;
use async_trait::async_trait;
use regex::Regex;
use std::fmt::Display;
use std::sync::{Arc, LazyLock};
use tally_domain::traits::LlmProvider;
use tally_domain::{CompanyExtraction, CompanySource, LineType, ModelSettings, ParsedLine};
use tracing::{debug, info, warn};

/// Names shorter than this are rejected
pub const MIN_NAME_LENGTH: usize = 2;

/// Outcome of one strategy in the chain
#[derive(Debug, Clone, PartialEq)]
pub enum ExtractionStep {
    /// A name was found; the chain ends
    Found(CompanyExtraction),
    /// No name, and later strategies must not run
    Stop,
    /// No name; try the next strategy
    Continue,
}

/// One link in the company-name fallback chain
#[async_trait]
pub trait CompanyNameStrategy: Send + Sync {
    /// Source recorded on names this strategy finds
    fn source(&self) -> CompanySource;

    /// Try to extract a payer name
    async fn attempt(&self, raw_text: &str, lines: &[ParsedLine]) -> ExtractionStep;
}

static BO1_SEGMENT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)BO\s*1(?:\s*:|\s)\s*(.*?)\s*(?:BO\s*[23](?:\s*:|\s)|$)")
        .expect("valid BO1 pattern")
});

static BO_FRAGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)BO\s*\d?\s*:").expect("valid BO fragment pattern"));

/// Reads the `BO1:` segment of the first buyer-order line
#[derive(Debug, Clone, Copy, Default)]
pub struct PatternStrategy;

impl PatternStrategy {
    /// Extract and clean the `BO1:` segment of one line
    pub fn extract_segment(line: &str) -> Option<String> {
        let caps = BO1_SEGMENT.captures(line)?;
        let cleaned = BO_FRAGMENT.replace_all(&caps[1], " ");
        let cleaned = cleaned.split_whitespace().collect::<Vec<_>>().join(" ");
        let cleaned = cleaned
            .trim_matches(|c: char| c == ',' || c == ';' || c == '/' || c == '-' || c.is_whitespace())
            .to_string();

        (cleaned.chars().count() >= MIN_NAME_LENGTH).then_some(cleaned)
    }
}

#[async_trait]
impl CompanyNameStrategy for PatternStrategy {
    fn source(&self) -> CompanySource {
        CompanySource::Pattern
    }

    async fn attempt(&self, _raw_text: &str, lines: &[ParsedLine]) -> ExtractionStep {
        let Some(primary) = lines
            .iter()
            .find(|line| line.line_type == LineType::BuyerOrderPrimary)
        else {
            return ExtractionStep::Continue;
        };

        match Self::extract_segment(&primary.raw_text) {
            Some(name) => ExtractionStep::Found(CompanyExtraction::new(name, self.source())),
            None => {
                debug!(line = primary.line_number, "Buyer-order line has no usable BO1 segment");
                ExtractionStep::Stop
            }
        }
    }
}

const COMPANY_NAME_INSTRUCTIONS: &str = r#"You are reading a bank-statement payment note.
Identify the company or person that sent the payment.

Rules:
- Answer with the payer name only, on a single line
- Remove legal suffixes such as LLC, INC, CORP, LTD, GMBH
- Remove street addresses, cities, account numbers and reference codes
- If no payer can be identified, answer exactly NONE"#;

/// Asks a language model for the payer name
pub struct LlmStrategy<L> {
    llm: Arc<L>,
    settings: ModelSettings,
}

impl<L> LlmStrategy<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
{
    /// Create a strategy with explicit model settings
    pub fn new(llm: Arc<L>, settings: ModelSettings) -> Self {
        Self { llm, settings }
    }

    /// Build the prompt for a note
    pub fn build_prompt(raw_text: &str) -> String {
        format!(
            "{}\n\nPayment note:\n---\n{}\n---\n\nPayer name:",
            COMPANY_NAME_INSTRUCTIONS, raw_text
        )
    }

    /// Normalize a model answer; `None` for no-result answers
    pub fn parse_answer(answer: &str) -> Option<String> {
        let first_line = answer.trim().lines().next().unwrap_or_default();
        let name = first_line.trim().trim_matches(|c: char| c == '"' || c == '\'').trim();

        if name.eq_ignore_ascii_case("NONE") || name.chars().count() < MIN_NAME_LENGTH {
            None
        } else {
            Some(name.to_string())
        }
    }
}

#[async_trait]
impl<L> CompanyNameStrategy for LlmStrategy<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
{
    fn source(&self) -> CompanySource {
        CompanySource::Llm
    }

    async fn attempt(&self, raw_text: &str, _lines: &[ParsedLine]) -> ExtractionStep {
        let prompt = Self::build_prompt(raw_text);
        match generate(&self.llm, prompt, &self.settings).await {
            Ok(answer) => match Self::parse_answer(&answer) {
                Some(name) => ExtractionStep::Found(CompanyExtraction::new(name, self.source())),
                None => ExtractionStep::Continue,
            },
            Err(e) => {
                warn!(model = %self.settings.model, error = %e, "Company-name LLM call failed");
                ExtractionStep::Continue
            }
        }
    }
}

/// Ordered fallback chain producing a payer name
pub struct CompanyNameExtractor {
    strategies: Vec<Box<dyn CompanyNameStrategy>>,
}

impl CompanyNameExtractor {
    /// Create an extractor from an explicit strategy order
    pub fn new(strategies: Vec<Box<dyn CompanyNameStrategy>>) -> Self {
        Self { strategies }
    }

    /// Pattern rule only
    pub fn pattern_only() -> Self {
        Self::new(vec![Box::new(PatternStrategy)])
    }

    /// Pattern rule, then the language model
    pub fn with_llm<L>(llm: Arc<L>, settings: ModelSettings) -> Self
    where
        L: LlmProvider + Send + Sync + 'static,
        L::Error: Display,
    {
        Self::new(vec![
            Box::new(PatternStrategy),
            Box::new(LlmStrategy::new(llm, settings)),
        ])
    }

    /// Run the chain over a note and its classified lines
    ///
    /// Returns `Ok(None)` when no strategy produced a name. An empty note is
    /// a precondition failure.
    pub async fn extract(
        &self,
        raw_text: &str,
        lines: &[ParsedLine],
    ) -> Result<Option<CompanyExtraction>, EvidenceError> {
        if raw_text.trim().is_empty() {
            return Err(EvidenceError::MissingNoteText);
        }

        for strategy in &self.strategies {
            match strategy.attempt(raw_text, lines).await {
                ExtractionStep::Found(extraction) => {
                    info!(
                        source = extraction.source.as_str(),
                        name = %extraction.name,
                        "Extracted company name"
                    );
                    return Ok(Some(extraction));
                }
                ExtractionStep::Stop => return Ok(None),
                ExtractionStep::Continue => {}
            }
        }

        Ok(None)
    }
}
