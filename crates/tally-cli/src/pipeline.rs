//! End-to-end reconciliation of one payment note.
//!
//! classify → match every line → (no qualifying candidate) company name →
//! email evidence → summary.

use crate::error::Result;
use chrono::NaiveDate;
use std::fmt::Display;
use tally_domain::line::{META_AMOUNT, META_DATE};
use tally_domain::traits::LlmProvider;
use tally_domain::{AccountingSummary, CompanyExtraction, EmailEvidence, MatchCandidate, ParsedLine};
use tally_evidence::{
    CompanyNameExtractor, EmailEvidenceSearch, EmailQuery, EvidenceError, EvidenceSource, Summarizer,
};
use tally_matcher::{LineClassifier, LineMatch, MatchOrchestrator};
use tracing::{info, warn};

/// Statement-level facts that the note itself may not carry.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct StatementContext {
    /// Posting or value date of the statement line
    pub date: Option<NaiveDate>,
    /// Payment amount
    pub amount: Option<f64>,
}

impl StatementContext {
    /// Fill missing values from the first line metadata that carries them.
    pub fn resolve(&self, lines: &[ParsedLine]) -> Self {
        let date = self.date.or_else(|| {
            lines
                .iter()
                .filter_map(|line| line.meta(META_DATE))
                .find_map(|token| NaiveDate::parse_from_str(token, "%Y%m%d").ok())
        });
        let amount = self.amount.or_else(|| {
            lines
                .iter()
                .filter_map(|line| line.meta(META_AMOUNT))
                .find_map(|token| token.parse::<f64>().ok())
        });
        Self { date, amount }
    }
}

/// Everything the pipeline produced for one note.
#[derive(Debug, Clone, PartialEq)]
pub struct ReconciliationReport {
    /// Every classified line with its match outcome
    pub lines: Vec<LineMatch>,
    /// Highest-confidence candidate across all lines
    pub best_match: Option<MatchCandidate>,
    /// Context after metadata fallback
    pub context: StatementContext,
    /// Payer name, when the fallback ran and found one
    pub company: Option<CompanyExtraction>,
    /// Email collaborator used by the fallback
    pub evidence_source: Option<EvidenceSource>,
    /// Ranked evidence emails
    pub evidence: Vec<EmailEvidence>,
    /// Posting fields read from the evidence
    pub summary: Option<AccountingSummary>,
}

impl ReconciliationReport {
    /// Whether the email fallback was entered
    pub fn used_fallback(&self) -> bool {
        self.best_match.is_none()
    }

    /// Top `n` candidates per line, as the caller would persist them
    pub fn persisted(&self, n: usize) -> Vec<(&ParsedLine, &[MatchCandidate])> {
        self.lines
            .iter()
            .filter(|m| !m.outcome.is_empty())
            .map(|m| (&m.line, m.outcome.top(n)))
            .collect()
    }
}

/// Runs the whole control flow for a payment note.
pub struct Reconciler<L> {
    classifier: LineClassifier,
    orchestrator: MatchOrchestrator,
    company_extractor: CompanyNameExtractor,
    email_search: EmailEvidenceSearch,
    summarizer: Summarizer<L>,
}

impl<L> Reconciler<L>
where
    L: LlmProvider + Send + Sync + 'static,
    L::Error: Display,
{
    /// Wire the pipeline stages together.
    pub fn new(
        orchestrator: MatchOrchestrator,
        company_extractor: CompanyNameExtractor,
        email_search: EmailEvidenceSearch,
        summarizer: Summarizer<L>,
    ) -> Self {
        Self {
            classifier: LineClassifier::new(),
            orchestrator,
            company_extractor,
            email_search,
            summarizer,
        }
    }

    /// Reconcile one note.
    ///
    /// Fails only on an empty note. Without a date the email fallback is
    /// skipped, since there is no window to search.
    pub async fn reconcile(&self, raw_text: &str, context: StatementContext) -> Result<ReconciliationReport> {
        if raw_text.trim().is_empty() {
            return Err(EvidenceError::MissingNoteText.into());
        }

        let parsed = self.classifier.classify(raw_text);
        let context = context.resolve(&parsed);
        let lines = self.orchestrator.match_lines(&parsed).await;

        let best_match = lines
            .iter()
            .filter_map(|m| m.outcome.best())
            .fold(None::<&MatchCandidate>, |best, candidate| match best {
                Some(b) if b.confidence_percent >= candidate.confidence_percent => Some(b),
                _ => Some(candidate),
            })
            .cloned();

        let mut report = ReconciliationReport {
            lines,
            best_match,
            context,
            company: None,
            evidence_source: None,
            evidence: Vec::new(),
            summary: None,
        };

        if let Some(best) = &report.best_match {
            info!(
                id = %best.external_id,
                confidence = best.confidence_percent,
                "Historical match found"
            );
            return Ok(report);
        }

        report.company = self.company_extractor.extract(raw_text, &parsed).await?;
        let Some(company) = report.company.as_ref().map(|c| c.name.clone()) else {
            info!("No match and no company name; nothing more to search");
            return Ok(report);
        };

        let Some(date) = context.date else {
            warn!(company = %company, "No statement date; skipping email evidence");
            return Ok(report);
        };

        let mut query = EmailQuery::new(company.clone(), date);
        query.amount = context.amount;

        report.evidence_source = Some(self.email_search.source());
        report.evidence = self.email_search.search(&query).await?;
        report.summary = self
            .summarizer
            .summarize(&report.evidence, &company, context.amount)
            .await;

        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_prefers_explicit_values() {
        let lines = LineClassifier::new().classify("DETAILS $1,250.00 VALUE 20240309");
        let explicit = StatementContext {
            date: NaiveDate::from_ymd_opt(2024, 1, 1),
            amount: Some(10.0),
        };
        assert_eq!(explicit.resolve(&lines), explicit);
    }

    #[test]
    fn test_context_falls_back_to_metadata() {
        let lines = LineClassifier::new().classify("BO1:ACME\nDETAILS $1,250.00 VALUE 20240309");
        let resolved = StatementContext::default().resolve(&lines);
        assert_eq!(resolved.date, NaiveDate::from_ymd_opt(2024, 3, 9));
        assert_eq!(resolved.amount, Some(1250.0));
    }

    #[test]
    fn test_invalid_date_token_ignored() {
        let lines = LineClassifier::new().classify("TRID:99999999");
        let resolved = StatementContext::default().resolve(&lines);
        assert_eq!(resolved.date, None);
    }
}
