//! Email evidence search
//!
//! Fallback ranking of emails around the payment date when no historical
//! match qualifies. Two rankers share the scoring contract in [`scoring`]:
//!
//! - [`CachedCorpusRanker`]: embeds `"{company} payment {amount}"` and asks
//!   an embedding-indexed store for the nearest messages in the window
//! - [`LiveMailboxRanker`]: runs a keyword query against a mailbox API,
//!   which reports no similarity
//!
//! [`EmailEvidenceSearch`] validates the request, picks the ranker's default
//! window and degrades collaborator failures to an empty result.

pub mod scoring;

use crate::config::EvidenceConfig;
use crate::error::EvidenceError;
use async_trait::async_trait;
use chrono::NaiveDate;
use scoring::{to_evidence, ScoreWeights, SideFields, Signals, CACHED_WEIGHTS, LIVE_WEIGHTS};
use std::fmt::{self, Display};
use std::sync::Arc;
use tally_domain::traits::EmbeddingModel;
use tally_domain::{DateRange, EmailEvidence, EmailMessage};
use tally_store::EmailCorpus;
use tracing::{debug, info, warn};

/// Embedding-indexed message query
#[async_trait]
pub trait EmailIndex: Send + Sync {
    /// Most similar messages received inside `range`, with similarity set
    async fn similar_messages(
        &self,
        embedding: &[f32],
        range: &DateRange,
        limit: usize,
    ) -> Result<Vec<EmailMessage>, EvidenceError>;
}

/// Live mailbox keyword query
#[async_trait]
pub trait Mailbox: Send + Sync {
    /// Messages matching `query` received inside `range`
    async fn search_messages(
        &self,
        query: &str,
        range: &DateRange,
        limit: usize,
    ) -> Result<Vec<EmailMessage>, EvidenceError>;
}

#[async_trait]
impl EmailIndex for EmailCorpus {
    async fn similar_messages(
        &self,
        embedding: &[f32],
        range: &DateRange,
        limit: usize,
    ) -> Result<Vec<EmailMessage>, EvidenceError> {
        self.nearest(embedding, range, limit)
            .map_err(|e| EvidenceError::Backend(e.to_string()))
    }
}

#[async_trait]
impl Mailbox for EmailCorpus {
    async fn search_messages(
        &self,
        query: &str,
        range: &DateRange,
        limit: usize,
    ) -> Result<Vec<EmailMessage>, EvidenceError> {
        Ok(self.keyword_search(query, range, limit))
    }
}

#[async_trait]
impl<T: EmailIndex + ?Sized> EmailIndex for Arc<T> {
    async fn similar_messages(
        &self,
        embedding: &[f32],
        range: &DateRange,
        limit: usize,
    ) -> Result<Vec<EmailMessage>, EvidenceError> {
        (**self).similar_messages(embedding, range, limit).await
    }
}

#[async_trait]
impl<T: Mailbox + ?Sized> Mailbox for Arc<T> {
    async fn search_messages(
        &self,
        query: &str,
        range: &DateRange,
        limit: usize,
    ) -> Result<Vec<EmailMessage>, EvidenceError> {
        (**self).search_messages(query, range, limit).await
    }
}

/// Which kind of email collaborator a ranker reads
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvidenceSource {
    /// Cached, embedding-indexed corpus
    CachedCorpus,
    /// Live mailbox API
    LiveMailbox,
}

impl EvidenceSource {
    /// Stable snake_case label
    pub fn as_str(self) -> &'static str {
        match self {
            EvidenceSource::CachedCorpus => "cached_corpus",
            EvidenceSource::LiveMailbox => "live_mailbox",
        }
    }
}

impl fmt::Display for EvidenceSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated ranking request
#[derive(Debug, Clone, PartialEq)]
pub struct RankRequest {
    /// Non-empty company name
    pub company: String,
    /// Target amount, if known
    pub amount: Option<f64>,
    /// Received-date window
    pub range: DateRange,
}

/// Ranks emails for a payer
#[async_trait]
pub trait EmailRanker: Send + Sync {
    /// Collaborator kind
    fn source(&self) -> EvidenceSource;

    /// Default `(days_before, days_after)` window
    fn default_window(&self) -> (u32, u32);

    /// Fetch, score and rank messages, best first
    async fn rank(&self, request: &RankRequest) -> Result<Vec<EmailEvidence>, EvidenceError>;
}

fn score_and_rank(
    messages: Vec<EmailMessage>,
    request: &RankRequest,
    weights: &ScoreWeights,
    config: &EvidenceConfig,
) -> Vec<EmailEvidence> {
    let mut ranked: Vec<EmailEvidence> = messages
        .into_iter()
        .map(|message| {
            let side_fields = SideFields::parse(&message);
            let score = Signals::detect(
                &message,
                &side_fields,
                &request.company,
                request.amount,
                config.amount_tolerance,
            )
            .score(weights);
            to_evidence(message, side_fields, score)
        })
        .collect();

    ranked.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
    ranked.truncate(config.result_limit);
    ranked
}

/// Ranks the cached corpus by similarity plus business-rule bonuses
pub struct CachedCorpusRanker<E, I> {
    embedder: Arc<E>,
    index: I,
    config: EvidenceConfig,
}

impl<E, I> CachedCorpusRanker<E, I>
where
    E: EmbeddingModel + Send + Sync + 'static,
    E::Error: Display,
    I: EmailIndex,
{
    /// Create a ranker over an embedding-indexed store
    pub fn new(embedder: Arc<E>, index: I, config: EvidenceConfig) -> Self {
        Self {
            embedder,
            index,
            config,
        }
    }

    /// Text embedded for the similarity query
    pub fn query_text(company: &str, amount: Option<f64>) -> String {
        match amount {
            Some(amount) => format!("{} payment {:.2}", company, amount),
            None => format!("{} payment", company),
        }
    }

    async fn embed(&self, text: String) -> Result<Vec<f32>, EvidenceError> {
        let embedder = Arc::clone(&self.embedder);
        tokio::task::spawn_blocking(move || {
            embedder
                .embed(&text)
                .map_err(|e| EvidenceError::Embedding(e.to_string()))
        })
        .await
        .map_err(|e| EvidenceError::Embedding(format!("Task join error: {}", e)))?
    }
}

#[async_trait]
impl<E, I> EmailRanker for CachedCorpusRanker<E, I>
where
    E: EmbeddingModel + Send + Sync + 'static,
    E::Error: Display,
    I: EmailIndex,
{
    fn source(&self) -> EvidenceSource {
        EvidenceSource::CachedCorpus
    }

    fn default_window(&self) -> (u32, u32) {
        (self.config.cached_days_before, self.config.cached_days_after)
    }

    async fn rank(&self, request: &RankRequest) -> Result<Vec<EmailEvidence>, EvidenceError> {
        let embedding = self
            .embed(Self::query_text(&request.company, request.amount))
            .await?;
        let messages = self
            .index
            .similar_messages(&embedding, &request.range, self.config.candidate_pool)
            .await?;
        debug!(fetched = messages.len(), "Cached corpus query complete");

        Ok(score_and_rank(messages, request, &CACHED_WEIGHTS, &self.config))
    }
}

/// Ranks live mailbox keyword hits by business-rule bonuses only
pub struct LiveMailboxRanker<M> {
    mailbox: M,
    config: EvidenceConfig,
}

impl<M: Mailbox> LiveMailboxRanker<M> {
    /// Create a ranker over a mailbox
    pub fn new(mailbox: M, config: EvidenceConfig) -> Self {
        Self { mailbox, config }
    }

    /// Mailbox query: the quoted company name and the subject filter
    pub fn query(&self, company: &str) -> String {
        format!(
            "\"{}\" AND subject:{}",
            company.replace('"', ""),
            self.config.live_subject_filter
        )
    }
}

#[async_trait]
impl<M: Mailbox> EmailRanker for LiveMailboxRanker<M> {
    fn source(&self) -> EvidenceSource {
        EvidenceSource::LiveMailbox
    }

    fn default_window(&self) -> (u32, u32) {
        (self.config.live_days_before, self.config.live_days_after)
    }

    async fn rank(&self, request: &RankRequest) -> Result<Vec<EmailEvidence>, EvidenceError> {
        let query = self.query(&request.company);
        let messages = self
            .mailbox
            .search_messages(&query, &request.range, self.config.candidate_pool)
            .await?;
        debug!(fetched = messages.len(), query = %query, "Mailbox query complete");

        Ok(score_and_rank(messages, request, &LIVE_WEIGHTS, &self.config))
    }
}

/// Input to an email evidence search
#[derive(Debug, Clone, PartialEq)]
pub struct EmailQuery {
    /// Payer name; required
    pub company_name: Option<String>,
    /// Payment amount, if known
    pub amount: Option<f64>,
    /// Center of the received-date window
    pub center_date: NaiveDate,
    /// Overrides the ranker's default days before
    pub days_before: Option<u32>,
    /// Overrides the ranker's default days after
    pub days_after: Option<u32>,
}

impl EmailQuery {
    /// Query for a company around a date, default window
    pub fn new(company_name: impl Into<String>, center_date: NaiveDate) -> Self {
        Self {
            company_name: Some(company_name.into()),
            amount: None,
            center_date,
            days_before: None,
            days_after: None,
        }
    }

    /// Set the target amount
    pub fn with_amount(mut self, amount: f64) -> Self {
        self.amount = Some(amount);
        self
    }

    /// Override the window
    pub fn with_window(mut self, days_before: u32, days_after: u32) -> Self {
        self.days_before = Some(days_before);
        self.days_after = Some(days_after);
        self
    }

    /// Trimmed company name, `None` when missing or blank
    pub fn company(&self) -> Option<&str> {
        self.company_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
    }
}

/// Entry point for email evidence
pub struct EmailEvidenceSearch {
    ranker: Arc<dyn EmailRanker>,
}

impl EmailEvidenceSearch {
    /// Create a search over one ranker
    pub fn new(ranker: Arc<dyn EmailRanker>) -> Self {
        Self { ranker }
    }

    /// Collaborator kind of the underlying ranker
    pub fn source(&self) -> EvidenceSource {
        self.ranker.source()
    }

    /// Rank emails supporting a payment
    ///
    /// A missing or blank company name is a precondition failure. Collaborator
    /// and embedding failures are logged and yield an empty list.
    pub async fn search(&self, query: &EmailQuery) -> Result<Vec<EmailEvidence>, EvidenceError> {
        let company = query.company().ok_or(EvidenceError::MissingCompanyName)?;

        let (default_before, default_after) = self.ranker.default_window();
        let range = DateRange::around(
            query.center_date,
            query.days_before.unwrap_or(default_before),
            query.days_after.unwrap_or(default_after),
        );

        let request = RankRequest {
            company: company.to_string(),
            amount: query.amount,
            range,
        };

        match self.ranker.rank(&request).await {
            Ok(evidence) => {
                info!(
                    source = %self.ranker.source(),
                    company = %request.company,
                    results = evidence.len(),
                    "Ranked email evidence"
                );
                Ok(evidence)
            }
            Err(e) => {
                warn!(source = %self.ranker.source(), error = %e, "Email evidence search failed");
                Ok(Vec::new())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cached_query_text() {
        assert_eq!(
            CachedCorpusRanker::<tally_store::MockEmbeddingModel, EmailCorpus>::query_text("ACME", Some(1250.0)),
            "ACME payment 1250.00"
        );
        assert_eq!(
            CachedCorpusRanker::<tally_store::MockEmbeddingModel, EmailCorpus>::query_text("ACME", None),
            "ACME payment"
        );
    }

    #[test]
    fn test_query_company_is_trimmed() {
        let date = NaiveDate::from_ymd_opt(2024, 3, 10).unwrap();
        assert_eq!(EmailQuery::new("  ACME LLC \t", date).company(), Some("ACME LLC"));
        assert_eq!(EmailQuery::new(" \n ", date).company(), None);

        let mut query = EmailQuery::new("ACME", date);
        query.company_name = None;
        assert_eq!(query.company(), None);
    }

    #[test]
    fn test_live_query() {
        let ranker = LiveMailboxRanker::new(EmailCorpus::new(Vec::new()), EvidenceConfig::default());
        assert_eq!(ranker.query("ACME \"LLC\""), "\"ACME LLC\" AND subject:payment");
    }

    #[test]
    fn test_default_windows() {
        let config = EvidenceConfig::default();
        let live = LiveMailboxRanker::new(EmailCorpus::new(Vec::new()), config.clone());
        let cached = CachedCorpusRanker::new(
            Arc::new(tally_store::MockEmbeddingModel::new(16)),
            EmailCorpus::new(Vec::new()),
            config,
        );
        assert_eq!(live.default_window(), (3, 3));
        assert_eq!(cached.default_window(), (7, 7));
    }
}
