//! Capability providers built from configuration.

use crate::config::Config;
use crate::error::{CliError, Result};
use std::fmt::Display;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tally_domain::traits::{EmbeddingModel, LlmProvider};
use tally_domain::ModelSettings;
use tally_evidence::{
    CachedCorpusRanker, CompanyNameExtractor, EmailEvidenceSearch, EmailRanker, LiveMailboxRanker,
    Summarizer,
};
use tally_llm::{LlmError, MockProvider, OllamaEmbedder, OllamaProvider};
use tally_matcher::{EmbeddingStrategy, FuzzyTextStrategy, MatchOrchestrator, SearchStrategy};
use tally_store::{EmailCorpus, EmbeddingError, HistoryCorpus, MockEmbeddingModel, StoreError};
use tracing::{info, warn};

/// Answer given by the mock model to summary prompts
const MOCK_SUMMARY: &str = "**Cost Center**: Not found\n\
**Company Code**: Not found\n\
**GL Account**: Not found\n\
**Invoice/Reference**: Not found\n\
**Notes**: Mock model in use; set [llm] use_mock = false for real summaries";

/// Language model selected by configuration.
pub enum LanguageModel {
    /// Deterministic offline responses
    Mock(MockProvider),
    /// Ollama over HTTP
    Ollama(OllamaProvider),
}

impl LanguageModel {
    /// Build from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        if config.llm.use_mock {
            let mut mock = MockProvider::new("NONE");
            mock.add_response_containing("**Cost Center**", MOCK_SUMMARY);
            Ok(LanguageModel::Mock(mock))
        } else {
            Ok(LanguageModel::Ollama(OllamaProvider::new(config.llm.endpoint.clone())?))
        }
    }
}

impl LlmProvider for LanguageModel {
    type Error = LlmError;

    fn generate(&self, prompt: &str, settings: &ModelSettings) -> std::result::Result<String, Self::Error> {
        match self {
            LanguageModel::Mock(mock) => mock.generate(prompt, settings),
            LanguageModel::Ollama(ollama) => ollama.generate(prompt, settings),
        }
    }
}

/// External embedding provider selected by configuration.
pub enum ExternalEmbedder {
    /// Hashed-trigram model, offline
    Mock(MockEmbeddingModel),
    /// Ollama embeddings endpoint
    Ollama(OllamaEmbedder),
}

impl EmbeddingModel for ExternalEmbedder {
    type Error = EmbeddingError;

    fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, Self::Error> {
        match self {
            ExternalEmbedder::Mock(mock) => mock.embed(text),
            ExternalEmbedder::Ollama(ollama) => ollama
                .embed(text)
                .map_err(|e| EmbeddingError::InferenceFailed(e.to_string())),
        }
    }

    fn dimension(&self) -> usize {
        match self {
            ExternalEmbedder::Mock(mock) => mock.dimension(),
            ExternalEmbedder::Ollama(ollama) => ollama.dimension(),
        }
    }
}

/// Loaded models and the cached email corpus.
pub struct Services {
    /// Cached emails indexed with the local model
    pub emails: Arc<EmailCorpus>,
    /// Local embedding model
    pub local_embedder: Arc<MockEmbeddingModel>,
    /// External embedding provider
    pub external_embedder: Arc<ExternalEmbedder>,
    /// Language model
    pub llm: Arc<LanguageModel>,
    /// Settings passed to every LLM call
    pub model_settings: ModelSettings,
}

/// Historical postings, indexed once per embedding model.
pub struct HistoryIndex {
    /// History indexed with the local model
    pub local: Arc<HistoryCorpus>,
    /// History indexed with the external model; unindexed if the provider failed
    pub external: Arc<HistoryCorpus>,
}

impl Services {
    /// Build every provider and load the email corpus.
    ///
    /// A missing email fixture gives an empty corpus.
    pub async fn load(config: &Config) -> Result<Self> {
        let local_embedder = Arc::new(MockEmbeddingModel::new(config.corpus.local_dimension));
        let external_embedder = Arc::new(if config.llm.use_mock {
            ExternalEmbedder::Mock(MockEmbeddingModel::new(config.corpus.external_dimension))
        } else {
            ExternalEmbedder::Ollama(OllamaEmbedder::new(
                config.llm.endpoint.clone(),
                config.llm.embedding_model.clone(),
                config.corpus.external_dimension,
            )?)
        });

        let emails = if config.corpus.emails.exists() {
            let corpus = EmailCorpus::from_path(&config.corpus.emails)?;
            index_emails(corpus, Arc::clone(&local_embedder)).await?
        } else {
            warn!(path = %config.corpus.emails.display(), "Email fixture not found, using an empty corpus");
            EmailCorpus::new(Vec::new())
        };

        info!(emails = emails.len(), mock = config.llm.use_mock, "Loaded providers");

        Ok(Self {
            emails: Arc::new(emails),
            local_embedder,
            external_embedder,
            llm: Arc::new(LanguageModel::from_config(config)?),
            model_settings: config.model_settings(),
        })
    }

    /// Load and index the history fixture.
    ///
    /// The history fixture is required. Embedding runs on the blocking pool
    /// since the HTTP embedder drives its own requests synchronously. If the
    /// external provider fails, its copy stays unindexed and the external
    /// strategy reports failures while the others keep working.
    pub async fn load_history(&self, config: &Config) -> Result<HistoryIndex> {
        let history_json = read_fixture(&config.corpus.history)?;

        let (local, outcome) = index_history(
            HistoryCorpus::from_json(&history_json)?,
            Arc::clone(&self.local_embedder),
        )
        .await?;
        outcome?;

        let (external, outcome) = index_history(
            HistoryCorpus::from_json(&history_json)?,
            Arc::clone(&self.external_embedder),
        )
        .await?;
        if let Err(e) = outcome {
            warn!(error = %e, "External embedding index unavailable");
        }

        info!(
            history = local.len(),
            external_indexed = external.is_indexed(),
            "Loaded history"
        );
        Ok(HistoryIndex {
            local: Arc::new(local),
            external: Arc::new(external),
        })
    }

    /// The three search strategies, in declaration order.
    pub fn strategies(&self, history: &HistoryIndex) -> Vec<Arc<dyn SearchStrategy>> {
        let fuzzy: Arc<dyn SearchStrategy> = Arc::new(FuzzyTextStrategy::new(Arc::clone(&history.local)));
        let vector: Arc<dyn SearchStrategy> = Arc::new(EmbeddingStrategy::vector_similarity(
            Arc::clone(&self.local_embedder),
            Arc::clone(&history.local),
        ));
        let external: Arc<dyn SearchStrategy> = Arc::new(EmbeddingStrategy::external_embedding(
            Arc::clone(&self.external_embedder),
            Arc::clone(&history.external),
        ));
        vec![fuzzy, vector, external]
    }

    /// Orchestrator over all strategies.
    pub fn orchestrator(&self, history: &HistoryIndex, config: &Config) -> MatchOrchestrator {
        MatchOrchestrator::with_config(self.strategies(history), config.matching.clone())
    }

    /// Pattern rule, then the configured language model.
    pub fn company_extractor(&self) -> CompanyNameExtractor {
        CompanyNameExtractor::with_llm(Arc::clone(&self.llm), self.model_settings.clone())
    }

    /// Email search over the cached corpus, or the mailbox stand-in when `live`.
    pub fn email_search(&self, config: &Config, live: bool) -> EmailEvidenceSearch {
        let ranker: Arc<dyn EmailRanker> = if live {
            Arc::new(LiveMailboxRanker::new(Arc::clone(&self.emails), config.evidence.clone()))
        } else {
            Arc::new(CachedCorpusRanker::new(
                Arc::clone(&self.local_embedder),
                Arc::clone(&self.emails),
                config.evidence.clone(),
            ))
        };
        EmailEvidenceSearch::new(ranker)
    }

    /// Summarizer over the configured language model.
    pub fn summarizer(&self, config: &Config) -> Summarizer<LanguageModel> {
        Summarizer::new(
            Arc::clone(&self.llm),
            self.model_settings.clone(),
            config.evidence.clone(),
        )
    }
}

fn read_fixture(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(CliError::Config(format!(
            "fixture not found: {} (set [corpus] in the config file)",
            path.display()
        )));
    }
    Ok(fs::read_to_string(path)?)
}

async fn index_history<E>(
    mut corpus: HistoryCorpus,
    embedder: Arc<E>,
) -> Result<(HistoryCorpus, std::result::Result<(), StoreError>)>
where
    E: EmbeddingModel + Send + Sync + 'static,
    E::Error: Display,
{
    tokio::task::spawn_blocking(move || {
        let outcome = corpus.index_embeddings(embedder.as_ref());
        (corpus, outcome)
    })
    .await
    .map_err(|e| CliError::Task(e.to_string()))
}

async fn index_emails<E>(mut corpus: EmailCorpus, embedder: Arc<E>) -> Result<EmailCorpus>
where
    E: EmbeddingModel + Send + Sync + 'static,
    E::Error: Display,
{
    tokio::task::spawn_blocking(move || {
        corpus.index_embeddings(embedder.as_ref())?;
        Ok::<_, CliError>(corpus)
    })
    .await
    .map_err(|e| CliError::Task(e.to_string()))?
}
