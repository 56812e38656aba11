//! End-to-end reconciliation over the repository fixtures

use chrono::NaiveDate;
use std::path::PathBuf;
use std::sync::Arc;
use tally_cli::{CliError, Config, Reconciler, Services, StatementContext};
use tally_domain::{CompanySource, StrategyKind};
use tally_evidence::{
    CachedCorpusRanker, CompanyNameExtractor, EmailEvidenceSearch, EmailRanker, EvidenceError,
    EvidenceSource, LiveMailboxRanker, Summarizer,
};
use tally_llm::MockProvider;
use tally_matcher::{FuzzyTextStrategy, MatchOrchestrator, SearchStrategy};
use tally_store::{EmailCorpus, HistoryCorpus, MockEmbeddingModel};

const SUMMARY: &str = "**Cost Center**: CC-420\n\
**Company Code**: Not found\n\
**GL Account**: 4000-500\n\
**Invoice/Reference**: INV-55120\n\
**Notes**: Payment advice from Hooli AP";

fn fixture(name: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("../../fixtures")
        .join(name)
}

fn read(name: &str) -> String {
    std::fs::read_to_string(fixture(name)).unwrap()
}

fn fixture_config() -> Config {
    let mut config = Config::default();
    config.corpus.history = fixture("history.json");
    config.corpus.emails = fixture("emails.json");
    config
}

struct Harness {
    reconciler: Reconciler<MockProvider>,
    llm: MockProvider,
}

fn harness(live: bool) -> Harness {
    let history = Arc::new(HistoryCorpus::from_path(fixture("history.json")).unwrap());
    let embedder = Arc::new(MockEmbeddingModel::new(256));
    let mut emails = EmailCorpus::from_path(fixture("emails.json")).unwrap();
    emails.index_embeddings(embedder.as_ref()).unwrap();
    let emails = Arc::new(emails);

    let mut llm = MockProvider::new("NONE");
    llm.add_response_containing("**Cost Center**", SUMMARY);
    let shared = Arc::new(llm.clone());

    let config = Config::default();
    let strategies: Vec<Arc<dyn SearchStrategy>> = vec![Arc::new(FuzzyTextStrategy::new(history))];
    let ranker: Arc<dyn EmailRanker> = if live {
        Arc::new(LiveMailboxRanker::new(emails, config.evidence.clone()))
    } else {
        Arc::new(CachedCorpusRanker::new(embedder, emails, config.evidence.clone()))
    };

    let reconciler = Reconciler::new(
        MatchOrchestrator::new(strategies),
        CompanyNameExtractor::with_llm(Arc::clone(&shared), config.model_settings()),
        EmailEvidenceSearch::new(ranker),
        Summarizer::new(shared, config.model_settings(), config.evidence.clone()),
    );

    Harness { reconciler, llm }
}

#[tokio::test]
async fn test_historical_match_short_circuits_fallback() {
    let h = harness(false);
    let report = h
        .reconciler
        .reconcile(&read("note-matched.txt"), StatementContext::default())
        .await
        .unwrap();

    let best = report.best_match.as_ref().expect("match expected");
    assert_eq!(best.external_id, "post-2024-0117");
    assert_eq!(best.confidence_percent, 95.0);
    assert_eq!(best.posting_field("cost_center"), Some("CC-100"));

    assert!(!report.used_fallback());
    assert!(report.company.is_none());
    assert!(report.evidence.is_empty());
    assert_eq!(h.llm.call_count(), 0);
}

#[tokio::test]
async fn test_unmatched_note_falls_back_to_email_evidence() {
    let h = harness(false);
    let report = h
        .reconciler
        .reconcile(&read("note-unmatched.txt"), StatementContext::default())
        .await
        .unwrap();

    assert!(report.used_fallback());
    assert_eq!(report.context.date, NaiveDate::from_ymd_opt(2024, 3, 10));
    assert_eq!(report.context.amount, Some(4980.0));

    let company = report.company.as_ref().unwrap();
    assert_eq!(company.name, "HOOLI");
    assert_eq!(company.source, CompanySource::Pattern);

    assert_eq!(report.evidence_source, Some(EvidenceSource::CachedCorpus));
    assert_eq!(report.evidence[0].id, "msg-001");
    // January remittance is outside the seven-day window
    assert!(report.evidence.iter().all(|e| e.id != "msg-004"));

    let summary = report.summary.as_ref().unwrap();
    assert_eq!(summary.cost_center.as_deref(), Some("CC-420"));
    assert_eq!(summary.company_code, None);
    assert_eq!(summary.invoice.as_deref(), Some("INV-55120"));

    // Pattern rule found the name, so only the summary prompt reached the model
    assert_eq!(h.llm.call_count(), 1);
}

#[tokio::test]
async fn test_live_mailbox_fallback_uses_keyword_hits() {
    let h = harness(true);
    let report = h
        .reconciler
        .reconcile(&read("note-unmatched.txt"), StatementContext::default())
        .await
        .unwrap();

    assert_eq!(report.evidence_source, Some(EvidenceSource::LiveMailbox));
    let ids: Vec<_> = report.evidence.iter().map(|e| e.id.as_str()).collect();
    assert_eq!(ids[0], "msg-001");
    assert!(!ids.contains(&"msg-003"));
    assert!(report.evidence.iter().all(|e| e.similarity == 0.0));
}

#[tokio::test]
async fn test_missing_date_skips_email_search() {
    let h = harness(false);
    let report = h
        .reconciler
        .reconcile("BO:771203345 BO1:HOOLI BO2:1 INFINITE LOOP", StatementContext::default())
        .await
        .unwrap();

    assert_eq!(report.company.as_ref().map(|c| c.name.as_str()), Some("HOOLI"));
    assert_eq!(report.evidence_source, None);
    assert!(report.evidence.is_empty());
    assert!(report.summary.is_none());
}

#[tokio::test]
async fn test_explicit_context_overrides_note_metadata() {
    let h = harness(false);
    let context = StatementContext {
        date: NaiveDate::from_ymd_opt(2024, 1, 15),
        amount: None,
    };
    let report = h
        .reconciler
        .reconcile(&read("note-unmatched.txt"), context)
        .await
        .unwrap();

    assert_eq!(report.context.amount, Some(4980.0));
    assert_eq!(report.evidence[0].id, "msg-004");
}

#[tokio::test]
async fn test_empty_note_rejected() {
    let h = harness(false);
    let result = h.reconciler.reconcile(" \n ", StatementContext::default()).await;
    assert!(matches!(
        result,
        Err(CliError::Evidence(EvidenceError::MissingNoteText))
    ));
}

#[tokio::test]
async fn test_services_load_fixture_corpora() {
    let config = fixture_config();
    let services = Services::load(&config).await.unwrap();
    let history = services.load_history(&config).await.unwrap();

    assert_eq!(history.local.len(), 4);
    assert!(history.local.is_indexed());
    assert!(history.external.is_indexed());
    assert_eq!(services.emails.len(), 4);
    assert_eq!(services.strategies(&history).len(), 3);

    let outcome = services
        .orchestrator(&history, &config)
        .match_text(Some("BO:219062889 BO1:ACME LLC BO2:123 MAIN ST"))
        .await;
    let best = outcome.best().unwrap();
    assert_eq!(best.external_id, "post-2024-0117");
    assert_eq!(best.confidence_percent, 95.0);
    // Every strategy agrees on the exact text
    assert!(outcome.reports.iter().all(|r| !r.failed()));
}

#[tokio::test]
async fn test_services_mock_mode_end_to_end() {
    let config = fixture_config();
    let services = Services::load(&config).await.unwrap();
    let history = services.load_history(&config).await.unwrap();
    let reconciler = Reconciler::new(
        services.orchestrator(&history, &config),
        services.company_extractor(),
        services.email_search(&config, false),
        services.summarizer(&config),
    );

    let report = reconciler
        .reconcile(&read("note-unmatched.txt"), StatementContext::default())
        .await
        .unwrap();

    assert!(report.used_fallback());
    assert!(!report.evidence.is_empty());
    let summary = report.summary.unwrap();
    assert!(!summary.has_structured_fields());
    assert!(summary.notes.unwrap().contains("Mock model"));
}

#[tokio::test]
async fn test_services_missing_history_is_config_error() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = Config::default();
    config.corpus.history = dir.path().join("missing.json");
    config.corpus.emails = dir.path().join("missing-emails.json");

    // Evidence and company lookups never touch the history fixture
    let services = Services::load(&config).await.unwrap();
    let result = services.load_history(&config).await;
    assert!(matches!(result, Err(CliError::Config(_))));
}

#[tokio::test(flavor = "multi_thread")]
async fn test_unreachable_external_embedder_leaves_other_strategies_working() {
    let mut config = fixture_config();
    config.llm.use_mock = false;
    // Discard port; nothing answers there
    config.llm.endpoint = "http://127.0.0.1:9".to_string();

    let services = Services::load(&config).await.unwrap();
    let history = services.load_history(&config).await.unwrap();
    assert!(history.local.is_indexed());
    assert!(!history.external.is_indexed());

    let outcome = services
        .orchestrator(&history, &config)
        .match_text(Some("BO:219062889 BO1:ACME LLC BO2:123 MAIN ST"))
        .await;
    let best = outcome.best().unwrap();
    assert_eq!(best.external_id, "post-2024-0117");

    let failed: Vec<_> = outcome.reports.iter().filter(|r| r.failed()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].kind, StrategyKind::ExternalEmbedding);
}

#[tokio::test]
async fn test_services_missing_emails_gives_empty_corpus() {
    let dir = tempfile::tempdir().unwrap();
    let mut config = fixture_config();
    config.corpus.emails = dir.path().join("missing-emails.json");

    let services = Services::load(&config).await.unwrap();
    assert!(services.emails.is_empty());
}
