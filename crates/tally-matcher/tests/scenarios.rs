//! End-to-end matching scenarios with scripted strategies

use async_trait::async_trait;
use proptest::prelude::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Barrier;
use tally_domain::{LineType, MatchCandidate, StrategyKind};
use tally_matcher::{
    FuzzyTextStrategy, LineClassifier, MatchConfig, MatchOrchestrator, SearchStrategy,
    StrategyError,
};
use tally_store::{HistoricalRecord, HistoryCorpus};

/// Returns a fixed candidate list, or a fixed error
struct ScriptedStrategy {
    kind: StrategyKind,
    result: Result<Vec<(String, f64)>, StrategyError>,
}

impl ScriptedStrategy {
    fn ok(kind: StrategyKind, hits: &[(&str, f64)]) -> Arc<dyn SearchStrategy> {
        Arc::new(Self {
            kind,
            result: Ok(hits.iter().map(|(id, c)| (id.to_string(), *c)).collect()),
        })
    }

    fn failing(kind: StrategyKind) -> Arc<dyn SearchStrategy> {
        Arc::new(Self {
            kind,
            result: Err(StrategyError::Backend("connection reset by peer".to_string())),
        })
    }
}

#[async_trait]
impl SearchStrategy for ScriptedStrategy {
    fn kind(&self) -> StrategyKind {
        self.kind
    }

    async fn search(&self, _text: &str, limit: usize) -> Result<Vec<MatchCandidate>, StrategyError> {
        let hits = self.result.clone()?;
        Ok(hits
            .into_iter()
            .take(limit)
            .map(|(id, confidence)| MatchCandidate {
                display_text: format!("record {}", id),
                external_id: id,
                confidence_percent: confidence,
                strategy: self.kind,
                posting_fields: Default::default(),
                raw_score: (confidence - 60.0) / 35.0,
            })
            .collect())
    }
}

/// Answers only once every strategy sharing the barrier has been polled
struct RendezvousStrategy {
    kind: StrategyKind,
    barrier: Arc<Barrier>,
    id: &'static str,
}

impl RendezvousStrategy {
    fn gated(kind: StrategyKind, barrier: &Arc<Barrier>, id: &'static str) -> Arc<dyn SearchStrategy> {
        Arc::new(Self {
            kind,
            barrier: Arc::clone(barrier),
            id,
        })
    }
}

#[async_trait]
impl SearchStrategy for RendezvousStrategy {
    fn kind(&self) -> StrategyKind {
        self.kind
    }

    async fn search(&self, _text: &str, _limit: usize) -> Result<Vec<MatchCandidate>, StrategyError> {
        self.barrier.wait().await;
        Ok(vec![MatchCandidate {
            display_text: format!("record {}", self.id),
            external_id: self.id.to_string(),
            confidence_percent: 90.0,
            strategy: self.kind,
            posting_fields: Default::default(),
            raw_score: 30.0 / 35.0,
        }])
    }
}

#[test]
fn scenario_buyer_order_and_transaction_lines() {
    let lines = LineClassifier::new().classify("BO:219062889 BO1:ACME LLC BO2:123 MAIN ST\nTRID:998877\n");

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].line_number, 1);
    assert_eq!(lines[0].line_type, LineType::BuyerOrderPrimary);
    assert_eq!(
        lines[0].search_text.as_deref(),
        Some("BO:219062889 BO1:ACME LLC BO2:123 MAIN ST")
    );
    assert_eq!(lines[1].line_number, 2);
    assert_eq!(lines[1].line_type, LineType::TransactionId);
    assert_eq!(lines[1].search_text, None);
    assert_eq!(lines[1].meta("transaction_id"), Some("998877"));
}

#[tokio::test]
async fn scenario_strategies_run_concurrently() {
    let barrier = Arc::new(Barrier::new(2));
    let orchestrator = MatchOrchestrator::new(vec![
        RendezvousStrategy::gated(StrategyKind::FuzzyText, &barrier, "h-1"),
        RendezvousStrategy::gated(StrategyKind::VectorSimilarity, &barrier, "h-2"),
    ]);

    // Awaiting one strategy before polling the next would never pass the barrier
    let outcome = tokio::time::timeout(
        Duration::from_secs(5),
        orchestrator.match_text(Some("ACME LLC")),
    )
    .await
    .expect("strategies should be dispatched together");

    let mut ids: Vec<_> = outcome.candidates.iter().map(|c| c.external_id.as_str()).collect();
    ids.sort();
    assert_eq!(ids, vec!["h-1", "h-2"]);
    assert!(outcome.reports.iter().all(|r| !r.failed() && r.hits == 1));
}

#[tokio::test]
async fn scenario_same_id_from_three_strategies_keeps_highest() {
    let orchestrator = MatchOrchestrator::new(vec![
        ScriptedStrategy::ok(StrategyKind::FuzzyText, &[("h-1", 90.0)]),
        ScriptedStrategy::ok(StrategyKind::VectorSimilarity, &[("h-1", 70.0)]),
        ScriptedStrategy::ok(StrategyKind::ExternalEmbedding, &[("h-1", 95.0)]),
    ]);

    let outcome = orchestrator.match_text(Some("BO1:ACME LLC")).await;

    assert_eq!(outcome.candidates.len(), 1);
    assert_eq!(outcome.candidates[0].external_id, "h-1");
    assert_eq!(outcome.candidates[0].confidence_percent, 95.0);
    assert_eq!(outcome.candidates[0].strategy, StrategyKind::ExternalEmbedding);
}

#[tokio::test]
async fn scenario_failing_strategy_does_not_block_others() {
    let orchestrator = MatchOrchestrator::new(vec![
        ScriptedStrategy::ok(StrategyKind::FuzzyText, &[("h-1", 91.0), ("h-2", 80.0)]),
        ScriptedStrategy::failing(StrategyKind::VectorSimilarity),
        ScriptedStrategy::ok(StrategyKind::ExternalEmbedding, &[("h-3", 94.5)]),
    ]);

    let outcome = orchestrator.match_text(Some("DETAILS: INVOICE 4471")).await;

    let ids: Vec<_> = outcome.candidates.iter().map(|c| c.external_id.as_str()).collect();
    assert_eq!(ids, vec!["h-3", "h-1"]);

    let failed: Vec<_> = outcome.reports.iter().filter(|r| r.failed()).collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].kind, StrategyKind::VectorSimilarity);
    assert!(failed[0].error.as_deref().unwrap_or_default().contains("connection reset"));
}

#[tokio::test]
async fn all_strategies_failing_yields_empty_outcome() {
    let orchestrator = MatchOrchestrator::new(vec![
        ScriptedStrategy::failing(StrategyKind::FuzzyText),
        ScriptedStrategy::failing(StrategyKind::VectorSimilarity),
    ]);

    let outcome = orchestrator.match_text(Some("BO1:ACME LLC")).await;
    assert!(outcome.is_empty());
    assert_eq!(outcome.reports.len(), 2);
}

#[tokio::test]
async fn disabled_strategy_is_not_dispatched() {
    let config = MatchConfig {
        enabled_strategies: vec!["fuzzy_text".to_string()],
        ..MatchConfig::default()
    };
    let orchestrator = MatchOrchestrator::with_config(
        vec![
            ScriptedStrategy::ok(StrategyKind::FuzzyText, &[("h-1", 88.0)]),
            ScriptedStrategy::ok(StrategyKind::VectorSimilarity, &[("h-2", 99.0)]),
        ],
        config,
    );

    let outcome = orchestrator.match_text(Some("BO1:ACME LLC")).await;
    assert_eq!(outcome.reports.len(), 1);
    assert_eq!(outcome.best().map(|c| c.external_id.as_str()), Some("h-1"));
}

#[tokio::test]
async fn per_strategy_results_are_capped() {
    let hits: Vec<(String, f64)> = (0..15).map(|i| (format!("h-{}", i), 95.0)).collect();
    let hit_refs: Vec<(&str, f64)> = hits.iter().map(|(id, c)| (id.as_str(), *c)).collect();
    let orchestrator =
        MatchOrchestrator::new(vec![ScriptedStrategy::ok(StrategyKind::FuzzyText, &hit_refs)]);

    let outcome = orchestrator.match_text(Some("BO1:ACME LLC")).await;
    assert_eq!(outcome.candidates.len(), 10);
    assert_eq!(outcome.top(3).len(), 3);
}

#[tokio::test]
async fn match_lines_against_history_corpus() {
    let corpus = HistoryCorpus::new(vec![
        HistoricalRecord {
            id: "post-17".to_string(),
            text: "BO:219062889 BO1:ACME LLC BO2:123 MAIN ST".to_string(),
            posting_fields: [("cost_center".to_string(), "CC-100".to_string())].into(),
        },
        HistoricalRecord {
            id: "post-18".to_string(),
            text: "BO1:INITECH INC".to_string(),
            posting_fields: Default::default(),
        },
    ])
    .unwrap();
    let fuzzy: Arc<dyn SearchStrategy> = Arc::new(FuzzyTextStrategy::new(Arc::new(corpus)));
    let orchestrator = MatchOrchestrator::new(vec![fuzzy]);

    let lines = LineClassifier::new().classify("BO:219062889 BO1:ACME LLC BO2:123 MAIN ST\nTRID:998877");
    let matches = orchestrator.match_lines(&lines).await;

    assert_eq!(matches.len(), 2);
    let best = matches[0].outcome.best().unwrap();
    assert_eq!(best.external_id, "post-17");
    assert_eq!(best.posting_field("cost_center"), Some("CC-100"));
    assert!(matches[1].outcome.is_empty());
    assert!(matches[1].outcome.reports.is_empty());
}

fn arb_batch() -> impl Strategy<Value = Vec<(String, f64)>> {
    prop::collection::vec(("h-[0-9]", 60.0f64..=95.0), 0..12)
}

proptest! {
    #[test]
    fn orchestrator_output_is_unique_qualifying_and_sorted(
        a in arb_batch(),
        b in arb_batch(),
        c in arb_batch(),
    ) {
        let strategies: Vec<Arc<dyn SearchStrategy>> = [
            (StrategyKind::FuzzyText, a),
            (StrategyKind::VectorSimilarity, b),
            (StrategyKind::ExternalEmbedding, c),
        ]
        .into_iter()
        .map(|(kind, hits)| Arc::new(ScriptedStrategy { kind, result: Ok(hits) }) as Arc<dyn SearchStrategy>)
        .collect();
        let orchestrator = MatchOrchestrator::new(strategies);

        let outcome = tokio_test::block_on(orchestrator.match_text(Some("BO1:ACME LLC")));

        let mut seen = std::collections::HashSet::new();
        for candidate in &outcome.candidates {
            prop_assert!(candidate.confidence_percent >= 85.0);
            prop_assert!(seen.insert(candidate.external_id.clone()));
        }
        for pair in outcome.candidates.windows(2) {
            prop_assert!(pair[0].confidence_percent >= pair[1].confidence_percent);
        }
    }
}
