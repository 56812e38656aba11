//! Match candidates produced by search strategies

use std::collections::BTreeMap;
use std::fmt;

/// Search backend family that produced a candidate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StrategyKind {
    /// Fuzzy full-text relevance over historical notes
    FuzzyText,
    /// Locally embedded text against a vector index
    VectorSimilarity,
    /// Externally embedded text against a vector index
    ExternalEmbedding,
}

impl StrategyKind {
    /// All strategy kinds in declaration order
    pub const ALL: [StrategyKind; 3] = [
        StrategyKind::FuzzyText,
        StrategyKind::VectorSimilarity,
        StrategyKind::ExternalEmbedding,
    ];

    /// Stable snake_case label
    pub fn as_str(self) -> &'static str {
        match self {
            StrategyKind::FuzzyText => "fuzzy_text",
            StrategyKind::VectorSimilarity => "vector_similarity",
            StrategyKind::ExternalEmbedding => "external_embedding",
        }
    }

    /// Parse a snake_case label
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|k| k.as_str() == label)
    }
}

impl fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A proposed historical match for one payment-note line
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCandidate {
    /// Identifier of the historical record in its corpus
    pub external_id: String,

    /// Human-readable text of the historical record
    pub display_text: String,

    /// Normalized confidence in [0, 100]
    pub confidence_percent: f64,

    /// Strategy that produced this candidate
    pub strategy: StrategyKind,

    /// Denormalized posting fields (cost center, GL account, ...)
    pub posting_fields: BTreeMap<String, String>,

    /// Score as reported by the backend
    pub raw_score: f64,
}

impl MatchCandidate {
    /// Get a posting field
    pub fn posting_field(&self, key: &str) -> Option<&str> {
        self.posting_fields.get(key).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_kind_labels_round_trip() {
        for kind in StrategyKind::ALL {
            assert_eq!(StrategyKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(StrategyKind::parse("bm25"), None);
    }
}
