//! In-memory corpus of historical postings
//!
//! Reference backend for the fuzzy-text and vector strategies. Records are
//! loaded from JSON fixtures and kept in memory for the life of the process.

use crate::vector_index::{VectorIndex, DEFAULT_EF_SEARCH};
use crate::StoreError;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt::Display;
use std::path::Path;
use tally_domain::traits::EmbeddingModel;
use tracing::debug;

/// A previously reconciled payment note with its posting
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoricalRecord {
    /// Record identifier
    pub id: String,

    /// Payment-note text as it appeared on the statement
    pub text: String,

    /// Posting fields the reviewer assigned
    #[serde(default)]
    pub posting_fields: BTreeMap<String, String>,
}

/// A record with a backend-native score
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredRecord {
    /// The matched record
    pub record: HistoricalRecord,
    /// Relevance (text) or cosine similarity (vector)
    pub score: f64,
}

/// Historical postings with optional vector index
pub struct HistoryCorpus {
    records: Vec<HistoricalRecord>,
    by_id: HashMap<String, usize>,
    index: Option<VectorIndex>,
}

impl HistoryCorpus {
    /// Create a corpus from records; ids must be unique
    pub fn new(records: Vec<HistoricalRecord>) -> Result<Self, StoreError> {
        let mut by_id = HashMap::with_capacity(records.len());
        for (position, record) in records.iter().enumerate() {
            if by_id.insert(record.id.clone(), position).is_some() {
                return Err(StoreError::DuplicateId(record.id.clone()));
            }
        }
        Ok(Self {
            records,
            by_id,
            index: None,
        })
    }

    /// Parse a JSON array of records
    pub fn from_json(json: &str) -> Result<Self, StoreError> {
        let records: Vec<HistoricalRecord> = serde_json::from_str(json)?;
        Self::new(records)
    }

    /// Load a JSON array of records from a file
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, StoreError> {
        let contents = std::fs::read_to_string(path)?;
        Self::from_json(&contents)
    }

    /// Embed every record and build the vector index
    pub fn index_embeddings<E>(&mut self, embedder: &E) -> Result<(), StoreError>
    where
        E: EmbeddingModel,
        E::Error: Display,
    {
        let index = VectorIndex::new(embedder.dimension());
        for record in &self.records {
            let embedding = embedder
                .embed(&record.text)
                .map_err(|e| StoreError::Embedding(format!("{}: {}", record.id, e)))?;
            index.add(record.id.clone(), &embedding)?;
        }
        debug!(records = index.len(), "Built history vector index");
        self.index = Some(index);
        Ok(())
    }

    /// Number of records
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if the corpus is empty
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Whether `index_embeddings` has been run
    pub fn is_indexed(&self) -> bool {
        self.index.is_some()
    }

    /// Get a record by id
    pub fn get(&self, id: &str) -> Option<&HistoricalRecord> {
        self.by_id.get(id).map(|&position| &self.records[position])
    }

    /// Fuzzy full-text relevance search
    ///
    /// Relevance is the Sørensen-Dice bigram coefficient of the lowercased
    /// texts, already in `[0, 1]`. Ties keep corpus order.
    pub fn text_search(&self, query: &str, limit: usize) -> Vec<ScoredRecord> {
        let query = normalize(query);
        if query.is_empty() {
            return Vec::new();
        }

        let mut scored: Vec<ScoredRecord> = self
            .records
            .iter()
            .map(|record| ScoredRecord {
                score: strsim::sorensen_dice(&query, &normalize(&record.text)),
                record: record.clone(),
            })
            .filter(|hit| hit.score > 0.0)
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        scored
    }

    /// Nearest records to an embedding
    pub fn vector_search(&self, embedding: &[f32], limit: usize) -> Result<Vec<ScoredRecord>, StoreError> {
        let index = self.index.as_ref().ok_or(StoreError::NotIndexed)?;
        let hits = index.search(embedding, limit, DEFAULT_EF_SEARCH)?;

        Ok(hits
            .into_iter()
            .filter_map(|(id, similarity)| {
                self.get(&id).map(|record| ScoredRecord {
                    record: record.clone(),
                    score: f64::from(similarity),
                })
            })
            .collect())
    }
}

fn normalize(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::MockEmbeddingModel;

    fn record(id: &str, text: &str) -> HistoricalRecord {
        HistoricalRecord {
            id: id.to_string(),
            text: text.to_string(),
            posting_fields: BTreeMap::new(),
        }
    }

    fn corpus() -> HistoryCorpus {
        HistoryCorpus::new(vec![
            record("h1", "BO:219062889 BO1:ACME LLC BO2:123 MAIN ST"),
            record("h2", "BO:555000111 BO1:GLOBEX CORP BO2:9 ELM AVE"),
            record("h3", "DETAILS: INVOICE 7781 INITECH"),
        ])
        .unwrap()
    }

    #[test]
    fn test_duplicate_ids_rejected() {
        let result = HistoryCorpus::new(vec![record("a", "x"), record("a", "y")]);
        assert!(matches!(result, Err(StoreError::DuplicateId(id)) if id == "a"));
    }

    #[test]
    fn test_from_json_with_posting_fields() {
        let json = r#"[
            {"id": "h1", "text": "BO1:ACME", "posting_fields": {"gl_account": "4000"}},
            {"id": "h2", "text": "BO1:GLOBEX"}
        ]"#;
        let corpus = HistoryCorpus::from_json(json).unwrap();
        assert_eq!(corpus.len(), 2);
        assert_eq!(corpus.get("h1").unwrap().posting_fields["gl_account"], "4000");
        assert!(corpus.get("h2").unwrap().posting_fields.is_empty());
    }

    #[test]
    fn test_text_search_ranks_closest_first() {
        let corpus = corpus();
        let hits = corpus.text_search("BO:219062889 BO1:ACME LLC BO2:123 MAIN STREET", 10);
        assert_eq!(hits[0].record.id, "h1");
        assert!(hits[0].score > 0.9);
        assert!(hits.windows(2).all(|w| w[0].score >= w[1].score));
    }

    #[test]
    fn test_text_search_respects_limit() {
        let corpus = corpus();
        assert!(corpus.text_search("BO1", 1).len() <= 1);
        assert!(corpus.text_search("   ", 10).is_empty());
    }

    #[test]
    fn test_vector_search_requires_index() {
        let corpus = corpus();
        let result = corpus.vector_search(&[0.0; 8], 5);
        assert!(matches!(result, Err(StoreError::NotIndexed)));
    }

    #[test]
    fn test_vector_search_after_indexing() {
        let mut corpus = corpus();
        let model = MockEmbeddingModel::new(256);
        corpus.index_embeddings(&model).unwrap();
        assert!(corpus.is_indexed());

        let query = model.embed("BO:219062889 BO1:ACME LLC BO2:123 MAIN ST").unwrap();
        let hits = corpus.vector_search(&query, 3).unwrap();
        assert_eq!(hits[0].record.id, "h1");
        assert!(hits[0].score > 0.99);
    }
}
