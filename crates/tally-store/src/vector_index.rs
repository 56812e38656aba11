//! Approximate nearest-neighbour index over posting embeddings
//!
//! Thin layer over `hnsw_rs` with cosine distance. Records are appended in
//! corpus order; the HNSW data id of a record is its position, so the id
//! table is a plain `Vec`.

use hnsw_rs::prelude::*;
use std::sync::Mutex;
use thiserror::Error;

/// Links per node
const LINKS_PER_NODE: usize = 16;
/// Candidate list size while inserting
const EF_CONSTRUCTION: usize = 200;
/// Capacity hint; the graph grows past it if needed
const CAPACITY_HINT: usize = 100_000;

/// Default search-time candidate list size
pub const DEFAULT_EF_SEARCH: usize = 64;

/// Vector index failures
#[derive(Error, Debug)]
pub enum VectorIndexError {
    /// Embedding length differs from the index dimension
    #[error("Invalid embedding dimension: expected {expected}, got {actual}")]
    DimensionMismatch {
        /// Dimension the index was built with
        expected: usize,
        /// Length of the rejected vector
        actual: usize,
    },

    /// Index state unavailable
    #[error("HNSW error: {0}")]
    Internal(String),
}

struct Graph {
    hnsw: Hnsw<'static, f32, DistCosine>,
    record_ids: Vec<String>,
}

/// Cosine HNSW index keyed by record id
///
/// ```no_run
/// use tally_store::vector_index::{VectorIndex, DEFAULT_EF_SEARCH};
///
/// let index = VectorIndex::new(256);
/// index.add("post-2024-0117", &[0.1; 256]).unwrap();
/// let hits = index.search(&[0.1; 256], 5, DEFAULT_EF_SEARCH).unwrap();
/// assert_eq!(hits[0].0, "post-2024-0117");
/// ```
pub struct VectorIndex {
    dimension: usize,
    graph: Mutex<Graph>,
}

impl VectorIndex {
    /// Empty index for vectors of `dimension`
    pub fn new(dimension: usize) -> Self {
        let layers = 16.min((CAPACITY_HINT as f32).ln().trunc() as usize);
        let hnsw = Hnsw::new(LINKS_PER_NODE, CAPACITY_HINT, layers, EF_CONSTRUCTION, DistCosine {});
        Self {
            dimension,
            graph: Mutex::new(Graph {
                hnsw,
                record_ids: Vec::new(),
            }),
        }
    }

    /// Vector length accepted by this index
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Append a record's embedding
    pub fn add(&self, record_id: impl Into<String>, embedding: &[f32]) -> Result<(), VectorIndexError> {
        self.check_dimension(embedding)?;
        let mut graph = self.lock()?;

        let position = graph.record_ids.len();
        graph.record_ids.push(record_id.into());
        graph.hnsw.insert((&embedding.to_vec(), position));
        Ok(())
    }

    /// Up to `k` nearest records as `(record id, cosine similarity)`, closest first
    pub fn search(
        &self,
        query: &[f32],
        k: usize,
        ef_search: usize,
    ) -> Result<Vec<(String, f32)>, VectorIndexError> {
        self.check_dimension(query)?;
        let graph = self.lock()?;
        if k == 0 || graph.record_ids.is_empty() {
            return Ok(Vec::new());
        }

        let mut hits: Vec<(String, f32)> = graph
            .hnsw
            .search(query, k, ef_search.max(k))
            .into_iter()
            .filter_map(|neighbour| {
                graph
                    .record_ids
                    .get(neighbour.d_id)
                    .map(|id| (id.clone(), 1.0 - neighbour.distance))
            })
            .collect();

        hits.sort_by(|a, b| b.1.total_cmp(&a.1));
        Ok(hits)
    }

    /// Number of indexed records
    pub fn len(&self) -> usize {
        self.graph.lock().map(|g| g.record_ids.len()).unwrap_or(0)
    }

    /// Whether nothing has been indexed
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Graph>, VectorIndexError> {
        self.graph
            .lock()
            .map_err(|e| VectorIndexError::Internal(format!("Lock poisoned: {}", e)))
    }

    fn check_dimension(&self, embedding: &[f32]) -> Result<(), VectorIndexError> {
        if embedding.len() == self.dimension {
            Ok(())
        } else {
            Err(VectorIndexError::DimensionMismatch {
                expected: self.dimension,
                actual: embedding.len(),
            })
        }
    }
}
