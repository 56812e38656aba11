//! Local text embeddings
//!
//! [`MockEmbeddingModel`] feature-hashes lowercase character trigrams into a
//! fixed number of signed buckets and scales the result to unit length.
//! Payment notes that share most of their trigrams (`ACME LLC 123 MAIN` and
//! `ACME L.L.C. 123 MAIN ST`) land close together, which is all the vector
//! strategy and the cached email corpus need offline.
//!
//! ```rust
//! use tally_store::embedding::{cosine_similarity, MockEmbeddingModel};
//! use tally_domain::traits::EmbeddingModel;
//!
//! let model = MockEmbeddingModel::new(256);
//! let a = model.embed("BO1:ACME LLC").unwrap();
//! let b = model.embed("bo1:acme   llc").unwrap();
//! assert_eq!(a.len(), 256);
//! assert!(cosine_similarity(&a, &b) > 0.999);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tally_domain::traits::EmbeddingModel;
use thiserror::Error;

/// Embedding failures
#[derive(Error, Debug)]
pub enum EmbeddingError {
    /// Text that cannot be embedded (blank)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The model could not produce a vector
    #[error("Model inference failed: {0}")]
    InferenceFailed(String),
}

/// Hashed-trigram embedding model
///
/// Case and runs of whitespace do not change the output.
pub struct MockEmbeddingModel {
    dimension: usize,
}

impl MockEmbeddingModel {
    /// Model producing vectors of `dimension`
    pub fn new(dimension: usize) -> Self {
        Self { dimension }
    }

    fn bucket(&self, gram: &[char]) -> (usize, f32) {
        let mut hasher = DefaultHasher::new();
        gram.hash(&mut hasher);
        let hash = hasher.finish();
        let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
        ((hash % self.dimension as u64) as usize, sign)
    }
}

impl EmbeddingModel for MockEmbeddingModel {
    type Error = EmbeddingError;

    fn embed(&self, text: &str) -> Result<Vec<f32>, Self::Error> {
        if self.dimension == 0 {
            return Err(EmbeddingError::InferenceFailed(
                "Embedding dimension must be greater than 0".to_string(),
            ));
        }

        let chars: Vec<char> = text
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_lowercase()
            .chars()
            .collect();
        if chars.is_empty() {
            return Err(EmbeddingError::InvalidInput(
                "Empty text cannot be embedded".to_string(),
            ));
        }

        let mut vector = vec![0.0f32; self.dimension];
        let grams: Vec<&[char]> = if chars.len() < 3 {
            vec![chars.as_slice()]
        } else {
            chars.windows(3).collect()
        };
        for gram in grams {
            let (bucket, sign) = self.bucket(gram);
            vector[bucket] += sign;
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|x| *x /= norm);
        }
        Ok(vector)
    }

    fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Cosine similarity in `[-1, 1]`
///
/// Mismatched lengths and zero vectors score 0.0.
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() {
        return 0.0;
    }
    let (dot, norm_a, norm_b) = a
        .iter()
        .zip(b)
        .fold((0.0f32, 0.0f32, 0.0f32), |(dot, na, nb), (x, y)| {
            (dot + x * y, na + x * x, nb + y * y)
        });
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a.sqrt() * norm_b.sqrt())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn norm(v: &[f32]) -> f32 {
        v.iter().map(|x| x * x).sum::<f32>().sqrt()
    }

    #[test]
    fn test_repeatable_and_unit_length() {
        let model = MockEmbeddingModel::new(128);
        let note = "BO:219062889 BO1:ACME LLC BO2:123 MAIN ST";
        let first = model.embed(note).unwrap();
        assert_eq!(first, model.embed(note).unwrap());
        assert_eq!(first.len(), 128);
        assert_eq!(model.dimension(), 128);
        assert!((norm(&first) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_wrapped_variant_closer_than_other_payer() {
        let model = MockEmbeddingModel::new(512);
        let anchor = model.embed("BO1:ACME LLC BO2:123 MAIN ST").unwrap();
        let variant = model.embed("BO1:ACME LLC BO2:123 MAIN STREET").unwrap();
        let other = model.embed("WIRE FROM GLOBEX INDUSTRIES SPRINGFIELD").unwrap();

        let near = cosine_similarity(&anchor, &variant);
        assert!(near > 0.8, "variant similarity was {}", near);
        assert!(near > cosine_similarity(&anchor, &other));
    }

    #[test]
    fn test_case_and_spacing_ignored() {
        let model = MockEmbeddingModel::new(256);
        assert_eq!(model.embed("ACME   llc").unwrap(), model.embed("acme LLC").unwrap());
    }

    #[test]
    fn test_blank_text_and_zero_dimension_rejected() {
        assert!(matches!(
            MockEmbeddingModel::new(64).embed(" \t "),
            Err(EmbeddingError::InvalidInput(_))
        ));
        assert!(matches!(
            MockEmbeddingModel::new(0).embed("ACME"),
            Err(EmbeddingError::InferenceFailed(_))
        ));
    }

    #[test]
    fn test_two_char_text_still_embeds() {
        let v = MockEmbeddingModel::new(64).embed("ab").unwrap();
        assert!((norm(&v) - 1.0).abs() < 1e-4);
    }

    #[test]
    fn test_cosine_edge_cases() {
        assert!((cosine_similarity(&[0.6, 0.8], &[0.6, 0.8]) - 1.0).abs() < 1e-4);
        assert!(cosine_similarity(&[1.0, 0.0], &[0.0, 1.0]).abs() < 1e-4);
        assert_eq!(cosine_similarity(&[1.0, 0.0], &[1.0, 0.0, 0.0]), 0.0);
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 0.0]), 0.0);
    }
}
