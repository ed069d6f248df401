//! In-memory similarity index over registered fingerprints.
//!
//! Single-writer/multi-reader: queries take the read lock and may run
//! concurrently, insert/remove serialize on the write lock. All mutation is
//! driven by registry lifecycle events through the matcher; the registry
//! itself only ever reads query results.

use std::sync::RwLock;

use serde::{Deserialize, Serialize};

use crate::error::{ImprintError, Result};
use crate::matcher::Fingerprint;

/// One fingerprint hit returned by [`SimilarityIndex::query`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryHit {
    pub identifier: String,
    /// Cosine similarity in `[-1, 1]`; `1 - cosine distance` of the
    /// unit-norm fingerprints.
    pub similarity: f32,
}

struct IndexEntry {
    identifier: String,
    fingerprint: Fingerprint,
    registered_at: i64,
}

/// Fixed-dimension nearest-neighbor index under cosine similarity.
pub struct SimilarityIndex {
    dimension: usize,
    entries: RwLock<Vec<IndexEntry>>,
}

impl SimilarityIndex {
    /// Create an empty index with a fixed dimensionality.
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            entries: RwLock::new(Vec::new()),
        }
    }

    /// Dimensionality every stored fingerprint must have.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Insert a fingerprint under an identifier.
    ///
    /// `registered_at` is the record's ledger timestamp, used for
    /// deterministic tie-breaking in queries.
    ///
    /// # Errors
    ///
    /// - [`ImprintError::DimensionMismatch`] if the fingerprint does not
    ///   match the index dimensionality.
    /// - [`ImprintError::DuplicateIdentifier`] if the identifier is already
    ///   indexed.
    pub fn insert(
        &self,
        identifier: &str,
        fingerprint: Fingerprint,
        registered_at: i64,
    ) -> Result<()> {
        if fingerprint.dimension() != self.dimension {
            return Err(ImprintError::DimensionMismatch {
                expected: self.dimension,
                got: fingerprint.dimension(),
            });
        }
        let mut entries = self.entries.write().expect("index lock poisoned");
        if entries.iter().any(|e| e.identifier == identifier) {
            return Err(ImprintError::DuplicateIdentifier(identifier.to_string()));
        }
        entries.push(IndexEntry {
            identifier: identifier.to_string(),
            fingerprint,
            registered_at,
        });
        Ok(())
    }

    /// Remove an identifier from the index. Idempotent: removing an absent
    /// identifier is a no-op, never an error.
    pub fn remove(&self, identifier: &str) -> bool {
        let mut entries = self.entries.write().expect("index lock poisoned");
        let before = entries.len();
        entries.retain(|e| e.identifier != identifier);
        entries.len() != before
    }

    /// Whether an identifier is currently indexed.
    pub fn contains(&self, identifier: &str) -> bool {
        self.entries
            .read()
            .expect("index lock poisoned")
            .iter()
            .any(|e| e.identifier == identifier)
    }

    /// Number of indexed fingerprints.
    pub fn len(&self) -> usize {
        self.entries.read().expect("index lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Up to `k` nearest fingerprints with similarity at or above
    /// `threshold`, ordered by descending similarity; ties broken by
    /// earliest registration timestamp, then identifier. An empty result is
    /// a normal "no match" outcome, and an empty index degrades to an empty
    /// result rather than a fault.
    pub fn query(&self, fingerprint: &Fingerprint, k: usize, threshold: f32) -> Vec<QueryHit> {
        let entries = self.entries.read().expect("index lock poisoned");
        let mut hits: Vec<(QueryHit, i64)> = entries
            .iter()
            .filter(|e| e.fingerprint.dimension() == fingerprint.dimension())
            .map(|e| {
                (
                    QueryHit {
                        identifier: e.identifier.clone(),
                        similarity: fingerprint.similarity(&e.fingerprint),
                    },
                    e.registered_at,
                )
            })
            .filter(|(hit, _)| hit.similarity >= threshold)
            .collect();

        hits.sort_by(|(a, a_ts), (b, b_ts)| {
            b.similarity
                .total_cmp(&a.similarity)
                .then(a_ts.cmp(b_ts))
                .then(a.identifier.cmp(&b.identifier))
        });
        hits.truncate(k);
        hits.into_iter().map(|(hit, _)| hit).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fp(values: &[f32]) -> Fingerprint {
        Fingerprint::from_raw(values.to_vec()).unwrap()
    }

    #[test]
    fn insert_and_query() {
        let index = SimilarityIndex::new(3);
        index.insert("a", fp(&[1.0, 0.0, 0.0]), 1).unwrap();
        index.insert("b", fp(&[0.0, 1.0, 0.0]), 2).unwrap();

        let hits = index.query(&fp(&[1.0, 0.1, 0.0]), 5, 0.5);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].identifier, "a");
        assert!(hits[0].similarity > 0.99);
    }

    #[test]
    fn duplicate_insert_rejected() {
        let index = SimilarityIndex::new(3);
        index.insert("a", fp(&[1.0, 0.0, 0.0]), 1).unwrap();
        assert!(matches!(
            index.insert("a", fp(&[0.0, 1.0, 0.0]), 2),
            Err(ImprintError::DuplicateIdentifier(_))
        ));
    }

    #[test]
    fn dimension_mismatch_rejected() {
        let index = SimilarityIndex::new(3);
        assert!(matches!(
            index.insert("a", fp(&[1.0, 0.0]), 1),
            Err(ImprintError::DimensionMismatch { expected: 3, got: 2 })
        ));
    }

    #[test]
    fn remove_is_idempotent() {
        let index = SimilarityIndex::new(3);
        index.insert("a", fp(&[1.0, 0.0, 0.0]), 1).unwrap();
        assert!(index.remove("a"));
        assert!(!index.remove("a"));
        assert!(index.is_empty());
    }

    #[test]
    fn empty_index_returns_empty_result() {
        let index = SimilarityIndex::new(3);
        assert!(index.query(&fp(&[1.0, 0.0, 0.0]), 5, 0.0).is_empty());
    }

    #[test]
    fn ties_break_by_earliest_registration() {
        let index = SimilarityIndex::new(2);
        // Identical fingerprints: similarity ties exactly.
        index.insert("later", fp(&[1.0, 0.0]), 200).unwrap();
        index.insert("earlier", fp(&[1.0, 0.0]), 100).unwrap();

        let hits = index.query(&fp(&[1.0, 0.0]), 2, 0.9);
        assert_eq!(hits[0].identifier, "earlier");
        assert_eq!(hits[1].identifier, "later");
    }

    #[test]
    fn results_ordered_by_descending_similarity() {
        let index = SimilarityIndex::new(2);
        index.insert("far", fp(&[0.6, 0.8]), 1).unwrap();
        index.insert("near", fp(&[1.0, 0.05]), 2).unwrap();

        let hits = index.query(&fp(&[1.0, 0.0]), 5, 0.5);
        assert_eq!(hits[0].identifier, "near");
        assert_eq!(hits[1].identifier, "far");
    }

    #[test]
    fn k_limits_result_count() {
        let index = SimilarityIndex::new(2);
        for i in 0..5 {
            index
                .insert(&format!("id-{i}"), fp(&[1.0, i as f32 * 0.01]), i)
                .unwrap();
        }
        assert_eq!(index.query(&fp(&[1.0, 0.0]), 3, 0.0).len(), 3);
    }
}
