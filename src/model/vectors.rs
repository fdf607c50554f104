//! Term vectors and the cosine-similarity oracle built on them.

use ahash::AHashMap;
use rayon::prelude::*;

use crate::error::{Result, SemtreeError};
use crate::oracle::{Neighbor, NeighborOracle, Term};

/// Vocabularies at least this large are scored in parallel.
const PARALLEL_THRESHOLD: usize = 1024;

/// A dense, row-major store of unit-length term vectors.
#[derive(Debug, Clone)]
pub struct TermVectors {
    dimension: usize,
    terms: Vec<Term>,
    index: AHashMap<Term, usize>,
    data: Vec<f32>,
}

impl TermVectors {
    /// Create an empty store for vectors of the given dimension.
    pub fn new(dimension: usize) -> Result<Self> {
        if dimension == 0 {
            return Err(SemtreeError::model_load(
                "vector dimension must be positive",
            ));
        }
        Ok(Self {
            dimension,
            terms: Vec::new(),
            index: AHashMap::new(),
            data: Vec::new(),
        })
    }

    /// Create a store with room for `capacity` vectors.
    pub fn with_capacity(dimension: usize, capacity: usize) -> Result<Self> {
        let mut vectors = Self::new(dimension)?;
        let values = capacity.checked_mul(dimension).ok_or_else(|| {
            SemtreeError::model_load(format!(
                "{capacity} vectors of dimension {dimension} do not fit in memory"
            ))
        })?;
        vectors.terms.reserve(capacity);
        vectors.data.reserve(values);
        Ok(vectors)
    }

    /// Add a vector for `term`, normalizing it to unit length.
    ///
    /// A later vector for the same term replaces the earlier one.
    pub fn insert<S: Into<Term>>(&mut self, term: S, vector: &[f32]) -> Result<()> {
        let term = term.into();
        if vector.len() != self.dimension {
            return Err(SemtreeError::model_load(format!(
                "vector for '{term}' has dimension {}, expected {}",
                vector.len(),
                self.dimension
            )));
        }
        if vector.iter().any(|x| !x.is_finite()) {
            return Err(SemtreeError::model_load(format!(
                "vector for '{term}' contains NaN or infinite values"
            )));
        }

        let norm = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        let normalized = vector.iter().map(|x| if norm > 0.0 { x / norm } else { 0.0 });

        match self.index.get(&term) {
            Some(&row) => {
                let start = row * self.dimension;
                for (slot, value) in self.data[start..start + self.dimension]
                    .iter_mut()
                    .zip(normalized)
                {
                    *slot = value;
                }
            }
            None => {
                self.index.insert(term.clone(), self.terms.len());
                self.terms.push(term);
                self.data.extend(normalized);
            }
        }
        Ok(())
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.terms.is_empty()
    }

    pub fn terms(&self) -> &[Term] {
        &self.terms
    }

    /// Row index of `term`, if present.
    pub fn position(&self, term: &str) -> Option<usize> {
        self.index.get(term).copied()
    }

    /// The unit vector stored for `term`.
    pub fn vector(&self, term: &str) -> Option<&[f32]> {
        self.position(term).map(|row| self.row(row))
    }

    fn row(&self, row: usize) -> &[f32] {
        let start = row * self.dimension;
        &self.data[start..start + self.dimension]
    }

    /// Cosine similarity between two stored terms.
    pub fn similarity(&self, a: &str, b: &str) -> Result<f32> {
        let va = self
            .vector(a)
            .ok_or_else(|| SemtreeError::not_found(format!("term '{a}' not in vocabulary")))?;
        let vb = self
            .vector(b)
            .ok_or_else(|| SemtreeError::not_found(format!("term '{b}' not in vocabulary")))?;
        Ok(dot(va, vb))
    }
}

#[inline]
fn dot(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b.iter()).map(|(x, y)| x * y).sum()
}

/// Neighbor oracle answering by exact cosine similarity over all terms.
///
/// Results are deterministic: equal scores are ordered by vocabulary position.
#[derive(Debug, Clone)]
pub struct EmbeddingOracle {
    vectors: TermVectors,
}

impl EmbeddingOracle {
    pub fn new(vectors: TermVectors) -> Self {
        Self { vectors }
    }

    pub fn vectors(&self) -> &TermVectors {
        &self.vectors
    }

    fn scores(&self, query_row: usize) -> Vec<(usize, f32)> {
        let query = self.vectors.row(query_row);
        let score = |row: usize| (row, dot(query, self.vectors.row(row)));

        if self.vectors.len() >= PARALLEL_THRESHOLD {
            (0..self.vectors.len())
                .into_par_iter()
                .filter(|&row| row != query_row)
                .map(score)
                .collect()
        } else {
            (0..self.vectors.len())
                .filter(|&row| row != query_row)
                .map(score)
                .collect()
        }
    }
}

impl NeighborOracle for EmbeddingOracle {
    fn neighbors(&self, term: &str, top_k: usize) -> Result<Vec<Neighbor>> {
        let query_row = self
            .vectors
            .position(term)
            .ok_or_else(|| SemtreeError::not_found(format!("term '{term}' not in vocabulary")))?;
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let mut scored = self.scores(query_row);
        let by_score =
            |a: &(usize, f32), b: &(usize, f32)| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0));

        if top_k < scored.len() {
            scored.select_nth_unstable_by(top_k - 1, by_score);
            scored.truncate(top_k);
        }
        scored.sort_unstable_by(by_score);

        Ok(scored
            .into_iter()
            .map(|(row, score)| Neighbor::new(self.vectors.terms[row].clone(), score))
            .collect())
    }

    fn contains(&self, term: &str) -> bool {
        self.vectors.position(term).is_some()
    }

    fn vocabulary_len(&self) -> usize {
        self.vectors.len()
    }

    fn term_at(&self, index: usize) -> Option<&str> {
        self.vectors.terms.get(index).map(|s| s.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_vectors() -> TermVectors {
        let mut vectors = TermVectors::new(3).unwrap();
        vectors.insert("king", &[1.0, 0.0, 0.0]).unwrap();
        vectors.insert("queen", &[0.9, 0.1, 0.0]).unwrap();
        vectors.insert("prince", &[0.7, 0.3, 0.0]).unwrap();
        vectors.insert("apple", &[0.0, 0.0, 1.0]).unwrap();
        vectors
    }

    #[test]
    fn test_insert_normalizes_and_replaces() {
        let mut vectors = TermVectors::new(2).unwrap();
        vectors.insert("a", &[3.0, 4.0]).unwrap();
        assert_eq!(vectors.vector("a").unwrap(), &[0.6f32, 0.8][..]);

        vectors.insert("a", &[0.0, 2.0]).unwrap();
        assert_eq!(vectors.len(), 1);
        assert_eq!(vectors.vector("a").unwrap(), &[0.0f32, 1.0][..]);
    }

    #[test]
    fn test_insert_rejects_bad_vectors() {
        let mut vectors = TermVectors::new(2).unwrap();
        assert!(vectors.insert("a", &[1.0]).is_err());
        assert!(vectors.insert("b", &[f32::NAN, 1.0]).is_err());
        assert!(TermVectors::new(0).is_err());
    }

    #[test]
    fn test_with_capacity_rejects_overflow() {
        let err = TermVectors::with_capacity(300, usize::MAX).unwrap_err();
        assert!(matches!(err, SemtreeError::ModelLoad(_)));
        assert!(TermVectors::with_capacity(3, 10).unwrap().is_empty());
    }

    #[test]
    fn test_similarity() {
        let vectors = sample_vectors();
        assert!((vectors.similarity("king", "king").unwrap() - 1.0).abs() < 1e-6);
        assert!(vectors.similarity("king", "apple").unwrap().abs() < 1e-6);
        assert!(vectors.similarity("king", "zebra").unwrap_err().is_not_found());
    }

    #[test]
    fn test_neighbors_sorted_and_exclude_query() {
        let oracle = EmbeddingOracle::new(sample_vectors());

        let neighbors = oracle.neighbors("king", 10).unwrap();
        let terms: Vec<&str> = neighbors.iter().map(|n| n.term.as_str()).collect();
        assert_eq!(terms, vec!["queen", "prince", "apple"]);
        assert!(neighbors.windows(2).all(|w| w[0].score >= w[1].score));

        let top = oracle.neighbors("king", 1).unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].term, "queen");
        assert!(oracle.neighbors("king", 0).unwrap().is_empty());
    }

    #[test]
    fn test_ties_follow_vocabulary_order() {
        let mut vectors = TermVectors::new(2).unwrap();
        vectors.insert("root", &[1.0, 0.0]).unwrap();
        vectors.insert("b", &[0.0, 1.0]).unwrap();
        vectors.insert("a", &[0.0, 1.0]).unwrap();
        let oracle = EmbeddingOracle::new(vectors);

        let neighbors = oracle.neighbors("root", 2).unwrap();
        assert_eq!(neighbors[0].term, "b");
        assert_eq!(neighbors[1].term, "a");
    }

    #[test]
    fn test_unknown_term() {
        let oracle = EmbeddingOracle::new(sample_vectors());
        assert!(oracle.neighbors("zebra", 3).unwrap_err().is_not_found());
        assert!(!oracle.contains("zebra"));
        assert_eq!(oracle.term_at(3), Some("apple"));
        assert_eq!(oracle.term_at(4), None);
    }

    #[test]
    fn test_parallel_scoring_matches_sequential_order() {
        let mut vectors = TermVectors::new(2).unwrap();
        for i in 0..(PARALLEL_THRESHOLD + 10) {
            let angle = i as f32 * 0.001;
            vectors
                .insert(format!("t{i}"), &[angle.cos(), angle.sin()])
                .unwrap();
        }
        let oracle = EmbeddingOracle::new(vectors);

        let neighbors = oracle.neighbors("t0", 3).unwrap();
        let terms: Vec<&str> = neighbors.iter().map(|n| n.term.as_str()).collect();
        assert_eq!(terms, vec!["t1", "t2", "t3"]);
    }
}
