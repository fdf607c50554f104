//! Nearest-neighbor oracles.
//!
//! A [`NeighborOracle`] answers "which terms are closest to this one?" for a
//! fixed vocabulary. The expander treats it as a black box: results arrive
//! sorted by descending similarity and never contain the queried term.
//!
//! Two implementations ship with the crate:
//!
//! - [`crate::model::EmbeddingOracle`]: cosine similarity over loaded term vectors
//! - [`TableOracle`]: explicit neighbor lists, useful for fixtures and
//!   precomputed similarity tables

use std::cmp::Ordering;

use ahash::AHashMap;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SemtreeError};

/// A vocabulary entry. Equality is exact string equality.
pub type Term = String;

/// A neighbor returned by an oracle together with its similarity score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neighbor {
    pub term: Term,
    pub score: f32,
}

impl Neighbor {
    pub fn new<S: Into<Term>>(term: S, score: f32) -> Self {
        Self {
            term: term.into(),
            score,
        }
    }
}

/// Source of nearest-neighbor answers over a finite vocabulary.
pub trait NeighborOracle {
    /// Return up to `top_k` neighbors of `term`, sorted by descending score.
    ///
    /// Fails with [`SemtreeError::NotFound`] when `term` is not in the vocabulary.
    fn neighbors(&self, term: &str, top_k: usize) -> Result<Vec<Neighbor>>;

    /// Whether `term` is part of the vocabulary.
    fn contains(&self, term: &str) -> bool;

    /// Number of terms in the vocabulary.
    fn vocabulary_len(&self) -> usize;

    /// The term stored at `index` in vocabulary order.
    fn term_at(&self, index: usize) -> Option<&str>;
}

/// Sort neighbors by descending score. Equal scores keep their relative order.
pub fn sort_by_score(neighbors: &mut [Neighbor]) {
    neighbors.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
}

/// An oracle backed by explicit, precomputed neighbor lists.
///
/// Every term mentioned as a neighbor is added to the vocabulary, so it can
/// be expanded later (with no neighbors unless a list is registered for it).
#[derive(Debug, Default)]
pub struct TableOracle {
    vocabulary: Vec<Term>,
    index: AHashMap<Term, usize>,
    lists: AHashMap<Term, Vec<Neighbor>>,
    failing: AHashMap<Term, String>,
    queries: Mutex<AHashMap<Term, usize>>,
}

impl TableOracle {
    /// Create an empty oracle.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a term with no neighbors.
    pub fn with_term<S: Into<Term>>(mut self, term: S) -> Self {
        self.add_term(term.into());
        self
    }

    /// Register the neighbor list of `term`. The list is re-sorted by score.
    pub fn with_neighbors<S, I, N>(mut self, term: S, neighbors: I) -> Self
    where
        S: Into<Term>,
        I: IntoIterator<Item = (N, f32)>,
        N: Into<Term>,
    {
        let term = term.into();
        self.add_term(term.clone());

        let mut list: Vec<Neighbor> = neighbors
            .into_iter()
            .map(|(n, score)| Neighbor::new(n, score))
            .filter(|n| n.term != term)
            .collect();
        for neighbor in &list {
            self.add_term(neighbor.term.clone());
        }
        sort_by_score(&mut list);

        self.lists.insert(term, list);
        self
    }

    /// Make every query for `term` fail with an oracle error.
    pub fn failing_on<S: Into<Term>>(mut self, term: S, reason: &str) -> Self {
        let term = term.into();
        self.add_term(term.clone());
        self.failing.insert(term, reason.to_string());
        self
    }

    /// How many times `term` has been queried.
    pub fn query_count(&self, term: &str) -> usize {
        self.queries.lock().get(term).copied().unwrap_or(0)
    }

    /// Total number of queries answered or rejected so far.
    pub fn total_queries(&self) -> usize {
        self.queries.lock().values().sum()
    }

    fn add_term(&mut self, term: Term) {
        if !self.index.contains_key(&term) {
            self.index.insert(term.clone(), self.vocabulary.len());
            self.vocabulary.push(term);
        }
    }

    fn record_query(&self, term: &str) {
        *self.queries.lock().entry(term.to_string()).or_insert(0) += 1;
    }
}

impl NeighborOracle for TableOracle {
    fn neighbors(&self, term: &str, top_k: usize) -> Result<Vec<Neighbor>> {
        if !self.index.contains_key(term) {
            return Err(SemtreeError::not_found(format!(
                "term '{term}' not in vocabulary"
            )));
        }
        self.record_query(term);

        if let Some(reason) = self.failing.get(term) {
            return Err(SemtreeError::oracle(format!(
                "query for '{term}' failed: {reason}"
            )));
        }

        Ok(self
            .lists
            .get(term)
            .map(|list| list.iter().take(top_k).cloned().collect())
            .unwrap_or_default())
    }

    fn contains(&self, term: &str) -> bool {
        self.index.contains_key(term)
    }

    fn vocabulary_len(&self) -> usize {
        self.vocabulary.len()
    }

    fn term_at(&self, index: usize) -> Option<&str> {
        self.vocabulary.get(index).map(|s| s.as_str())
    }
}
