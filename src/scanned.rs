//! Set of terms whose neighbors have already been queried.

use ahash::AHashSet;

use crate::oracle::Term;

/// Terms already passed to the oracle, in the order they were scanned.
///
/// Membership is O(1); each term is recorded at most once.
#[derive(Debug, Clone, Default)]
pub struct ScannedSet {
    members: AHashSet<Term>,
    order: Vec<Term>,
}

impl ScannedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `term` as scanned. Returns `false` if it already was.
    pub fn insert(&mut self, term: &str) -> bool {
        if self.members.contains(term) {
            return false;
        }
        self.members.insert(term.to_string());
        self.order.push(term.to_string());
        true
    }

    pub fn contains(&self, term: &str) -> bool {
        self.members.contains(term)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Scanned terms in scan order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    pub fn as_slice(&self) -> &[Term] {
        &self.order
    }
}
