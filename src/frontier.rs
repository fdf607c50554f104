//! FIFO of terms waiting to be expanded.

use std::collections::VecDeque;

use crate::oracle::Term;

/// Terms discovered but not yet expanded.
///
/// The same term may be queued more than once when it is reached along
/// several paths; the scanned set decides whether a popped term is expanded.
#[derive(Debug, Clone, Default)]
pub struct FrontierQueue {
    queue: VecDeque<Term>,
    pushed: usize,
}

impl FrontierQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, term: Term) {
        self.pushed += 1;
        self.queue.push_back(term);
    }

    /// Pop the oldest entry, or `None` when the frontier is exhausted.
    pub fn try_pop(&mut self) -> Option<Term> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Total number of pushes over the queue's lifetime.
    pub fn total_pushed(&self) -> usize {
        self.pushed
    }

    pub fn iter(&self) -> impl Iterator<Item = &Term> {
        self.queue.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifo_order_and_empty_signal() {
        let mut frontier = FrontierQueue::new();
        assert_eq!(frontier.try_pop(), None);

        frontier.push("a".into());
        frontier.push("b".into());
        frontier.push("a".into());
        assert_eq!(frontier.len(), 3);

        assert_eq!(frontier.try_pop().as_deref(), Some("a"));
        assert_eq!(frontier.try_pop().as_deref(), Some("b"));
        assert_eq!(frontier.try_pop().as_deref(), Some("a"));
        assert_eq!(frontier.try_pop(), None);
        assert!(frontier.is_empty());
        assert_eq!(frontier.total_pushed(), 3);
    }
}
