//! Bounded breadth-first expansion of a term's neighborhood.
//!
//! Starting from a root term, the expander repeatedly pops the oldest
//! frontier entry, asks the oracle for its nearest neighbors, keeps those
//! at or above the similarity threshold, records them as weighted edges and
//! queues every neighbor that has not been scanned yet. It stops when the
//! graph reaches `max_size` (by the configured [`SizeMetric`]) or the
//! frontier runs dry.
//!
//! The size bound is soft: a step that starts below the bound always
//! inserts all of its surviving edges, so the final size can exceed
//! `max_size` by at most `max_neighbors`.
//!
//! # Example
//!
//! ```
//! use semtree::expander::{Expander, ExpanderConfig};
//! use semtree::oracle::TableOracle;
//!
//! let oracle = TableOracle::new()
//!     .with_neighbors("a", [("b", 0.9), ("c", 0.4)])
//!     .with_neighbors("b", [("a", 0.9), ("d", 0.2)]);
//! let config = ExpanderConfig::default()
//!     .max_neighbors(2)
//!     .min_similarity(0.3)
//!     .max_size(10);
//!
//! let expansion = Expander::new(&oracle, config).unwrap().expand("a").unwrap();
//! assert!(expansion.graph.contains("c"));
//! assert!(!expansion.graph.contains("d"));
//! ```

use log::{debug, info, warn};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{Result, SemtreeError};
use crate::frontier::FrontierQueue;
use crate::graph::{EdgePolicy, NeighborhoodGraph, SizeMetric};
use crate::oracle::{Neighbor, NeighborOracle, Term};
use crate::scanned::ScannedSet;

/// What to do when the oracle fails for a single term.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OracleErrorPolicy {
    /// Abort the whole traversal.
    #[default]
    Abort,
    /// Treat the term as having no neighbors and continue.
    SkipTerm,
}

/// Configuration for a traversal run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExpanderConfig {
    /// Neighbors requested from the oracle per scanned term.
    pub max_neighbors: usize,
    /// Minimum similarity for a neighbor to become an edge.
    pub min_similarity: f32,
    /// Soft bound on the graph size.
    pub max_size: usize,
    /// What `max_size` counts.
    pub size_metric: SizeMetric,
    /// Whether reverse edges are distinct.
    pub edge_policy: EdgePolicy,
    /// How a failed neighbor query is handled.
    pub on_oracle_error: OracleErrorPolicy,
    /// Substitute a random vocabulary term for an unknown root.
    pub fallback_root: bool,
    /// Frontier entries queried together by [`Expander::expand_parallel`].
    pub batch_size: usize,
}

impl Default for ExpanderConfig {
    fn default() -> Self {
        Self {
            max_neighbors: 15,
            min_similarity: 0.3,
            max_size: 500,
            size_metric: SizeMetric::Edges,
            edge_policy: EdgePolicy::Undirected,
            on_oracle_error: OracleErrorPolicy::Abort,
            fallback_root: true,
            batch_size: 32,
        }
    }
}

impl ExpanderConfig {
    #[must_use]
    pub fn max_neighbors(mut self, n: usize) -> Self {
        self.max_neighbors = n;
        self
    }

    #[must_use]
    pub fn min_similarity(mut self, sim: f32) -> Self {
        self.min_similarity = sim;
        self
    }

    #[must_use]
    pub fn max_size(mut self, size: usize) -> Self {
        self.max_size = size;
        self
    }

    #[must_use]
    pub fn size_metric(mut self, metric: SizeMetric) -> Self {
        self.size_metric = metric;
        self
    }

    #[must_use]
    pub fn edge_policy(mut self, policy: EdgePolicy) -> Self {
        self.edge_policy = policy;
        self
    }

    #[must_use]
    pub fn on_oracle_error(mut self, policy: OracleErrorPolicy) -> Self {
        self.on_oracle_error = policy;
        self
    }

    #[must_use]
    pub fn fallback_root(mut self, enabled: bool) -> Self {
        self.fallback_root = enabled;
        self
    }

    #[must_use]
    pub fn batch_size(mut self, size: usize) -> Self {
        self.batch_size = size;
        self
    }

    /// Check the configuration for values the traversal cannot work with.
    pub fn validate(&self) -> Result<()> {
        if self.min_similarity.is_nan() {
            return Err(SemtreeError::invalid_argument(
                "min_similarity must be a number",
            ));
        }
        if self.batch_size == 0 {
            return Err(SemtreeError::invalid_argument(
                "batch_size must be positive",
            ));
        }
        Ok(())
    }
}

/// Picks a replacement root when the requested one is unknown.
pub trait FallbackSelector {
    /// Return an index in `0..len`. `len` is never zero.
    fn pick(&mut self, len: usize) -> usize;
}

/// Reproducible selection from a seeded generator.
#[derive(Debug, Clone)]
pub struct SeededSelector {
    rng: StdRng,
}

impl SeededSelector {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }
}

impl FallbackSelector for SeededSelector {
    fn pick(&mut self, len: usize) -> usize {
        self.rng.random_range(0..len)
    }
}

/// Selection from the thread-local generator.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadRngSelector;

impl FallbackSelector for ThreadRngSelector {
    fn pick(&mut self, len: usize) -> usize {
        rand::rng().random_range(0..len)
    }
}

/// A root substitution made because the requested term was unknown.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Substitution {
    pub requested: Term,
    pub substitute: Term,
}

/// Why a traversal stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    SizeBound,
    FrontierExhausted,
}

/// Outcome of a single traversal step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Step {
    /// The term was queried and its surviving neighbors recorded.
    Expanded {
        term: Term,
        edges_added: usize,
        enqueued: usize,
    },
    /// The term had been scanned before; nothing changed.
    AlreadyScanned(Term),
    /// The frontier was empty.
    Exhausted,
}

/// Mutable state of one traversal run.
#[derive(Debug)]
pub struct Traversal<'o, O: NeighborOracle + ?Sized> {
    oracle: &'o O,
    config: ExpanderConfig,
    graph: NeighborhoodGraph,
    scanned: ScannedSet,
    frontier: FrontierQueue,
    oracle_calls: usize,
}

impl<'o, O: NeighborOracle + ?Sized> Traversal<'o, O> {
    /// Start a traversal at `root`, which must already be resolved.
    pub fn new(oracle: &'o O, config: ExpanderConfig, root: &str) -> Self {
        let graph = NeighborhoodGraph::with_root(root, config.edge_policy);
        let mut frontier = FrontierQueue::new();
        frontier.push(root.to_string());

        Self {
            oracle,
            config,
            graph,
            scanned: ScannedSet::new(),
            frontier,
            oracle_calls: 0,
        }
    }

    pub fn graph(&self) -> &NeighborhoodGraph {
        &self.graph
    }

    pub fn scanned(&self) -> &ScannedSet {
        &self.scanned
    }

    pub fn frontier(&self) -> &FrontierQueue {
        &self.frontier
    }

    pub fn oracle_calls(&self) -> usize {
        self.oracle_calls
    }

    /// Whether the graph is still below the size bound.
    pub fn below_bound(&self) -> bool {
        self.graph.size(self.config.size_metric) < self.config.max_size
    }

    /// Pop one frontier entry and expand it.
    pub fn step(&mut self) -> Result<Step> {
        match self.frontier.try_pop() {
            Some(term) => self.expand_term(&term),
            None => Ok(Step::Exhausted),
        }
    }

    /// Expand `term` unless it has already been scanned.
    pub fn expand_term(&mut self, term: &str) -> Result<Step> {
        if self.scanned.contains(term) {
            debug!("'{term}' already scanned");
            return Ok(Step::AlreadyScanned(term.to_string()));
        }
        let result = self.query(term);
        self.oracle_calls += 1;
        let neighbors = self.settle(term, result)?;
        Ok(self.apply(term, neighbors))
    }

    /// Ask the oracle for the neighbors of `term` that pass the threshold.
    fn query(&self, term: &str) -> Result<Vec<Neighbor>> {
        let neighbors = self.oracle.neighbors(term, self.config.max_neighbors)?;
        Ok(neighbors
            .into_iter()
            .take(self.config.max_neighbors)
            .filter(|n| n.score >= self.config.min_similarity && n.term != term)
            .collect())
    }

    /// Apply the oracle error policy to a query result.
    fn settle(&self, term: &str, result: Result<Vec<Neighbor>>) -> Result<Vec<Neighbor>> {
        match (result, self.config.on_oracle_error) {
            (Ok(neighbors), _) => Ok(neighbors),
            (Err(e), OracleErrorPolicy::SkipTerm) => {
                warn!("Skipping '{term}' after oracle failure: {e}");
                Ok(Vec::new())
            }
            (Err(e), OracleErrorPolicy::Abort) => Err(e),
        }
    }

    /// Mark `term` scanned and record its neighbors.
    fn apply(&mut self, term: &str, neighbors: Vec<Neighbor>) -> Step {
        self.scanned.insert(term);

        let mut edges_added = 0;
        let mut enqueued = 0;
        for neighbor in neighbors {
            if self.graph.insert_edge(term, &neighbor.term, neighbor.score) {
                edges_added += 1;
            }
            if !self.scanned.contains(&neighbor.term) {
                self.frontier.push(neighbor.term);
                enqueued += 1;
            }
        }

        debug!("Expanded '{term}': {edges_added} new edges, {enqueued} queued");
        Step::Expanded {
            term: term.to_string(),
            edges_added,
            enqueued,
        }
    }

    /// Pop up to `limit` distinct unscanned terms, dropping stale entries.
    fn pop_batch(&mut self, limit: usize) -> Vec<Term> {
        let mut batch: Vec<Term> = Vec::with_capacity(limit);
        while batch.len() < limit {
            match self.frontier.try_pop() {
                Some(term) if self.scanned.contains(&term) || batch.contains(&term) => continue,
                Some(term) => batch.push(term),
                None => break,
            }
        }
        batch
    }

    /// Run sequentially until the size bound or frontier exhaustion.
    pub fn run(&mut self) -> Result<StopReason> {
        while self.below_bound() {
            if self.step()? == Step::Exhausted {
                return Ok(StopReason::FrontierExhausted);
            }
        }
        Ok(StopReason::SizeBound)
    }

    fn finish(self, stop: StopReason, substitution: Option<Substitution>) -> Expansion {
        info!(
            "Traversal from '{}' stopped ({:?}): {} nodes, {} edges, {} scanned",
            self.graph.root(),
            stop,
            self.graph.node_count(),
            self.graph.edge_count(),
            self.scanned.len()
        );
        Expansion {
            root: self.graph.root().to_string(),
            graph: self.graph,
            scanned: self.scanned,
            substitution,
            oracle_calls: self.oracle_calls,
            stop,
        }
    }
}

impl<O: NeighborOracle + Sync + ?Sized> Traversal<'_, O> {
    /// Run with oracle queries for a batch of frontier entries issued in
    /// parallel. Results are applied one term at a time in frontier order,
    /// so the graph matches the sequential run.
    pub fn run_parallel(&mut self) -> Result<StopReason> {
        while self.below_bound() {
            let batch = self.pop_batch(self.config.batch_size);
            if batch.is_empty() {
                return Ok(StopReason::FrontierExhausted);
            }

            let results: Vec<Result<Vec<Neighbor>>> =
                batch.par_iter().map(|term| self.query(term)).collect();

            for (term, result) in batch.iter().zip(results) {
                // the rest of the batch is discarded unscanned and uncounted
                if !self.below_bound() {
                    return Ok(StopReason::SizeBound);
                }
                self.oracle_calls += 1;
                let neighbors = self.settle(term, result)?;
                self.apply(term, neighbors);
            }
        }
        Ok(StopReason::SizeBound)
    }
}

/// Result of a traversal run.
#[derive(Debug, Clone)]
pub struct Expansion {
    /// The root actually used, after any substitution.
    pub root: Term,
    pub graph: NeighborhoodGraph,
    /// Terms queried during the run, in scan order.
    pub scanned: ScannedSet,
    pub substitution: Option<Substitution>,
    /// Oracle answers the traversal applied. Parallel batch answers
    /// discarded at the size bound are not included.
    pub oracle_calls: usize,
    pub stop: StopReason,
}

impl Expansion {
    /// Terms to replay in a timeline: the scanned terms in scan order,
    /// followed by the discovered but never expanded graph nodes.
    pub fn timeline_terms(&self) -> Vec<Term> {
        let mut terms: Vec<Term> = self.scanned.as_slice().to_vec();
        terms.extend(
            self.graph
                .nodes()
                .filter(|n| !self.scanned.contains(&n.term))
                .map(|n| n.term.clone()),
        );
        terms
    }
}

/// Builds neighborhood graphs from a neighbor oracle.
pub struct Expander<'o, O: NeighborOracle + ?Sized> {
    oracle: &'o O,
    config: ExpanderConfig,
    selector: Box<dyn FallbackSelector + Send>,
}

impl<'o, O: NeighborOracle + ?Sized> Expander<'o, O> {
    /// Create an expander that picks fallback roots from the thread RNG.
    pub fn new(oracle: &'o O, config: ExpanderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            oracle,
            config,
            selector: Box::new(ThreadRngSelector),
        })
    }

    /// Replace the fallback root selector.
    #[must_use]
    pub fn with_selector<S: FallbackSelector + Send + 'static>(mut self, selector: S) -> Self {
        self.selector = Box::new(selector);
        self
    }

    pub fn config(&self) -> &ExpanderConfig {
        &self.config
    }

    /// Pick a uniformly random vocabulary term with the fallback selector.
    pub fn random_root(&mut self) -> Result<Term> {
        let len = self.oracle.vocabulary_len();
        if len == 0 {
            return Err(SemtreeError::not_found("vocabulary is empty"));
        }
        let index = self.selector.pick(len);
        self.oracle
            .term_at(index)
            .map(str::to_string)
            .ok_or_else(|| {
                SemtreeError::other(format!("vocabulary has no term at index {index}"))
            })
    }

    /// Resolve the requested root, substituting a random vocabulary term
    /// when it is unknown and fallback is enabled.
    pub fn resolve_root(&mut self, requested: &str) -> Result<(Term, Option<Substitution>)> {
        if self.oracle.contains(requested) {
            return Ok((requested.to_string(), None));
        }
        if !self.config.fallback_root || self.oracle.vocabulary_len() == 0 {
            return Err(SemtreeError::not_found(format!(
                "term '{requested}' not in vocabulary"
            )));
        }

        let substitute = self.random_root()?;
        warn!("Term '{requested}' not in vocabulary, trying '{substitute}'");
        let substitution = Substitution {
            requested: requested.to_string(),
            substitute: substitute.clone(),
        };
        Ok((substitute, Some(substitution)))
    }

    /// Build the neighborhood graph of `root`.
    pub fn expand(&mut self, root: &str) -> Result<Expansion> {
        let (root, substitution) = self.resolve_root(root)?;
        info!("Building graph from '{root}'");

        let mut traversal = Traversal::new(self.oracle, self.config.clone(), &root);
        let stop = traversal.run()?;
        Ok(traversal.finish(stop, substitution))
    }
}

impl<O: NeighborOracle + Sync + ?Sized> Expander<'_, O> {
    /// Build the neighborhood graph of `root`, querying the oracle for
    /// several frontier entries at once.
    pub fn expand_parallel(&mut self, root: &str) -> Result<Expansion> {
        let (root, substitution) = self.resolve_root(root)?;
        info!("Building graph from '{root}' (parallel)");

        let mut traversal = Traversal::new(self.oracle, self.config.clone(), &root);
        let stop = traversal.run_parallel()?;
        Ok(traversal.finish(stop, substitution))
    }
}
