//! The accumulated neighborhood graph.
//!
//! Nodes are terms; edges carry the similarity score reported by the oracle.
//! Storage is a directed petgraph [`Graph`]. Under [`EdgePolicy::Undirected`]
//! a pair of terms holds at most one edge whichever way it was discovered.

use std::collections::VecDeque;

use ahash::AHashMap;
use petgraph::Direction;
use petgraph::graph::{Graph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::{Deserialize, Serialize};

use crate::oracle::Term;

/// What the size bound counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SizeMetric {
    Nodes,
    #[default]
    Edges,
}

/// Whether `a -> b` and `b -> a` are the same edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgePolicy {
    #[default]
    Undirected,
    Directed,
}

/// Role of a node, used by renderers to single out the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeRole {
    Root,
    Member,
}

impl NodeRole {
    /// Display color of this role.
    pub fn color(&self) -> &'static str {
        match self {
            NodeRole::Root => "blue",
            NodeRole::Member => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermNode {
    pub term: Term,
    pub role: NodeRole,
}

/// A weighted edge as stored in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeightedEdge {
    pub source: Term,
    pub target: Term,
    pub weight: f32,
}

/// Neighborhood graph rooted at a single term.
#[derive(Debug, Clone)]
pub struct NeighborhoodGraph {
    graph: Graph<TermNode, f32>,
    index: AHashMap<Term, NodeIndex>,
    root: NodeIndex,
    policy: EdgePolicy,
}

impl NeighborhoodGraph {
    /// Create a graph holding only the root node.
    pub fn with_root(root: &str, policy: EdgePolicy) -> Self {
        let mut graph = Graph::new();
        let root_index = graph.add_node(TermNode {
            term: root.to_string(),
            role: NodeRole::Root,
        });
        let mut index = AHashMap::new();
        index.insert(root.to_string(), root_index);

        Self {
            graph,
            index,
            root: root_index,
            policy,
        }
    }

    pub fn root(&self) -> &str {
        &self.graph[self.root].term
    }

    pub fn policy(&self) -> EdgePolicy {
        self.policy
    }

    pub fn contains(&self, term: &str) -> bool {
        self.index.contains_key(term)
    }

    pub fn node_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn size(&self, metric: SizeMetric) -> usize {
        match metric {
            SizeMetric::Nodes => self.node_count(),
            SizeMetric::Edges => self.edge_count(),
        }
    }

    fn ensure_node(&mut self, term: &str) -> NodeIndex {
        if let Some(&idx) = self.index.get(term) {
            return idx;
        }
        let idx = self.graph.add_node(TermNode {
            term: term.to_string(),
            role: NodeRole::Member,
        });
        self.index.insert(term.to_string(), idx);
        idx
    }

    fn find_edge(&self, a: NodeIndex, b: NodeIndex) -> Option<petgraph::graph::EdgeIndex> {
        match self.policy {
            EdgePolicy::Directed => self.graph.find_edge(a, b),
            EdgePolicy::Undirected => self.graph.find_edge_undirected(a, b).map(|(e, _)| e),
        }
    }

    /// Insert `source -> target` with the given weight.
    ///
    /// Returns `false` without touching the graph when the pair already has
    /// an edge (per the edge policy) or when `source == target`.
    pub fn insert_edge(&mut self, source: &str, target: &str, weight: f32) -> bool {
        if source == target {
            return false;
        }
        if let (Some(&a), Some(&b)) = (self.index.get(source), self.index.get(target))
            && self.find_edge(a, b).is_some()
        {
            return false;
        }

        let a = self.ensure_node(source);
        let b = self.ensure_node(target);
        self.graph.add_edge(a, b, weight);
        true
    }

    /// Weight of the edge between `a` and `b`, honoring the edge policy.
    pub fn weight(&self, a: &str, b: &str) -> Option<f32> {
        let (&ia, &ib) = (self.index.get(a)?, self.index.get(b)?);
        self.find_edge(ia, ib).map(|e| self.graph[e])
    }

    pub fn role(&self, term: &str) -> Option<NodeRole> {
        self.index.get(term).map(|&idx| self.graph[idx].role)
    }

    /// Nodes in insertion order; the root comes first.
    pub fn nodes(&self) -> impl Iterator<Item = &TermNode> {
        self.graph.node_indices().map(move |idx| &self.graph[idx])
    }

    /// Edges in insertion order.
    pub fn edges(&self) -> Vec<WeightedEdge> {
        self.graph
            .edge_references()
            .map(|e| WeightedEdge {
                source: self.graph[e.source()].term.clone(),
                target: self.graph[e.target()].term.clone(),
                weight: *e.weight(),
            })
            .collect()
    }

    /// Position of `term` in node insertion order.
    pub fn node_position(&self, term: &str) -> Option<usize> {
        self.index.get(term).map(|idx| idx.index())
    }

    /// The underlying petgraph graph.
    pub fn inner(&self) -> &Graph<TermNode, f32> {
        &self.graph
    }

    fn adjacent(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut adjacent: Vec<NodeIndex> = match self.policy {
            EdgePolicy::Directed => self
                .graph
                .neighbors_directed(idx, Direction::Outgoing)
                .collect(),
            EdgePolicy::Undirected => self.graph.neighbors_undirected(idx).collect(),
        };
        // petgraph yields newest edges first
        adjacent.sort_unstable();
        adjacent.dedup();
        adjacent
    }

    /// Breadth-first shortest paths (by hop count) from `from` to every
    /// reachable node.
    pub fn shortest_paths_from(&self, from: &str) -> Option<ShortestPaths<'_>> {
        let start = *self.index.get(from)?;
        let mut parent: Vec<Option<NodeIndex>> = vec![None; self.graph.node_count()];
        let mut seen = vec![false; self.graph.node_count()];
        let mut queue = VecDeque::new();

        seen[start.index()] = true;
        queue.push_back(start);
        while let Some(current) = queue.pop_front() {
            for next in self.adjacent(current) {
                if !seen[next.index()] {
                    seen[next.index()] = true;
                    parent[next.index()] = Some(current);
                    queue.push_back(next);
                }
            }
        }

        Some(ShortestPaths {
            graph: self,
            start,
            parent,
            seen,
        })
    }

    /// Shortest path from `from` to `to`, both ends included.
    pub fn shortest_path(&self, from: &str, to: &str) -> Option<Vec<Term>> {
        self.shortest_paths_from(from)?.path_to(to)
    }
}

/// Breadth-first search tree rooted at one node.
#[derive(Debug)]
pub struct ShortestPaths<'a> {
    graph: &'a NeighborhoodGraph,
    start: NodeIndex,
    parent: Vec<Option<NodeIndex>>,
    seen: Vec<bool>,
}

impl ShortestPaths<'_> {
    /// Path from the search origin to `term`, or `None` if unreachable.
    pub fn path_to(&self, term: &str) -> Option<Vec<Term>> {
        let target = *self.graph.index.get(term)?;
        if !self.seen[target.index()] {
            return None;
        }

        let mut path = vec![self.graph.graph[target].term.clone()];
        let mut current = target;
        while current != self.start {
            current = self.parent[current.index()]?;
            path.push(self.graph.graph[current].term.clone());
        }
        path.reverse();
        Some(path)
    }
}
