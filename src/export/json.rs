//! JSON snapshot of a neighborhood graph.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::graph::{EdgePolicy, NeighborhoodGraph, TermNode, WeightedEdge};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphSnapshot {
    pub root: String,
    pub policy: EdgePolicy,
    pub nodes: Vec<TermNode>,
    pub edges: Vec<WeightedEdge>,
}

impl From<&NeighborhoodGraph> for GraphSnapshot {
    fn from(graph: &NeighborhoodGraph) -> Self {
        Self {
            root: graph.root().to_string(),
            policy: graph.policy(),
            nodes: graph.nodes().cloned().collect(),
            edges: graph.edges(),
        }
    }
}

impl GraphSnapshot {
    /// Rebuild a graph from the snapshot.
    pub fn to_graph(&self) -> NeighborhoodGraph {
        let mut graph = NeighborhoodGraph::with_root(&self.root, self.policy);
        for edge in &self.edges {
            graph.insert_edge(&edge.source, &edge.target, edge.weight);
        }
        graph
    }

    pub fn write<W: Write>(&self, writer: W) -> Result<()> {
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let mut writer = BufWriter::new(File::create(path)?);
        self.write(&mut writer)?;
        writer.flush()?;
        Ok(())
    }
}
