//! # semtree
//!
//! Explore the semantic neighborhood of a term in a pretrained embedding
//! space.
//!
//! ## Features
//!
//! - Bounded breadth-first expansion over any nearest-neighbor oracle
//! - word2vec text, binary and JSON model loading
//! - Root substitution for out-of-vocabulary terms, reproducible under a seed
//! - GML, JSON, SVG and Gource timeline exports

pub mod cli;
pub mod error;
pub mod expander;
pub mod export;
pub mod frontier;
pub mod graph;
pub mod model;
pub mod oracle;
pub mod scanned;

pub mod prelude {
    pub use crate::error::{Result, SemtreeError};
    pub use crate::expander::{Expander, ExpanderConfig, Expansion, SeededSelector};
    pub use crate::graph::{EdgePolicy, NeighborhoodGraph, SizeMetric};
    pub use crate::oracle::{Neighbor, NeighborOracle, TableOracle, Term};
}

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
