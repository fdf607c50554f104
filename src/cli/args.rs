//! Command line argument parsing for the semtree CLI using clap.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use serde::{Deserialize, Serialize};

use crate::expander::{ExpanderConfig, OracleErrorPolicy};
use crate::graph::{EdgePolicy, SizeMetric};

/// semtree - visualize the semantic neighborhood of a term
#[derive(Parser, Debug, Clone)]
#[command(name = "semtree")]
#[command(about = "Visualize the semantic neighborhood of a term given a word2vec model")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(long_about = None)]
pub struct SemtreeArgs {
    /// Path to a word2vec model (text, binary or JSON)
    #[arg(value_name = "MODEL")]
    pub model: PathBuf,

    /// The word or bi-gram to analyze (a random vocabulary term if omitted)
    #[arg(short = 'w', long = "word")]
    pub word: Option<String>,

    /// Max number of neighbors to scan per term
    #[arg(short = 'n', long = "neighbors", default_value = "15")]
    pub neighbors: usize,

    /// Minimum similarity to be a neighbor
    #[arg(short = 's', long = "sim", default_value = "0.3", allow_negative_numbers = true)]
    pub sim: f32,

    /// Maximum size of the tree
    #[arg(short = 'S', long = "size", default_value = "500")]
    pub size: usize,

    /// Type of visualization
    #[arg(short = 'o', long = "output", default_value = "animation")]
    pub output: OutputMode,

    /// What the size bound counts
    #[arg(long = "metric", default_value = "edges")]
    pub metric: MetricArg,

    /// Keep reverse edges as distinct edges
    #[arg(long)]
    pub directed: bool,

    /// Seed for root substitution and layout
    #[arg(long)]
    pub seed: Option<u64>,

    /// Actor name written to the timeline (defaults to the login name)
    #[arg(long, env = "SEMTREE_ACTOR")]
    pub actor: Option<String>,

    /// Directory for output files
    #[arg(long = "out-dir", default_value = ".")]
    pub out_dir: PathBuf,

    /// Query the model for several frontier terms in parallel
    #[arg(long)]
    pub parallel: bool,

    /// Treat a failed neighbor query as "no neighbors" instead of aborting
    #[arg(long)]
    pub skip_oracle_errors: bool,

    /// Layout iterations for image output
    #[arg(long, default_value = "500")]
    pub iterations: usize,

    /// Pipe the animation log into a running `gource`
    #[arg(long)]
    pub gource: bool,

    /// Summary format
    #[arg(short = 'f', long = "format", default_value = "human")]
    pub output_format: OutputFormat,

    /// Pretty-print JSON output
    #[arg(long)]
    pub pretty: bool,

    /// Verbosity level (0=quiet, 1=normal, 2=verbose, 3=debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (overrides verbose)
    #[arg(short, long)]
    pub quiet: bool,
}

impl SemtreeArgs {
    /// Get the effective verbosity level
    pub fn verbosity(&self) -> u8 {
        if self.quiet {
            0
        } else {
            match self.verbose {
                0 => 1,
                n => n,
            }
        }
    }

    /// Traversal configuration derived from the flags.
    pub fn expander_config(&self) -> ExpanderConfig {
        ExpanderConfig::default()
            .max_neighbors(self.neighbors)
            .min_similarity(self.sim)
            .max_size(self.size)
            .size_metric(self.metric.into())
            .edge_policy(if self.directed {
                EdgePolicy::Directed
            } else {
                EdgePolicy::Undirected
            })
            .on_oracle_error(if self.skip_oracle_errors {
                OracleErrorPolicy::SkipTerm
            } else {
                OracleErrorPolicy::Abort
            })
    }
}

/// What to produce from the finished graph.
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// SVG rendering plus a GML file
    Image,
    /// Gource timeline log
    Animation,
    /// GML file only
    Gml,
    /// JSON snapshot only
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricArg {
    Nodes,
    Edges,
}

impl From<MetricArg> for SizeMetric {
    fn from(arg: MetricArg) -> Self {
        match arg {
            MetricArg::Nodes => SizeMetric::Nodes,
            MetricArg::Edges => SizeMetric::Edges,
        }
    }
}

/// Summary output formats
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable format
    Human,
    /// JSON format
    Json,
}
