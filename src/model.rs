//! Pretrained embedding models.
//!
//! This module loads word2vec-style embedding files and exposes the
//! term-vector capability the expander needs as a [`NeighborOracle`].
//!
//! # Module Structure
//!
//! - `vectors`: in-memory term vectors and the cosine [`EmbeddingOracle`]
//! - `loader`: text, binary and JSON model readers with kind detection
//!
//! [`NeighborOracle`]: crate::oracle::NeighborOracle

pub mod loader;
pub mod vectors;

use serde::{Deserialize, Serialize};

pub use self::loader::{LoadedModel, ModelFormat, load_model};
pub use self::vectors::{EmbeddingOracle, TermVectors};

/// Key prefix marking document tags in word2vec-format exports of
/// document-vector models.
pub const DOC_TAG_PREFIX: &str = "*dt_";

/// The two kinds of model the loader recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    /// Vectors for individual terms (word2vec).
    TermVectors,
    /// Vectors for documents, possibly alongside term vectors (doc2vec).
    DocumentVectors,
}

impl ModelKind {
    /// Get the display name of this model kind.
    pub fn name(&self) -> &'static str {
        match self {
            ModelKind::TermVectors => "Word2Vec",
            ModelKind::DocumentVectors => "Doc2Vec",
        }
    }
}
