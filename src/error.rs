//! Error types for the semtree library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`SemtreeError`] enum.
//!
//! # Examples
//!
//! ```
//! use semtree::error::{Result, SemtreeError};
//!
//! fn example_operation() -> Result<()> {
//!     Err(SemtreeError::invalid_argument("max size must be positive"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for semtree operations.
#[derive(Error, Debug)]
pub enum SemtreeError {
    /// I/O errors (model files, exports)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// A term is unknown to the oracle and no fallback was requested
    #[error("Not found: {0}")]
    NotFound(String),

    /// The model file could not be read or decoded
    #[error("Model load error: {0}")]
    ModelLoad(String),

    /// The oracle failed while answering a neighbor query
    #[error("Oracle error: {0}")]
    Oracle(String),

    /// Writing an output artifact failed
    #[error("Export error: {0}")]
    Export(String),

    /// Invalid argument or configuration
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),

    /// Generic anyhow error
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with SemtreeError.
pub type Result<T> = std::result::Result<T, SemtreeError>;

impl SemtreeError {
    /// Create a new not found error.
    pub fn not_found<S: Into<String>>(msg: S) -> Self {
        SemtreeError::NotFound(msg.into())
    }

    /// Create a new model load error.
    pub fn model_load<S: Into<String>>(msg: S) -> Self {
        SemtreeError::ModelLoad(msg.into())
    }

    /// Create a new oracle error.
    pub fn oracle<S: Into<String>>(msg: S) -> Self {
        SemtreeError::Oracle(msg.into())
    }

    /// Create a new export error.
    pub fn export<S: Into<String>>(msg: S) -> Self {
        SemtreeError::Export(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        SemtreeError::InvalidArgument(msg.into())
    }

    /// Create a new generic error.
    pub fn other<S: Into<String>>(msg: S) -> Self {
        SemtreeError::Other(msg.into())
    }

    /// Whether this error means the queried term is missing from the vocabulary.
    pub fn is_not_found(&self) -> bool {
        matches!(self, SemtreeError::NotFound(_))
    }
}
