//! Error types for causal effect estimation.

use thiserror::Error;

/// Result type alias for estimation operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for estimation operations.
#[derive(Error, Debug)]
pub enum Error {
    // Input contract errors (10-19)
    #[error("shape mismatch in {context}: expected {expected}, got {actual}")]
    ShapeMismatch {
        context: String,
        expected: String,
        actual: String,
    },

    #[error("index {index} out of range for {context} of length {len}")]
    IndexOutOfRange {
        context: String,
        index: usize,
        len: usize,
    },

    #[error("no samples provided for {0}")]
    EmptySamples(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    // Metadata errors (20-29)
    #[error("invalid variables: {0}")]
    InvalidVariables(String),

    // Model and numeric errors (30-39)
    #[error("model query failed: {0}")]
    Model(String),

    #[error("numerical failure: {0}")]
    Numerical(String),

    // Capability errors (40-49)
    #[error("not implemented: {0}")]
    NotImplemented(&'static str),

    // I/O errors (60-69)
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Returns the error code for this error type.
    /// Used for detailed error reporting in JSON output.
    pub fn code(&self) -> u32 {
        match self {
            Error::ShapeMismatch { .. } => 10,
            Error::IndexOutOfRange { .. } => 11,
            Error::EmptySamples(_) => 12,
            Error::InvalidInput(_) => 13,
            Error::InvalidVariables(_) => 20,
            Error::Model(_) => 30,
            Error::Numerical(_) => 31,
            Error::NotImplemented(_) => 40,
            Error::Io(_) => 60,
            Error::Json(_) => 61,
        }
    }

    /// Shape mismatch between two matrix shapes.
    pub fn shape(context: impl Into<String>, expected: (usize, usize), actual: (usize, usize)) -> Self {
        Error::ShapeMismatch {
            context: context.into(),
            expected: format!("{}x{}", expected.0, expected.1),
            actual: format!("{}x{}", actual.0, actual.1),
        }
    }
}
