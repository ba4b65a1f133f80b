//! Error types for the earthchem library.

use thiserror::Error;

/// Main error type for the library.
#[derive(Error, Debug)]
pub enum EarthchemError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV parsing error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Invalid value '{value}' at row {row}, column {col}")]
    InvalidValue {
        value: String,
        row: usize,
        col: usize,
    },

    #[error("Dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Shape mismatch: {operation} expects {expected} columns, got {actual}")]
    ShapeMismatch {
        operation: String,
        expected: String,
        actual: usize,
    },

    #[error(
        "Input data has no base feature at index {index} ({n_parts} parts observed); \
         try a different base feature"
    )]
    BaseIndexOutOfRange { index: usize, n_parts: usize },

    #[error("Domain error: {0}")]
    Domain(String),

    #[error("Missing column '{0}'")]
    MissingColumn(String),

    #[error("Empty data: {0}")]
    EmptyData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Pipeline error: {0}")]
    Pipeline(String),

    #[error("Invalid pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("YAML serialization error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, EarthchemError>;
