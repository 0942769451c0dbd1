//! Error types for clustermesh

use thiserror::Error;

/// Main error type for clustermesh operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed line-oriented input such as a merge log. `line` is 1-based.
    #[error("Parse error at line {line}: {message}")]
    Parse { line: usize, message: String },

    /// A tree or triangle reference escaped its expected bounds. Indicates a
    /// defect in forest reconstruction rather than bad end-user input.
    #[error("Structural invariant violated: {0}")]
    StructuralInvariant(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Clustering stage failed: {0}")]
    Clustering(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

impl Error {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        Error::Parse {
            line,
            message: message.into(),
        }
    }
}

/// Result type alias for clustermesh operations
pub type Result<T> = std::result::Result<T, Error>;
