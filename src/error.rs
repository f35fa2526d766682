//! Error types for the Proxima library.
//!
//! All fallible operations return [`Result`], whose error side is the
//! [`ProximaError`] enum. An unknown query term is never an error: it
//! evaluates to an empty inverted list.
//!
//! # Examples
//!
//! ```
//! use proxima::error::{ProximaError, Result};
//!
//! fn example_operation() -> Result<()> {
//!     Err(ProximaError::malformed_query("#near/2 needs at least two arguments"))
//! }
//!
//! match example_operation() {
//!     Ok(_) => println!("Success"),
//!     Err(e) => eprintln!("Error: {}", e),
//! }
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Proxima operations.
#[derive(Error, Debug)]
pub enum ProximaError {
    /// Failure reported by the index access facade. Aborts the whole query.
    #[error("Index access error: {0}")]
    IndexAccess(String),

    /// An operator was evaluated under a retrieval model that has no
    /// formula for it.
    #[error("Unsupported combination: operator {operator} under the {model} model")]
    UnsupportedCombination {
        /// Operator name, e.g. `#WAND`.
        operator: String,
        /// Retrieval model name, e.g. `UnrankedBoolean`.
        model: String,
    },

    /// A model or configuration parameter outside its domain.
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Operator arity violations and query string syntax errors.
    #[error("Malformed query: {0}")]
    MalformedQuery(String),

    /// I/O errors (parameter files, index snapshots, result files).
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Failures carrying context, such as the file a CLI command could not
    /// read or write.
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Result type alias for operations that may fail with ProximaError.
pub type Result<T> = std::result::Result<T, ProximaError>;

impl ProximaError {
    /// Create a new index access error.
    pub fn index_access<S: Into<String>>(msg: S) -> Self {
        ProximaError::IndexAccess(msg.into())
    }

    /// Create a new unsupported combination error.
    pub fn unsupported<O: Into<String>, M: Into<String>>(operator: O, model: M) -> Self {
        ProximaError::UnsupportedCombination {
            operator: operator.into(),
            model: model.into(),
        }
    }

    /// Create a new invalid parameter error.
    pub fn invalid_parameter<S: Into<String>>(msg: S) -> Self {
        ProximaError::InvalidParameter(msg.into())
    }

    /// Create a new malformed query error.
    pub fn malformed_query<S: Into<String>>(msg: S) -> Self {
        ProximaError::MalformedQuery(msg.into())
    }

    /// Create a new parse error.
    pub fn parse<S: Into<String>>(msg: S) -> Self {
        ProximaError::MalformedQuery(msg.into()) // Parse errors are malformed queries
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_construction() {
        let error = ProximaError::index_access("segment missing");
        assert_eq!(error.to_string(), "Index access error: segment missing");

        let error = ProximaError::unsupported("#WAND", "RankedBoolean");
        assert_eq!(
            error.to_string(),
            "Unsupported combination: operator #WAND under the RankedBoolean model"
        );

        let error = ProximaError::invalid_parameter("b must lie in (0, 1)");
        assert_eq!(error.to_string(), "Invalid parameter: b must lie in (0, 1)");

        let error = ProximaError::parse("unbalanced parentheses");
        assert!(matches!(error, ProximaError::MalformedQuery(_)));
    }

    #[test]
    fn test_io_error_conversion() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "File not found");
        let proxima_error = ProximaError::from(io_error);

        match proxima_error {
            ProximaError::Io(_) => {} // Expected
            _ => panic!("Expected IO error variant"),
        }
    }
}
