//! Error types for the Versio library.
//!
//! All fallible operations return [`VersioError`] through the crate-wide
//! [`Result`] alias. Scoring is the one place where errors are *not*
//! propagated: the score computer folds them into the failure sentinel.
//!
//! # Examples
//!
//! ```
//! use versio::error::{Result, VersioError};
//!
//! fn check_system_count(systems: usize) -> Result<()> {
//!     if systems != 1 {
//!         return Err(VersioError::validation(format!(
//!             "expected exactly one system, found {systems}"
//!         )));
//!     }
//!     Ok(())
//! }
//!
//! assert!(check_system_count(2).is_err());
//! ```

use std::io;

use thiserror::Error;

/// The main error type for Versio operations.
#[derive(Error, Debug)]
pub enum VersioError {
    /// I/O errors (file operations)
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// Input rejected before any scoring took place (wrong extension,
    /// malformed markup, wrong language/system counts, bad selector)
    #[error("Validation error: {0}")]
    Validation(String),

    /// XML parse errors
    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    /// SGML document alignment errors
    #[error("Alignment error: {0}")]
    Alignment(String),

    /// Metric computation errors
    #[error("Scoring error: {0}")]
    Scoring(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error for other cases
    #[error("Error: {0}")]
    Other(String),
}

/// Result type alias for operations that may fail with VersioError.
pub type Result<T> = std::result::Result<T, VersioError>;

impl VersioError {
    /// Create a new validation error.
    pub fn validation<S: Into<String>>(msg: S) -> Self {
        VersioError::Validation(msg.into())
    }

    /// Create a new alignment error.
    pub fn alignment<S: Into<String>>(msg: S) -> Self {
        VersioError::Alignment(msg.into())
    }

    /// Create a new scoring error.
    pub fn scoring<S: Into<String>>(msg: S) -> Self {
        VersioError::Scoring(msg.into())
    }

    /// Create a new invalid argument error.
    pub fn invalid_argument<S: Into<String>>(msg: S) -> Self {
        VersioError::Other(format!("Invalid argument: {}", msg.into()))
    }

    /// Re-tag an error raised while reading an input file as a validation
    /// failure. Extraction never reports raw I/O or XML errors to callers.
    pub fn into_validation(self) -> Self {
        match self {
            VersioError::Validation(_) => self,
            other => VersioError::Validation(other.to_string()),
        }
    }

    /// Whether this error rejects the input (as opposed to an internal failure).
    pub fn is_validation(&self) -> bool {
        matches!(self, VersioError::Validation(_))
    }
}
