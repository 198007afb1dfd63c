//! Errors raised inside individual extractors.
//!
//! The pipeline swallows every one of these; they exist for logging.

use thiserror::Error;

#[derive(Debug, Clone, Error, PartialEq)]
pub enum ExtractionError {
    #[error("Invalid pattern for '{entity}': {reason}")]
    InvalidPattern { entity: String, reason: String },

    #[error("Extraction timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("Extraction capability failed: {0}")]
    Capability(String),

    #[error("Malformed extraction output: {0}")]
    Malformed(String),

    #[error("Expected {expected} value, found {found}")]
    TypeMismatch { expected: String, found: String },
}
