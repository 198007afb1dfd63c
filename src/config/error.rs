//! Configuration error types

use thiserror::Error;

/// Errors that can occur during configuration loading
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration loading failed: {0}")]
    LoadError(#[from] config::ConfigError),

    #[error("Validation failed: {0}")]
    ValidationFailed(#[from] ValidationError),
}

/// Errors that can occur during configuration validation
#[derive(Debug, Error, PartialEq)]
pub enum ValidationError {
    #[error("Required configuration missing: {0}")]
    MissingRequired(&'static str),

    #[error("{0} must be greater than zero")]
    MustBePositive(&'static str),

    #[error("{field} must be between {min} and {max}")]
    OutOfRange {
        field: &'static str,
        min: f64,
        max: f64,
    },

    #[error("chunk_overlap must be smaller than chunk_size")]
    OverlapTooLarge,

    #[error("Tier thresholds must satisfy 0 <= low <= moderate <= high <= 100")]
    UnorderedThresholds,

    #[error("Extraction and embedding timeouts must not exceed the completion timeout")]
    TimeoutOrdering,

    #[error("Invalid log level: {0}")]
    InvalidLogLevel(String),
}
