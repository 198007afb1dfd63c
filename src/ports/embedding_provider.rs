//! Embedding Provider Port - text to fixed-length vectors.
//!
//! The retrieval service assumes nothing about the vector space beyond a
//! fixed dimensionality and that `model_id` identifies it. Chunks embedded
//! under one model id are never compared with queries embedded under another.

use async_trait::async_trait;

/// Port for embedding text.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embeds one text.
    ///
    /// The returned vector always has `dimensions()` entries.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Vector length produced by this provider.
    fn dimensions(&self) -> usize;

    /// Identifier of the embedding space (model name and version).
    fn model_id(&self) -> &str;
}

/// Embedding provider errors.
#[derive(Debug, thiserror::Error)]
pub enum EmbeddingError {
    #[error("embedding provider unavailable: {0}")]
    Unavailable(String),

    #[error("authentication failed")]
    AuthenticationFailed,

    #[error("network error: {0}")]
    Network(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("expected {expected} dimensions, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("embedding timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },
}

impl EmbeddingError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, EmbeddingError::Timeout { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedding_provider_is_object_safe() {
        fn _accepts_dyn(_provider: &dyn EmbeddingProvider) {}
    }

    #[test]
    fn errors_render_details() {
        let err = EmbeddingError::DimensionMismatch { expected: 8, actual: 4 };
        assert_eq!(err.to_string(), "expected 8 dimensions, got 4");
        assert!(EmbeddingError::Timeout { timeout_ms: 5 }.is_timeout());
    }
}
