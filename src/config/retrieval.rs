//! Knowledge indexing and retrieval configuration

use serde::Deserialize;

use super::error::ValidationError;

#[derive(Debug, Clone, Deserialize)]
pub struct RetrievalConfig {
    /// Target chunk length in characters
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Chunks retrieved per turn
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    #[serde(default = "default_min_similarity")]
    pub min_similarity: f32,

    /// Character budget for retrieved context in the system prompt
    #[serde(default = "default_max_context_chars")]
    pub max_context_chars: usize,

    #[serde(default = "default_indexing_workers")]
    pub indexing_workers: usize,

    #[serde(default = "default_queue_capacity")]
    pub indexing_queue_capacity: usize,

    /// Concurrent embedding calls while indexing one source
    #[serde(default = "default_embedding_concurrency")]
    pub embedding_concurrency: usize,
}

impl RetrievalConfig {
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.chunk_size == 0 {
            return Err(ValidationError::MustBePositive("chunk_size"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ValidationError::OverlapTooLarge);
        }
        if self.top_k == 0 {
            return Err(ValidationError::MustBePositive("top_k"));
        }
        if !(-1.0..=1.0).contains(&self.min_similarity) {
            return Err(ValidationError::OutOfRange {
                field: "min_similarity",
                min: -1.0,
                max: 1.0,
            });
        }
        if self.indexing_workers == 0 {
            return Err(ValidationError::MustBePositive("indexing_workers"));
        }
        if self.indexing_queue_capacity == 0 {
            return Err(ValidationError::MustBePositive("indexing_queue_capacity"));
        }
        if self.embedding_concurrency == 0 {
            return Err(ValidationError::MustBePositive("embedding_concurrency"));
        }
        Ok(())
    }
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            top_k: default_top_k(),
            min_similarity: default_min_similarity(),
            max_context_chars: default_max_context_chars(),
            indexing_workers: default_indexing_workers(),
            indexing_queue_capacity: default_queue_capacity(),
            embedding_concurrency: default_embedding_concurrency(),
        }
    }
}

fn default_chunk_size() -> usize {
    1000
}

fn default_chunk_overlap() -> usize {
    200
}

fn default_top_k() -> usize {
    5
}

fn default_min_similarity() -> f32 {
    0.7
}

fn default_max_context_chars() -> usize {
    4000
}

fn default_indexing_workers() -> usize {
    2
}

fn default_queue_capacity() -> usize {
    64
}

fn default_embedding_concurrency() -> usize {
    4
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retrieval_defaults() {
        let config = RetrievalConfig::default();
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.top_k, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk() {
        let config = RetrievalConfig {
            chunk_size: 100,
            chunk_overlap: 100,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ValidationError::OverlapTooLarge));
    }
}
