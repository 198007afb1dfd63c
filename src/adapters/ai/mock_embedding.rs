//! Deterministic embedding provider for tests and offline runs.
//!
//! Each lowercase word is hashed into a bucket; the vector is the
//! L2-normalized bucket histogram. Texts sharing words land close together,
//! which is enough for retrieval tests to rank chunks meaningfully.

use async_trait::async_trait;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{EmbeddingError, EmbeddingProvider};

pub const MOCK_EMBEDDING_MODEL: &str = "mock-embedding-v1";
pub const MOCK_EMBEDDING_DIMENSIONS: usize = 64;

#[derive(Debug, Clone)]
pub struct MockEmbeddingProvider {
    dimensions: usize,
    model_id: String,
    delay: Duration,
    failing: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
}

impl Default for MockEmbeddingProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEmbeddingProvider {
    pub fn new() -> Self {
        Self {
            dimensions: MOCK_EMBEDDING_DIMENSIONS,
            model_id: MOCK_EMBEDDING_MODEL.to_string(),
            delay: Duration::ZERO,
            failing: Arc::new(AtomicBool::new(false)),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_dimensions(mut self, dimensions: usize) -> Self {
        self.dimensions = dimensions.max(1);
        self
    }

    pub fn with_model_id(mut self, model_id: impl Into<String>) -> Self {
        self.model_id = model_id.into();
        self
    }

    /// Sets simulated latency per call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Makes every subsequent call fail with `Unavailable`.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn vectorize(&self, text: &str) -> Vec<f32> {
        let mut vector = vec![0.0f32; self.dimensions];
        for token in text
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| !t.is_empty())
            .map(str::to_lowercase)
        {
            let mut hasher = DefaultHasher::new();
            token.hash(&mut hasher);
            vector[(hasher.finish() % self.dimensions as u64) as usize] += 1.0;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            vector.iter_mut().for_each(|v| *v /= norm);
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for MockEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(EmbeddingError::Unavailable("mock embedding failure".to_string()));
        }
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("cannot embed empty text".to_string()));
        }
        Ok(self.vectorize(text))
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}
