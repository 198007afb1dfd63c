//! OpenAI embeddings adapter.
//!
//! Calls `POST {base_url}/embeddings` and checks the returned vector length
//! against the configured dimensionality.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::openai_provider::{check_status, transport_error, with_retries, OpenAIConfig};
use crate::ports::{AIError, EmbeddingError, EmbeddingProvider};

/// Embedding provider backed by an OpenAI-compatible embeddings endpoint.
pub struct OpenAIEmbeddingProvider {
    config: OpenAIConfig,
    client: Client,
    dimensions: usize,
}

impl OpenAIEmbeddingProvider {
    pub fn new(config: OpenAIConfig, dimensions: usize) -> Result<Self, EmbeddingError> {
        if dimensions == 0 {
            return Err(EmbeddingError::InvalidInput("dimensions must be positive".to_string()));
        }
        let client = config
            .build_client()
            .map_err(|e| EmbeddingError::Unavailable(format!("Failed to create HTTP client: {}", e)))?;
        Ok(Self {
            config,
            client,
            dimensions,
        })
    }

    async fn send_once(&self, body: &EmbeddingRequest<'_>) -> Result<EmbeddingResponse, AIError> {
        let response = self
            .client
            .post(format!("{}/embeddings", self.config.base_url))
            .bearer_auth(self.config.api_key())
            .json(body)
            .send()
            .await
            .map_err(|e| transport_error(e, self.config.timeout))?;

        check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| AIError::parse(format!("Failed to parse embedding response: {}", e)))
    }
}

fn to_embedding_error(err: AIError) -> EmbeddingError {
    match err {
        AIError::AuthenticationFailed => EmbeddingError::AuthenticationFailed,
        AIError::Timeout { timeout_ms } => EmbeddingError::Timeout { timeout_ms },
        AIError::Network(message) => EmbeddingError::Network(message),
        AIError::Parse(message) => EmbeddingError::Parse(message),
        AIError::InvalidRequest(message) => EmbeddingError::InvalidInput(message),
        other => EmbeddingError::Unavailable(other.to_string()),
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddingProvider {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        if text.trim().is_empty() {
            return Err(EmbeddingError::InvalidInput("cannot embed empty text".to_string()));
        }

        let body = EmbeddingRequest {
            model: &self.config.model,
            input: text,
            dimensions: self.dimensions,
        };
        let response = with_retries(self.config.max_retries, || self.send_once(&body))
            .await
            .map_err(to_embedding_error)?;

        let embedding = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| EmbeddingError::Parse("No embedding in response".to_string()))?;

        if embedding.len() != self.dimensions {
            return Err(EmbeddingError::DimensionMismatch {
                expected: self.dimensions,
                actual: embedding.len(),
            });
        }
        Ok(embedding)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model_id(&self) -> &str {
        &self.config.model
    }
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a str,
    dimensions: usize,
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider() -> OpenAIEmbeddingProvider {
        OpenAIEmbeddingProvider::new(OpenAIConfig::new("k").with_model("text-embedding-3-small"), 1536).unwrap()
    }

    #[test]
    fn reports_model_and_dimensions() {
        let provider = provider();
        assert_eq!(provider.model_id(), "text-embedding-3-small");
        assert_eq!(provider.dimensions(), 1536);
    }

    #[test]
    fn rejects_zero_dimensions() {
        let result = OpenAIEmbeddingProvider::new(OpenAIConfig::new("k"), 0);
        assert!(matches!(result, Err(EmbeddingError::InvalidInput(_))));
    }

    #[tokio::test]
    async fn empty_text_is_rejected_without_a_request() {
        let err = provider().embed("   ").await.unwrap_err();
        assert!(matches!(err, EmbeddingError::InvalidInput(_)));
    }

    #[test]
    fn maps_transport_errors() {
        assert!(to_embedding_error(AIError::timeout(5000)).is_timeout());
        assert!(matches!(
            to_embedding_error(AIError::AuthenticationFailed),
            EmbeddingError::AuthenticationFailed
        ));
        assert!(matches!(
            to_embedding_error(AIError::rate_limited(3)),
            EmbeddingError::Unavailable(_)
        ));
    }
}
