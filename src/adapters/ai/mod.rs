//! AI Provider Adapters.
//!
//! Implementations of the capability ports.
//!
//! ## Available Adapters
//!
//! - `MockAIProvider` - Configurable completion mock for testing
//! - `OpenAIProvider` - OpenAI-compatible chat completions
//! - `MockEmbeddingProvider` - Deterministic word-hash embeddings
//! - `OpenAIEmbeddingProvider` - OpenAI-compatible embeddings

mod mock_embedding;
mod mock_provider;
mod openai_embedding;
mod openai_provider;

pub use mock_embedding::{MockEmbeddingProvider, MOCK_EMBEDDING_DIMENSIONS, MOCK_EMBEDDING_MODEL};
pub use mock_provider::{MockAIProvider, MockError, MockResponse};
pub use openai_embedding::OpenAIEmbeddingProvider;
pub use openai_provider::{OpenAIConfig, OpenAIProvider};
