//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Completion and embedding providers (OpenAI-compatible, mock)
//! - `storage` - Repository implementations (in-memory, YAML files)

pub mod ai;
pub mod storage;

pub use ai::{MockAIProvider, MockEmbeddingProvider, OpenAIConfig, OpenAIEmbeddingProvider, OpenAIProvider};
pub use storage::{
    InMemoryAssessmentRepository, InMemoryKnowledgeChunkRepository, InMemoryKnowledgeSourceRepository,
    InMemoryMessageRepository, InMemorySessionRepository, InMemoryStrategyRepository, YamlStrategyRepository,
};
