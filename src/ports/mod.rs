//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the domain and the outside world. Adapters implement these ports.
//!
//! ## Capability Ports
//!
//! - `AIProvider` - Text completion for replies and model-assisted extraction
//! - `EmbeddingProvider` - Text embedding for retrieval
//!
//! ## Repository Ports
//!
//! - `SessionRepository` - Session aggregates
//! - `MessageRepository` - Append-only conversation log
//! - `StrategyRepository` - Read-only strategy lookup
//! - `KnowledgeSourceRepository` / `KnowledgeChunkRepository` - Knowledge store
//! - `AssessmentRepository` - Assessment history

mod ai_provider;
mod assessment_repository;
mod embedding_provider;
mod knowledge_repository;
mod message_repository;
mod session_repository;
mod strategy_repository;

pub use ai_provider::{
    AIError, AIProvider, CompletionRequest, CompletionResponse, FinishReason, Message, MessageRole, ProviderInfo,
    RequestMetadata, RequestPurpose, TokenUsage,
};
pub use assessment_repository::AssessmentRepository;
pub use embedding_provider::{EmbeddingError, EmbeddingProvider};
pub use knowledge_repository::{
    ChunkSearch, ChunkSearchResult, KnowledgeChunkRepository, KnowledgeSourceRepository, StaleChunks,
};
pub use message_repository::MessageRepository;
pub use session_repository::SessionRepository;
pub use strategy_repository::StrategyRepository;
