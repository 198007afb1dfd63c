//! Storage Adapters
//!
//! Implementations of the repository ports.
//!
//! ## Available Adapters
//!
//! - **InMemory*Repository** - Process-local storage (testing/development)
//! - **YamlStrategyRepository** - Strategy documents read from a directory
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{InMemorySessionRepository, YamlStrategyRepository};
//!
//! let strategies = YamlStrategyRepository::new("./strategies");
//! let sessions = InMemorySessionRepository::new();
//! ```

mod in_memory_assessment_repository;
mod in_memory_knowledge_repository;
mod in_memory_message_repository;
mod in_memory_session_repository;
mod in_memory_strategy_repository;
mod yaml_strategy_repository;

pub use in_memory_assessment_repository::InMemoryAssessmentRepository;
pub use in_memory_knowledge_repository::{InMemoryKnowledgeChunkRepository, InMemoryKnowledgeSourceRepository};
pub use in_memory_message_repository::InMemoryMessageRepository;
pub use in_memory_session_repository::InMemorySessionRepository;
pub use in_memory_strategy_repository::InMemoryStrategyRepository;
pub use yaml_strategy_repository::YamlStrategyRepository;
