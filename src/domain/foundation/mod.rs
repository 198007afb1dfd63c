//! Foundation module - Shared domain primitives.
//!
//! Contains value objects, identifiers, enums, and error types
//! that form the vocabulary of the intake domain.

mod errors;
mod ids;
mod session_status;
mod session_type;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::{ChunkId, KnowledgeSourceId, MessageId, SessionId, StrategyId, SubjectId};
pub use session_status::SessionStatus;
pub use session_type::SessionType;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
