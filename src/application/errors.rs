//! Engine-level error surfaced to callers of the orchestrator.
//!
//! Each variant carries a stable [`ErrorCode`] and a message. Capability
//! variants only escape from diagnostic calls; turn processing degrades
//! instead of returning them.

use thiserror::Error;

use crate::domain::foundation::{DomainError, ErrorCode};
use crate::ports::{AIError, EmbeddingError};

#[derive(Debug, Clone, Error)]
pub enum EngineError {
    #[error("{message}")]
    NotFound { code: ErrorCode, message: String },

    #[error("{message}")]
    InvalidState { code: ErrorCode, message: String },

    #[error("{message}")]
    Validation { code: ErrorCode, message: String },

    #[error("{message}")]
    CapabilityTimeout { message: String },

    #[error("{message}")]
    CapabilityError { message: String },

    #[error("{message}")]
    Infrastructure { code: ErrorCode, message: String },
}

impl EngineError {
    pub fn session_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            code: ErrorCode::SessionNotFound,
            message: format!("Session {} not found", id),
        }
    }

    pub fn strategy_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            code: ErrorCode::StrategyNotFound,
            message: format!("Strategy '{}' not found", id),
        }
    }

    pub fn source_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            code: ErrorCode::KnowledgeSourceNotFound,
            message: format!("Knowledge source {} not found", id),
        }
    }

    pub fn assessment_not_found(id: impl std::fmt::Display) -> Self {
        Self::NotFound {
            code: ErrorCode::AssessmentNotFound,
            message: format!("Session {} has no assessment yet", id),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            code: ErrorCode::ValidationFailed,
            message: message.into(),
        }
    }

    /// Stable code for API callers.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotFound { code, .. } | Self::InvalidState { code, .. } | Self::Validation { code, .. } => *code,
            Self::Infrastructure { code, .. } => *code,
            Self::CapabilityTimeout { .. } => ErrorCode::CapabilityTimeout,
            Self::CapabilityError { .. } => ErrorCode::CapabilityError,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::NotFound { message, .. }
            | Self::InvalidState { message, .. }
            | Self::Validation { message, .. }
            | Self::CapabilityTimeout { message }
            | Self::CapabilityError { message }
            | Self::Infrastructure { message, .. } => message,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    pub fn is_invalid_state(&self) -> bool {
        matches!(self, Self::InvalidState { .. })
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. })
    }
}

impl From<DomainError> for EngineError {
    fn from(err: DomainError) -> Self {
        let code = err.code;
        let message = err.message;
        match code {
            ErrorCode::ValidationFailed | ErrorCode::EmptyField | ErrorCode::OutOfRange | ErrorCode::InvalidFormat => {
                Self::Validation { code, message }
            }
            ErrorCode::InvalidStateTransition | ErrorCode::SessionNotActive => Self::InvalidState { code, message },
            ErrorCode::CapabilityTimeout => Self::CapabilityTimeout { message },
            ErrorCode::CapabilityError => Self::CapabilityError { message },
            code if code.is_not_found() => Self::NotFound { code, message },
            code => Self::Infrastructure { code, message },
        }
    }
}

impl From<EmbeddingError> for EngineError {
    fn from(err: EmbeddingError) -> Self {
        if err.is_timeout() {
            Self::CapabilityTimeout {
                message: err.to_string(),
            }
        } else {
            Self::CapabilityError {
                message: err.to_string(),
            }
        }
    }
}

impl From<AIError> for EngineError {
    fn from(err: AIError) -> Self {
        if err.is_timeout() {
            Self::CapabilityTimeout {
                message: err.to_string(),
            }
        } else {
            Self::CapabilityError {
                message: err.to_string(),
            }
        }
    }
}
