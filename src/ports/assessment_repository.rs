//! Assessment history port.
//!
//! The session holds the current result; this keeps every result produced.

use crate::domain::assessment::AssessmentResult;
use crate::domain::foundation::{DomainError, SessionId};
use async_trait::async_trait;

#[async_trait]
pub trait AssessmentRepository: Send + Sync {
    /// Records a result for a session.
    async fn append(&self, session_id: &SessionId, result: &AssessmentResult) -> Result<(), DomainError>;

    /// Every result of a session, oldest first.
    async fn list_by_session(&self, session_id: &SessionId) -> Result<Vec<AssessmentResult>, DomainError>;
}
