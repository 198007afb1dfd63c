//! In-memory assessment history.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::assessment::AssessmentResult;
use crate::domain::foundation::{DomainError, SessionId};
use crate::ports::AssessmentRepository;

#[derive(Debug, Clone, Default)]
pub struct InMemoryAssessmentRepository {
    results: Arc<RwLock<HashMap<SessionId, Vec<AssessmentResult>>>>,
}

impl InMemoryAssessmentRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AssessmentRepository for InMemoryAssessmentRepository {
    async fn append(&self, session_id: &SessionId, result: &AssessmentResult) -> Result<(), DomainError> {
        self.results
            .write()
            .await
            .entry(*session_id)
            .or_default()
            .push(result.clone());
        Ok(())
    }

    async fn list_by_session(&self, session_id: &SessionId) -> Result<Vec<AssessmentResult>, DomainError> {
        Ok(self.results.read().await.get(session_id).cloned().unwrap_or_default())
    }
}
