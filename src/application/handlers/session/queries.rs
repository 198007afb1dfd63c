//! Session query handlers.
//!
//! Reads never take the session lock; they see the last persisted state.

use std::sync::Arc;

use crate::application::errors::EngineError;
use crate::domain::assessment::AssessmentResult;
use crate::domain::conversation::Message;
use crate::domain::foundation::SessionId;
use crate::domain::session::Session;
use crate::ports::{AssessmentRepository, MessageRepository, SessionRepository};

/// Handler for reading one session.
pub struct GetSessionHandler {
    sessions: Arc<dyn SessionRepository>,
}

impl GetSessionHandler {
    pub fn new(sessions: Arc<dyn SessionRepository>) -> Self {
        Self { sessions }
    }

    pub async fn handle(&self, session_id: &SessionId) -> Result<Session, EngineError> {
        self.sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| EngineError::session_not_found(session_id))
    }
}

/// Handler for the ordered message log of a session.
pub struct ListMessagesHandler {
    sessions: Arc<dyn SessionRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl ListMessagesHandler {
    pub fn new(sessions: Arc<dyn SessionRepository>, messages: Arc<dyn MessageRepository>) -> Self {
        Self { sessions, messages }
    }

    pub async fn handle(&self, session_id: &SessionId) -> Result<Vec<Message>, EngineError> {
        if self.sessions.find_by_id(session_id).await?.is_none() {
            return Err(EngineError::session_not_found(session_id));
        }
        Ok(self.messages.list_by_session(session_id).await?)
    }
}

/// Handler for the current assessment and its history.
pub struct GetAssessmentHandler {
    sessions: Arc<dyn SessionRepository>,
    assessments: Arc<dyn AssessmentRepository>,
}

impl GetAssessmentHandler {
    pub fn new(sessions: Arc<dyn SessionRepository>, assessments: Arc<dyn AssessmentRepository>) -> Self {
        Self { sessions, assessments }
    }

    /// Current assessment; `NotFound` until one has been computed.
    pub async fn current(&self, session_id: &SessionId) -> Result<AssessmentResult, EngineError> {
        let session = self
            .sessions
            .find_by_id(session_id)
            .await?
            .ok_or_else(|| EngineError::session_not_found(session_id))?;
        session
            .last_assessment()
            .cloned()
            .ok_or_else(|| EngineError::assessment_not_found(session_id))
    }

    /// Every assessment computed for the session, oldest first.
    pub async fn history(&self, session_id: &SessionId) -> Result<Vec<AssessmentResult>, EngineError> {
        if self.sessions.find_by_id(session_id).await?.is_none() {
            return Err(EngineError::session_not_found(session_id));
        }
        Ok(self.assessments.list_by_session(session_id).await?)
    }
}
