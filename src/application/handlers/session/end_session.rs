//! EndSessionHandler - Command handler for completing sessions.

use std::sync::Arc;

use crate::application::errors::EngineError;
use crate::application::services::SessionLocks;
use crate::domain::foundation::SessionId;
use crate::domain::session::Session;
use crate::ports::SessionRepository;

/// Reason recorded when the caller gives none.
pub const END_REASON_REQUESTED: &str = "ended_by_request";

/// Command to end a session.
#[derive(Debug, Clone)]
pub struct EndSessionCommand {
    pub session_id: SessionId,
    pub reason: Option<String>,
}

impl EndSessionCommand {
    pub fn new(session_id: SessionId) -> Self {
        Self {
            session_id,
            reason: None,
        }
    }

    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }
}

/// Result of ending a session.
#[derive(Debug, Clone)]
pub struct EndSessionResult {
    pub session: Session,
    /// False when the session was already completed.
    pub changed: bool,
}

/// Handler for ending sessions.
///
/// Waits for any in-flight turn on the session, so the completion is only
/// visible after that turn persisted its reply.
pub struct EndSessionHandler {
    sessions: Arc<dyn SessionRepository>,
    locks: Arc<SessionLocks>,
}

impl EndSessionHandler {
    pub fn new(sessions: Arc<dyn SessionRepository>, locks: Arc<SessionLocks>) -> Self {
        Self { sessions, locks }
    }

    pub async fn handle(&self, cmd: EndSessionCommand) -> Result<EndSessionResult, EngineError> {
        let guard = self.locks.acquire(cmd.session_id).await;

        // 1. Load session
        let mut session = self
            .sessions
            .find_by_id(&cmd.session_id)
            .await?
            .ok_or_else(|| EngineError::session_not_found(cmd.session_id))?;

        // 2. Complete
        let reason = cmd.reason.unwrap_or_else(|| END_REASON_REQUESTED.to_string());
        let changed = session.complete(reason)?;

        // 3. Persist
        if changed {
            self.sessions.update(&session).await?;
            tracing::info!(
                session_id = %cmd.session_id,
                turns = session.turn_count(),
                reason = session.end_reason().unwrap_or_default(),
                "Session ended"
            );
        }

        drop(guard);
        self.locks.release(&cmd.session_id);

        Ok(EndSessionResult { session, changed })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::handlers::session::test_support::{screening_strategy, Fixture};
    use crate::domain::foundation::{ErrorCode, SessionStatus};

    fn handler(fixture: &Fixture) -> EndSessionHandler {
        EndSessionHandler::new(fixture.sessions.clone(), fixture.locks.clone())
    }

    #[tokio::test]
    async fn completes_active_session() {
        let fixture = Fixture::new();
        let session = fixture.started(&screening_strategy(10)).await;

        let result = handler(&fixture)
            .handle(EndSessionCommand::new(*session.id()).with_reason("patient left"))
            .await
            .unwrap();

        assert!(result.changed);
        assert_eq!(result.session.status(), SessionStatus::Completed);
        assert_eq!(result.session.end_reason(), Some("patient left"));
        let stored = fixture.sessions.find_by_id(session.id()).await.unwrap().unwrap();
        assert_eq!(stored.status(), SessionStatus::Completed);
        assert!(fixture.locks.is_empty());
    }

    #[tokio::test]
    async fn ending_twice_is_a_no_op() {
        let fixture = Fixture::new();
        let session = fixture.started(&screening_strategy(10)).await;
        let handler = handler(&fixture);

        let first = handler.handle(EndSessionCommand::new(*session.id())).await.unwrap();
        let second = handler
            .handle(EndSessionCommand::new(*session.id()).with_reason("again"))
            .await
            .unwrap();

        assert!(first.changed);
        assert!(!second.changed);
        assert_eq!(second.session.end_reason(), Some(END_REASON_REQUESTED));
        assert_eq!(second.session.completed_at(), first.session.completed_at());
    }

    #[tokio::test]
    async fn ends_paused_session() {
        let fixture = Fixture::new();
        let mut session = fixture.started(&screening_strategy(10)).await;
        session.pause().unwrap();
        fixture.sessions.update(&session).await.unwrap();

        let result = handler(&fixture).handle(EndSessionCommand::new(*session.id())).await.unwrap();

        assert_eq!(result.session.status(), SessionStatus::Completed);
    }

    #[tokio::test]
    async fn cancelled_session_cannot_end() {
        let fixture = Fixture::new();
        let mut session = fixture.started(&screening_strategy(10)).await;
        session.cancel("withdrawn").unwrap();
        fixture.sessions.update(&session).await.unwrap();

        let err = handler(&fixture)
            .handle(EndSessionCommand::new(*session.id()))
            .await
            .unwrap_err();

        assert!(err.is_invalid_state());
        assert_eq!(err.code(), ErrorCode::InvalidStateTransition);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let fixture = Fixture::new();

        let err = handler(&fixture)
            .handle(EndSessionCommand::new(SessionId::new()))
            .await
            .unwrap_err();

        assert!(err.is_not_found());
    }
}
