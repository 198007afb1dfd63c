//! ChangeSessionStatusHandler - Pause, resume, cancel or fail a session.

use std::sync::Arc;

use crate::application::errors::EngineError;
use crate::application::services::SessionLocks;
use crate::domain::foundation::SessionId;
use crate::domain::session::Session;
use crate::ports::SessionRepository;

/// Requested lifecycle change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusChange {
    Pause,
    Resume,
    Cancel { reason: String },
    Fail { reason: String },
}

impl StatusChange {
    fn name(&self) -> &'static str {
        match self {
            StatusChange::Pause => "pause",
            StatusChange::Resume => "resume",
            StatusChange::Cancel { .. } => "cancel",
            StatusChange::Fail { .. } => "fail",
        }
    }

    fn closes(&self) -> bool {
        matches!(self, StatusChange::Cancel { .. } | StatusChange::Fail { .. })
    }
}

/// Command to change a session's lifecycle status.
#[derive(Debug, Clone)]
pub struct ChangeSessionStatusCommand {
    pub session_id: SessionId,
    pub change: StatusChange,
}

/// Handler for lifecycle changes other than completion.
pub struct ChangeSessionStatusHandler {
    sessions: Arc<dyn SessionRepository>,
    locks: Arc<SessionLocks>,
}

impl ChangeSessionStatusHandler {
    pub fn new(sessions: Arc<dyn SessionRepository>, locks: Arc<SessionLocks>) -> Self {
        Self { sessions, locks }
    }

    pub async fn handle(&self, cmd: ChangeSessionStatusCommand) -> Result<Session, EngineError> {
        let guard = self.locks.acquire(cmd.session_id).await;

        let mut session = self
            .sessions
            .find_by_id(&cmd.session_id)
            .await?
            .ok_or_else(|| EngineError::session_not_found(cmd.session_id))?;
        let from = session.status();

        let action = cmd.change.name();
        let closes = cmd.change.closes();
        match cmd.change {
            StatusChange::Pause => session.pause()?,
            StatusChange::Resume => session.resume()?,
            StatusChange::Cancel { reason } => session.cancel(reason)?,
            StatusChange::Fail { reason } => session.fail(reason)?,
        }

        self.sessions.update(&session).await?;
        tracing::info!(
            session_id = %cmd.session_id,
            action,
            from = %from,
            to = %session.status(),
            "Session status changed"
        );

        drop(guard);
        if closes {
            self.locks.release(&cmd.session_id);
        }

        Ok(session)
    }
}
