//! ExpireIdleSessionsHandler - Session timeout sweep.

use std::sync::Arc;
use std::time::Duration;

use crate::application::errors::EngineError;
use crate::application::services::SessionLocks;
use crate::domain::foundation::{SessionId, SessionStatus, Timestamp};
use crate::domain::session::END_REASON_TIMEOUT;
use crate::ports::SessionRepository;

/// Command to end every open session idle for longer than `idle_timeout`.
#[derive(Debug, Clone)]
pub struct ExpireIdleSessionsCommand {
    pub idle_timeout: Duration,
}

/// Sessions closed by one sweep.
#[derive(Debug, Clone, Default)]
pub struct ExpireIdleSessionsResult {
    pub expired: Vec<SessionId>,
    /// Sessions the sweep could not close; they are retried next sweep.
    pub failed: Vec<SessionId>,
}

/// Handler for the idle sweep.
pub struct ExpireIdleSessionsHandler {
    sessions: Arc<dyn SessionRepository>,
    locks: Arc<SessionLocks>,
}

impl ExpireIdleSessionsHandler {
    pub fn new(sessions: Arc<dyn SessionRepository>, locks: Arc<SessionLocks>) -> Self {
        Self { sessions, locks }
    }

    pub async fn handle(&self, cmd: ExpireIdleSessionsCommand) -> Result<ExpireIdleSessionsResult, EngineError> {
        let cutoff = Timestamp::now().minus_secs(cmd.idle_timeout.as_secs());
        let mut result = ExpireIdleSessionsResult::default();

        for status in [SessionStatus::Active, SessionStatus::Paused] {
            let candidates = self.sessions.list_by_status(status).await?;
            for candidate in candidates.iter().filter(|s| s.is_idle_since(&cutoff)) {
                let session_id = *candidate.id();
                match self.expire(session_id, &cutoff).await {
                    Ok(true) => result.expired.push(session_id),
                    Ok(false) => {}
                    Err(err) => {
                        tracing::warn!(session_id = %session_id, error = %err, "Failed to expire idle session");
                        result.failed.push(session_id);
                    }
                }
            }
        }

        if !result.expired.is_empty() || !result.failed.is_empty() {
            tracing::info!(
                expired = result.expired.len(),
                failed = result.failed.len(),
                "Idle sessions expired"
            );
        }
        Ok(result)
    }

    /// Re-checks the session under its lock; a turn may have landed since the listing.
    async fn expire(&self, session_id: SessionId, cutoff: &Timestamp) -> Result<bool, EngineError> {
        let guard = self.locks.acquire(session_id).await;
        let expired = self.expire_locked(session_id, cutoff).await;
        drop(guard);
        self.locks.release(&session_id);
        expired
    }

    async fn expire_locked(&self, session_id: SessionId, cutoff: &Timestamp) -> Result<bool, EngineError> {
        let Some(mut session) = self.sessions.find_by_id(&session_id).await? else {
            return Ok(false);
        };
        if !session.is_idle_since(cutoff) {
            return Ok(false);
        }

        session.complete(END_REASON_TIMEOUT)?;
        self.sessions.update(&session).await?;
        tracing::info!(
            session_id = %session_id,
            last_activity_at = ?session.last_activity_at(),
            "Session timed out"
        );
        Ok(true)
    }
}
