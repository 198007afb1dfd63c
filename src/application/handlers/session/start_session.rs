//! StartSessionHandler - Command handler for starting assessment sessions.

use std::sync::Arc;

use crate::application::errors::EngineError;
use crate::domain::conversation::templates::opening_message_for;
use crate::domain::conversation::{Message, MessageKind};
use crate::domain::foundation::{SessionType, StrategyId, SubjectId};
use crate::domain::session::Session;
use crate::ports::{MessageRepository, SessionRepository, StrategyRepository};

/// Command to start a new session.
#[derive(Debug, Clone)]
pub struct StartSessionCommand {
    pub strategy_id: StrategyId,
    pub subject_id: SubjectId,
    pub session_type: SessionType,
    /// JSON object, or null for an empty context.
    pub initial_context: serde_json::Value,
}

impl StartSessionCommand {
    pub fn new(strategy_id: StrategyId, subject_id: SubjectId, session_type: SessionType) -> Self {
        Self {
            strategy_id,
            subject_id,
            session_type,
            initial_context: serde_json::Value::Null,
        }
    }

    pub fn with_initial_context(mut self, context: serde_json::Value) -> Self {
        self.initial_context = context;
        self
    }
}

/// Result of a started session.
#[derive(Debug, Clone)]
pub struct StartSessionResult {
    pub session: Session,
    pub opening_message: Message,
}

/// Handler for starting sessions.
pub struct StartSessionHandler {
    strategies: Arc<dyn StrategyRepository>,
    sessions: Arc<dyn SessionRepository>,
    messages: Arc<dyn MessageRepository>,
}

impl StartSessionHandler {
    pub fn new(
        strategies: Arc<dyn StrategyRepository>,
        sessions: Arc<dyn SessionRepository>,
        messages: Arc<dyn MessageRepository>,
    ) -> Self {
        Self {
            strategies,
            sessions,
            messages,
        }
    }

    pub async fn handle(&self, cmd: StartSessionCommand) -> Result<StartSessionResult, EngineError> {
        // 1. Resolve the strategy
        let strategy = self
            .strategies
            .find_by_id(&cmd.strategy_id)
            .await?
            .ok_or_else(|| EngineError::strategy_not_found(&cmd.strategy_id))?;

        // 2. Create the session pinned to a snapshot
        let mut session = Session::start(&strategy, cmd.subject_id, cmd.session_type, cmd.initial_context)?;

        // 3. Opening question
        let at = session.next_message_timestamp();
        let opening_message =
            Message::assistant(*session.id(), MessageKind::Question, opening_message_for(&strategy), at)?
                .with_confidence(1.0);
        session.touch(at);

        // 4. Persist
        self.sessions.save(&session).await?;
        self.messages.append(&opening_message).await?;

        tracing::info!(
            session_id = %session.id(),
            strategy_id = %session.strategy_id(),
            strategy_version = session.strategy().version(),
            session_type = %session.session_type(),
            "Session started"
        );

        Ok(StartSessionResult {
            session,
            opening_message,
        })
    }
}
