//! ProcessTurnHandler - Command handler for one conversational turn.
//!
//! A turn runs under the session lock in a fixed order:
//!
//! 1. Persist the user message
//! 2. Extract facts and merge them into the session
//! 3. Retrieve grounding context from the strategy's knowledge sources
//! 4. Build the completion request
//! 5. Complete under a timeout, falling back to the rule-based responder
//! 6. Persist the assistant message
//! 7. Assess once enough facts are known
//! 8. Complete the session at its turn limit
//!
//! Extraction and retrieval degrade to empty results. The completion call
//! degrades to the fallback responder. Only persistence errors abort a turn.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::time::timeout;

use crate::application::errors::EngineError;
use crate::application::services::{ExtractionPipeline, RetrievalService, RetrievedContext, SessionLocks};
use crate::domain::assessment::{AssessmentEngine, AssessmentResult};
use crate::domain::conversation::{prompt, FallbackResponder, Message, MessageKind, Role};
use crate::domain::extraction::ExtractionContext;
use crate::domain::fact::Facts;
use crate::domain::foundation::SessionId;
use crate::domain::session::{Session, END_REASON_MAX_TURNS};
use crate::ports::{
    AIProvider, AssessmentRepository, CompletionRequest, MessageRepository, MessageRole, RequestMetadata,
    RequestPurpose, SessionRepository,
};

/// Command to process one user utterance.
#[derive(Debug, Clone)]
pub struct ProcessTurnCommand {
    pub session_id: SessionId,
    pub content: String,
    /// Stored on the user message as-is.
    pub metadata: serde_json::Value,
}

impl ProcessTurnCommand {
    pub fn new(session_id: SessionId, content: impl Into<String>) -> Self {
        Self {
            session_id,
            content: content.into(),
            metadata: serde_json::Value::Null,
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// Everything a processed turn produced.
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub user_message: Message,
    pub assistant_message: Message,
    /// Facts extracted from this utterance alone.
    pub new_facts: Facts,
    /// Assessment computed during this turn, if any.
    pub assessment: Option<AssessmentResult>,
    pub used_fallback: bool,
    /// Session state after the turn.
    pub session: Session,
}

/// Tunables for turn processing.
#[derive(Debug, Clone)]
pub struct TurnSettings {
    /// Number of prior user/assistant messages sent to the model.
    pub history_window: usize,
    pub min_facts_for_assessment: usize,
    /// Confidence recorded on fallback replies.
    pub fallback_confidence: f64,
    pub completion_timeout: Duration,
    pub max_tokens: u32,
    pub temperature: f32,
}

impl Default for TurnSettings {
    fn default() -> Self {
        Self {
            history_window: 10,
            min_facts_for_assessment: 3,
            fallback_confidence: 0.5,
            completion_timeout: Duration::from_secs(30),
            max_tokens: 500,
            temperature: 0.7,
        }
    }
}

struct Reply {
    content: String,
    confidence: f64,
    fallback: bool,
}

/// Handler for processing turns.
pub struct ProcessTurnHandler {
    sessions: Arc<dyn SessionRepository>,
    messages: Arc<dyn MessageRepository>,
    assessments: Arc<dyn AssessmentRepository>,
    completion: Arc<dyn AIProvider>,
    extraction: Arc<ExtractionPipeline>,
    retrieval: Arc<RetrievalService>,
    locks: Arc<SessionLocks>,
    engine: AssessmentEngine,
    fallback: FallbackResponder,
    settings: TurnSettings,
}

impl ProcessTurnHandler {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        messages: Arc<dyn MessageRepository>,
        assessments: Arc<dyn AssessmentRepository>,
        completion: Arc<dyn AIProvider>,
        extraction: Arc<ExtractionPipeline>,
        retrieval: Arc<RetrievalService>,
        locks: Arc<SessionLocks>,
        engine: AssessmentEngine,
        settings: TurnSettings,
    ) -> Self {
        Self {
            sessions,
            messages,
            assessments,
            completion,
            extraction,
            retrieval,
            locks,
            engine,
            fallback: FallbackResponder::new(),
            settings,
        }
    }

    pub async fn handle(&self, cmd: ProcessTurnCommand) -> Result<TurnOutcome, EngineError> {
        let started = Instant::now();
        if cmd.content.trim().is_empty() {
            return Err(EngineError::validation("Turn content must not be empty"));
        }

        let guard = self.locks.acquire(cmd.session_id).await;

        let mut session = self
            .sessions
            .find_by_id(&cmd.session_id)
            .await?
            .ok_or_else(|| EngineError::session_not_found(cmd.session_id))?;
        session.ensure_accepts_turns()?;

        // 1. Persist the inbound message
        let received_at = session.next_message_timestamp();
        let user_message =
            Message::user(cmd.session_id, cmd.content.as_str(), received_at)?.with_metadata(cmd.metadata);
        self.messages.append(&user_message).await?;
        let turn = session.record_turn(received_at)?;

        // 2. Extract and merge facts
        let context = ExtractionContext::new(
            session.facts().clone(),
            session.strategy().extraction_rules().to_vec(),
        );
        let extraction = self.extraction.extract(&cmd.content, &context).await;
        for diagnostic in extraction.failed_rules() {
            tracing::warn!(
                session_id = %cmd.session_id,
                entity = %diagnostic.entity,
                method = diagnostic.method,
                status = ?diagnostic.status,
                "Extraction rule failed"
            );
        }
        let new_facts = extraction.facts;
        let changed = session.merge_facts(&new_facts);
        tracing::debug!(session_id = %cmd.session_id, turn, changed = ?changed, "Facts merged");

        // 3. Retrieve grounding context
        let retrieved = self
            .retrieval
            .retrieve_context(&cmd.content, session.strategy().knowledge_source_ids())
            .await;

        // 4-5. Generate the reply
        let history = self.messages.list_by_session(&cmd.session_id).await?;
        let reply = self.generate_reply(&session, &retrieved, &history, turn).await;

        // 6. Persist the outbound message
        let replied_at = session.next_message_timestamp();
        let mut assistant_message = Message::assistant(cmd.session_id, MessageKind::Question, reply.content, replied_at)?
            .with_confidence(reply.confidence)
            .with_sources(retrieved.sources.clone())
            .with_processing_ms(started.elapsed().as_millis() as u64)
            .with_metadata(serde_json::json!({
                "fallback": reply.fallback,
                "context_truncated": retrieved.truncated,
            }));
        if !new_facts.is_empty() {
            assistant_message = assistant_message.with_extracted_facts(new_facts.clone());
        }
        self.messages.append(&assistant_message).await?;
        session.touch(replied_at);

        // 7. Assess when enough is known
        let assessment = if session.facts().len() >= self.settings.min_facts_for_assessment {
            let result = self.engine.assess(session.facts(), session.strategy().criteria());
            session.set_assessment(result.clone());
            if let Err(err) = self.assessments.append(&cmd.session_id, &result).await {
                tracing::warn!(session_id = %cmd.session_id, error = %err, "Failed to record assessment history");
            }
            tracing::info!(
                session_id = %cmd.session_id,
                turn,
                tier = ?result.tier,
                percentage = result.percentage,
                "Assessment updated"
            );
            Some(result)
        } else {
            None
        };

        // 8. Close at the turn limit
        let closed = session.has_reached_max_turns();
        if closed {
            session.complete(END_REASON_MAX_TURNS)?;
            tracing::info!(session_id = %cmd.session_id, turn, "Session reached its turn limit");
        }

        self.sessions.update(&session).await?;
        if closed {
            drop(guard);
            self.locks.release(&cmd.session_id);
        }

        tracing::info!(
            session_id = %cmd.session_id,
            turn,
            facts = session.facts().len(),
            fallback = reply.fallback,
            latency_ms = started.elapsed().as_millis() as u64,
            "Turn processed"
        );

        Ok(TurnOutcome {
            user_message,
            assistant_message,
            new_facts,
            assessment,
            used_fallback: reply.fallback,
            session,
        })
    }

    async fn generate_reply(
        &self,
        session: &Session,
        retrieved: &RetrievedContext,
        history: &[Message],
        turn: u32,
    ) -> Reply {
        let snapshot = session.strategy();
        let context = (!retrieved.is_empty()).then_some(retrieved.text.as_str());
        let mut request = CompletionRequest::new(RequestMetadata::new(*session.id(), RequestPurpose::Reply))
            .with_system_prompt(prompt::system_prompt(snapshot.name(), snapshot.goal(), context, session.facts()))
            .with_max_tokens(self.settings.max_tokens)
            .with_temperature(self.settings.temperature);
        for message in prompt::history_window(history, self.settings.history_window) {
            request = request.with_message(message_role(message.role()), message.content());
        }

        let failure = match timeout(self.settings.completion_timeout, self.completion.complete(request)).await {
            Ok(Ok(response)) if !response.content.trim().is_empty() => {
                return Reply {
                    content: response.content,
                    confidence: 1.0,
                    fallback: false,
                };
            }
            Ok(Ok(_)) => "empty completion".to_string(),
            Ok(Err(err)) => err.to_string(),
            Err(_) => format!("timed out after {}ms", self.settings.completion_timeout.as_millis()),
        };

        tracing::warn!(
            session_id = %session.id(),
            turn,
            reason = %failure,
            "Completion unavailable, using fallback responder"
        );

        Reply {
            content: self
                .fallback
                .respond(session.facts(), &snapshot.criteria().required_facts, turn),
            confidence: self.settings.fallback_confidence,
            fallback: true,
        }
    }
}

fn message_role(role: Role) -> MessageRole {
    match role {
        Role::System => MessageRole::System,
        Role::User => MessageRole::User,
        Role::Assistant => MessageRole::Assistant,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::ai::{MockAIProvider, MockEmbeddingProvider, MockError};
    use crate::application::handlers::session::test_support::{retrieval, screening_strategy, Fixture};
    use crate::domain::assessment::RecommendationTier;
    use crate::domain::fact::FactValue;
    use crate::domain::foundation::{ErrorCode, SessionStatus};
    use crate::domain::session::END_REASON_MAX_TURNS as MAX_TURNS_REASON;

    struct Harness {
        fixture: Fixture,
        provider: MockAIProvider,
        embeddings: MockEmbeddingProvider,
        handler: ProcessTurnHandler,
    }

    fn harness(provider: MockAIProvider, settings: TurnSettings) -> Harness {
        let fixture = Fixture::new();
        let embeddings = MockEmbeddingProvider::new();
        let completion: Arc<dyn AIProvider> = Arc::new(provider.clone());
        let handler = ProcessTurnHandler::new(
            fixture.sessions.clone(),
            fixture.messages.clone(),
            fixture.assessments.clone(),
            completion.clone(),
            Arc::new(ExtractionPipeline::new(completion, Duration::from_secs(1))),
            Arc::new(retrieval(embeddings.clone())),
            fixture.locks.clone(),
            AssessmentEngine::default(),
            settings,
        );
        Harness {
            fixture,
            provider,
            embeddings,
            handler,
        }
    }

    fn settings() -> TurnSettings {
        TurnSettings {
            min_facts_for_assessment: 1,
            completion_timeout: Duration::from_millis(500),
            ..TurnSettings::default()
        }
    }

    #[tokio::test]
    async fn persists_user_and_assistant_messages_in_order() {
        let h = harness(MockAIProvider::new().with_response("How long have you smoked?"), settings());
        let session = h.fixture.started(&screening_strategy(10)).await;

        let outcome = h
            .handler
            .handle(ProcessTurnCommand::new(*session.id(), "I am 30 years old and I smoke"))
            .await
            .unwrap();

        assert_eq!(outcome.assistant_message.content(), "How long have you smoked?");
        assert_eq!(outcome.assistant_message.confidence(), Some(1.0));
        assert!(!outcome.used_fallback);
        assert!(outcome.assistant_message.processing_ms().is_some());
        assert_eq!(outcome.new_facts.get("age"), Some(&FactValue::Integer(30)));
        assert_eq!(outcome.new_facts.get("smoker"), Some(&FactValue::Boolean(true)));
        assert_eq!(outcome.assistant_message.extracted_facts(), Some(&outcome.new_facts));
        assert_eq!(outcome.session.turn_count(), 1);

        let stored = h.fixture.messages.list_by_session(session.id()).await.unwrap();
        let roles: Vec<Role> = stored.iter().map(|m| m.role()).collect();
        assert_eq!(roles, vec![Role::Assistant, Role::User, Role::Assistant]);
        assert_eq!(stored[1].id(), outcome.user_message.id());
        assert!(stored[1].created_at().is_before(stored[2].created_at()));
    }

    #[tokio::test]
    async fn assesses_once_enough_facts_are_known() {
        let h = harness(MockAIProvider::new(), settings());
        let session = h.fixture.started(&screening_strategy(10)).await;

        let outcome = h
            .handler
            .handle(ProcessTurnCommand::new(*session.id(), "I'm 42 years old"))
            .await
            .unwrap();

        let assessment = outcome.assessment.unwrap();
        assert_eq!(assessment.tier, Some(RecommendationTier::HighPriority));
        assert_eq!(assessment.recommendation.as_deref(), Some("Book a screening visit."));
        assert_eq!(outcome.session.last_assessment(), Some(&assessment));
        let history = h.fixture.assessments.list_by_session(session.id()).await.unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn skips_assessment_below_fact_threshold() {
        let h = harness(
            MockAIProvider::new(),
            TurnSettings {
                min_facts_for_assessment: 3,
                ..settings()
            },
        );
        let session = h.fixture.started(&screening_strategy(10)).await;

        let outcome = h
            .handler
            .handle(ProcessTurnCommand::new(*session.id(), "I'm 42 years old"))
            .await
            .unwrap();

        assert!(outcome.assessment.is_none());
        assert!(outcome.session.last_assessment().is_none());
    }

    #[tokio::test]
    async fn completion_timeout_falls_back() {
        let h = harness(
            MockAIProvider::new().with_delay(Duration::from_millis(200)),
            TurnSettings {
                completion_timeout: Duration::from_millis(20),
                ..settings()
            },
        );
        let session = h.fixture.started(&screening_strategy(10)).await;

        let outcome = h
            .handler
            .handle(ProcessTurnCommand::new(*session.id(), "hello"))
            .await
            .unwrap();

        assert!(outcome.used_fallback);
        assert_eq!(outcome.assistant_message.confidence(), Some(0.5));
        assert!(outcome.assistant_message.content().contains("age"));
        assert_eq!(outcome.assistant_message.metadata()["fallback"], serde_json::json!(true));
        let stored = h.fixture.messages.list_by_session(session.id()).await.unwrap();
        assert_eq!(stored.iter().filter(|m| m.is_assistant()).count(), 2);
    }

    #[tokio::test]
    async fn provider_error_falls_back() {
        let h = harness(
            MockAIProvider::new().with_error(MockError::Unavailable {
                message: "maintenance".to_string(),
            }),
            settings(),
        );
        let session = h.fixture.started(&screening_strategy(10)).await;

        let outcome = h
            .handler
            .handle(ProcessTurnCommand::new(*session.id(), "I am 50 years old"))
            .await
            .unwrap();

        assert!(outcome.used_fallback);
        assert!(outcome.assistant_message.confidence().unwrap() < 1.0);
        assert!(outcome.assistant_message.content().contains("smoker"));
    }

    #[tokio::test]
    async fn turn_limit_completes_session() {
        let h = harness(MockAIProvider::new(), settings());
        let session = h.fixture.started(&screening_strategy(1)).await;

        let outcome = h
            .handler
            .handle(ProcessTurnCommand::new(*session.id(), "hello"))
            .await
            .unwrap();
        assert_eq!(outcome.session.status(), SessionStatus::Completed);
        assert_eq!(outcome.session.end_reason(), Some(MAX_TURNS_REASON));
        assert!(h.fixture.locks.is_empty());

        let err = h
            .handler
            .handle(ProcessTurnCommand::new(*session.id(), "one more"))
            .await
            .unwrap_err();
        assert!(err.is_invalid_state());
        assert_eq!(err.code(), ErrorCode::SessionNotActive);
    }

    #[tokio::test]
    async fn rejects_empty_content() {
        let h = harness(MockAIProvider::new(), settings());
        let session = h.fixture.started(&screening_strategy(10)).await;

        let err = h
            .handler
            .handle(ProcessTurnCommand::new(*session.id(), "   "))
            .await
            .unwrap_err();

        assert!(err.is_validation());
        assert_eq!(h.fixture.messages.count_by_session(session.id()).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn unknown_session_is_not_found() {
        let h = harness(MockAIProvider::new(), settings());

        let err = h
            .handler
            .handle(ProcessTurnCommand::new(SessionId::new(), "hello"))
            .await
            .unwrap_err();

        assert_eq!(err.code(), ErrorCode::SessionNotFound);
    }

    #[tokio::test]
    async fn paused_session_rejects_turns() {
        let h = harness(MockAIProvider::new(), settings());
        let mut session = h.fixture.started(&screening_strategy(10)).await;
        session.pause().unwrap();
        h.fixture.sessions.update(&session).await.unwrap();

        let err = h
            .handler
            .handle(ProcessTurnCommand::new(*session.id(), "hello"))
            .await
            .unwrap_err();

        assert!(err.is_invalid_state());
        assert_eq!(h.provider.call_count(), 0);
    }

    #[tokio::test]
    async fn concurrent_turns_on_one_session_never_interleave() {
        let h = harness(MockAIProvider::new().with_delay(Duration::from_millis(30)), settings());
        let session = h.fixture.started(&screening_strategy(10)).await;

        let (first, second) = tokio::join!(
            h.handler.handle(ProcessTurnCommand::new(*session.id(), "first")),
            h.handler.handle(ProcessTurnCommand::new(*session.id(), "second")),
        );
        first.unwrap();
        second.unwrap();

        let stored = h.fixture.messages.list_by_session(session.id()).await.unwrap();
        let roles: Vec<Role> = stored.iter().map(|m| m.role()).collect();
        assert_eq!(
            roles,
            vec![Role::Assistant, Role::User, Role::Assistant, Role::User, Role::Assistant]
        );
        let stored_session = h.fixture.sessions.find_by_id(session.id()).await.unwrap().unwrap();
        assert_eq!(stored_session.turn_count(), 2);
    }

    #[tokio::test]
    async fn request_carries_goal_and_bounded_history() {
        let h = harness(
            MockAIProvider::new(),
            TurnSettings {
                history_window: 2,
                ..settings()
            },
        );
        let session = h.fixture.started(&screening_strategy(10)).await;

        for text in ["one", "two", "three"] {
            h.handler
                .handle(ProcessTurnCommand::new(*session.id(), text))
                .await
                .unwrap();
        }

        let calls = h.provider.get_calls();
        let last = calls.last().unwrap();
        assert!(last.system_prompt.as_deref().unwrap().contains("Collect basic history"));
        assert_eq!(last.messages.len(), 2);
        assert_eq!(last.messages[1].role, MessageRole::User);
        assert_eq!(last.messages[1].content, "three");
    }

    #[tokio::test]
    async fn strategy_without_sources_skips_embedding() {
        let h = harness(MockAIProvider::new(), settings());
        let session = h.fixture.started(&screening_strategy(10)).await;

        let outcome = h
            .handler
            .handle(ProcessTurnCommand::new(*session.id(), "hello"))
            .await
            .unwrap();

        assert_eq!(h.embeddings.call_count(), 0);
        assert!(outcome.assistant_message.sources().is_empty());
    }
}
