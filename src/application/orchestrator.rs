//! Session orchestrator - the engine's public surface.
//!
//! `SessionOrchestrator` owns one handler per operation plus the shared
//! services they need. It is what an outer API layer would call.
//!
//! ```ignore
//! let deps = EngineDeps::in_memory(strategies, capabilities);
//! let engine = SessionOrchestrator::new(deps, &config)?;
//! let started = engine.start_session(command).await?;
//! let outcome = engine.process_turn(ProcessTurnCommand::new(*started.session.id(), "I'm 52")).await?;
//! ```

use std::sync::Arc;
use std::time::Duration;

use secrecy::ExposeSecret;

use crate::adapters::ai::{MockAIProvider, MockEmbeddingProvider, OpenAIConfig, OpenAIEmbeddingProvider, OpenAIProvider};
use crate::adapters::storage::{
    InMemoryAssessmentRepository, InMemoryKnowledgeChunkRepository, InMemoryKnowledgeSourceRepository,
    InMemoryMessageRepository, InMemorySessionRepository,
};
use crate::application::errors::EngineError;
use crate::application::handlers::session::{
    ChangeSessionStatusCommand, ChangeSessionStatusHandler, EndSessionCommand, EndSessionHandler, EndSessionResult,
    ExpireIdleSessionsCommand, ExpireIdleSessionsHandler, ExpireIdleSessionsResult, GetAssessmentHandler,
    GetSessionHandler, ListMessagesHandler, ProcessTurnCommand, ProcessTurnHandler, StartSessionCommand,
    StartSessionHandler, StartSessionResult, StatusChange, TurnOutcome, TurnSettings,
};
use crate::application::services::{
    ExtractionPipeline, IndexingQueue, IndexingQueueConfig, RetrievalService, RetrievalSettings, SessionLocks,
};
use crate::config::{AiConfig, AppConfig, CapabilityMode};
use crate::domain::assessment::{AssessmentEngine, AssessmentResult};
use crate::domain::conversation::Message;
use crate::domain::foundation::{DomainError, KnowledgeSourceId, SessionId};
use crate::domain::knowledge::{KnowledgeSource, TextChunker};
use crate::domain::session::Session;
use crate::ports::{
    AIProvider, AssessmentRepository, EmbeddingProvider, KnowledgeChunkRepository, KnowledgeSourceRepository,
    MessageRepository, SessionRepository, StrategyRepository,
};

/// Completion and embedding capabilities, chosen once at startup.
#[derive(Clone)]
pub struct Capabilities {
    pub completion: Arc<dyn AIProvider>,
    pub embeddings: Arc<dyn EmbeddingProvider>,
}

impl Capabilities {
    /// Builds the providers selected by `ai.mode`.
    pub fn from_config(config: &AiConfig) -> Result<Self, EngineError> {
        match config.mode {
            CapabilityMode::Mock => Ok(Self {
                completion: Arc::new(MockAIProvider::new()),
                embeddings: Arc::new(MockEmbeddingProvider::new()),
            }),
            CapabilityMode::OpenAI => {
                let api_key = config
                    .openai_api_key
                    .as_ref()
                    .map(|key| key.expose_secret().clone())
                    .ok_or_else(|| EngineError::validation("OpenAI mode requires an API key"))?;
                let base = OpenAIConfig::new(api_key)
                    .with_base_url(config.base_url.clone())
                    .with_max_retries(config.max_retries);

                let completion = OpenAIProvider::new(
                    base.clone()
                        .with_model(config.completion_model.clone())
                        .with_timeout(config.completion_timeout()),
                )?;
                let embeddings = OpenAIEmbeddingProvider::new(
                    base.with_model(config.embedding_model.clone())
                        .with_timeout(config.embedding_timeout()),
                    config.embedding_dimensions,
                )?;

                Ok(Self {
                    completion: Arc::new(completion),
                    embeddings: Arc::new(embeddings),
                })
            }
        }
    }
}

/// Ports the orchestrator is wired against.
#[derive(Clone)]
pub struct EngineDeps {
    pub sessions: Arc<dyn SessionRepository>,
    pub messages: Arc<dyn MessageRepository>,
    pub assessments: Arc<dyn AssessmentRepository>,
    pub strategies: Arc<dyn StrategyRepository>,
    pub knowledge_sources: Arc<dyn KnowledgeSourceRepository>,
    pub knowledge_chunks: Arc<dyn KnowledgeChunkRepository>,
    pub capabilities: Capabilities,
}

impl EngineDeps {
    /// In-memory stores around the given strategies and capabilities.
    pub fn in_memory(strategies: Arc<dyn StrategyRepository>, capabilities: Capabilities) -> Self {
        Self {
            sessions: Arc::new(InMemorySessionRepository::new()),
            messages: Arc::new(InMemoryMessageRepository::new()),
            assessments: Arc::new(InMemoryAssessmentRepository::new()),
            strategies,
            knowledge_sources: Arc::new(InMemoryKnowledgeSourceRepository::new()),
            knowledge_chunks: Arc::new(InMemoryKnowledgeChunkRepository::new()),
            capabilities,
        }
    }
}

/// Coordinates sessions, extraction, retrieval and assessment.
pub struct SessionOrchestrator {
    start: StartSessionHandler,
    turn: ProcessTurnHandler,
    end: EndSessionHandler,
    status: ChangeSessionStatusHandler,
    expire: ExpireIdleSessionsHandler,
    get_session: GetSessionHandler,
    list_messages: ListMessagesHandler,
    assessments: GetAssessmentHandler,
    retrieval: Arc<RetrievalService>,
    indexing: IndexingQueue,
    session_timeout: Duration,
}

impl SessionOrchestrator {
    /// Wires every handler from `deps` and the configuration sections.
    ///
    /// Starts the indexing workers, so it must run inside a tokio runtime.
    pub fn new(deps: EngineDeps, config: &AppConfig) -> Result<Self, EngineError> {
        let thresholds = config.assessment.thresholds();
        thresholds.validate().map_err(DomainError::from)?;
        let locks = Arc::new(SessionLocks::new());
        let completion = deps.capabilities.completion.clone();

        let chunker = TextChunker::new(config.retrieval.chunk_size, config.retrieval.chunk_overlap)
            .map_err(DomainError::from)?;
        let retrieval = Arc::new(RetrievalService::new(
            deps.knowledge_sources.clone(),
            deps.knowledge_chunks.clone(),
            deps.capabilities.embeddings.clone(),
            chunker,
            RetrievalSettings {
                top_k: config.retrieval.top_k,
                min_similarity: config.retrieval.min_similarity,
                max_context_chars: config.retrieval.max_context_chars,
                embedding_concurrency: config.retrieval.embedding_concurrency,
                embedding_timeout: config.ai.embedding_timeout(),
            },
        ));
        let indexing = IndexingQueue::start(
            retrieval.clone(),
            IndexingQueueConfig {
                workers: config.retrieval.indexing_workers,
                capacity: config.retrieval.indexing_queue_capacity,
            },
        );
        let extraction = Arc::new(ExtractionPipeline::new(completion.clone(), config.ai.extraction_timeout()));

        let turn = ProcessTurnHandler::new(
            deps.sessions.clone(),
            deps.messages.clone(),
            deps.assessments.clone(),
            completion,
            extraction,
            retrieval.clone(),
            locks.clone(),
            AssessmentEngine::new(thresholds),
            TurnSettings {
                history_window: config.conversation.history_window,
                min_facts_for_assessment: config.conversation.min_facts_for_assessment,
                fallback_confidence: config.conversation.fallback_confidence(),
                completion_timeout: config.ai.completion_timeout(),
                max_tokens: config.ai.max_tokens,
                temperature: config.ai.temperature,
            },
        );

        Ok(Self {
            start: StartSessionHandler::new(deps.strategies.clone(), deps.sessions.clone(), deps.messages.clone()),
            turn,
            end: EndSessionHandler::new(deps.sessions.clone(), locks.clone()),
            status: ChangeSessionStatusHandler::new(deps.sessions.clone(), locks.clone()),
            expire: ExpireIdleSessionsHandler::new(deps.sessions.clone(), locks),
            get_session: GetSessionHandler::new(deps.sessions.clone()),
            list_messages: ListMessagesHandler::new(deps.sessions.clone(), deps.messages.clone()),
            assessments: GetAssessmentHandler::new(deps.sessions, deps.assessments),
            retrieval,
            indexing,
            session_timeout: config.conversation.session_timeout(),
        })
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Sessions
    // ─────────────────────────────────────────────────────────────────────────

    pub async fn start_session(&self, cmd: StartSessionCommand) -> Result<StartSessionResult, EngineError> {
        self.start.handle(cmd).await
    }

    pub async fn process_turn(&self, cmd: ProcessTurnCommand) -> Result<TurnOutcome, EngineError> {
        self.turn.handle(cmd).await
    }

    /// Completes the session; ending a completed session is a no-op.
    pub async fn end_session(&self, session_id: SessionId, reason: Option<String>) -> Result<EndSessionResult, EngineError> {
        let mut cmd = EndSessionCommand::new(session_id);
        cmd.reason = reason;
        self.end.handle(cmd).await
    }

    pub async fn pause_session(&self, session_id: SessionId) -> Result<Session, EngineError> {
        self.change_status(session_id, StatusChange::Pause).await
    }

    pub async fn resume_session(&self, session_id: SessionId) -> Result<Session, EngineError> {
        self.change_status(session_id, StatusChange::Resume).await
    }

    pub async fn cancel_session(&self, session_id: SessionId, reason: impl Into<String>) -> Result<Session, EngineError> {
        self.change_status(session_id, StatusChange::Cancel { reason: reason.into() })
            .await
    }

    pub async fn fail_session(&self, session_id: SessionId, reason: impl Into<String>) -> Result<Session, EngineError> {
        self.change_status(session_id, StatusChange::Fail { reason: reason.into() })
            .await
    }

    /// Ends every open session idle for longer than the configured timeout.
    pub async fn expire_idle_sessions(&self) -> Result<ExpireIdleSessionsResult, EngineError> {
        self.expire
            .handle(ExpireIdleSessionsCommand {
                idle_timeout: self.session_timeout,
            })
            .await
    }

    pub async fn get_session(&self, session_id: &SessionId) -> Result<Session, EngineError> {
        self.get_session.handle(session_id).await
    }

    pub async fn list_messages(&self, session_id: &SessionId) -> Result<Vec<Message>, EngineError> {
        self.list_messages.handle(session_id).await
    }

    pub async fn get_assessment(&self, session_id: &SessionId) -> Result<AssessmentResult, EngineError> {
        self.assessments.current(session_id).await
    }

    pub async fn assessment_history(&self, session_id: &SessionId) -> Result<Vec<AssessmentResult>, EngineError> {
        self.assessments.history(session_id).await
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Knowledge
    // ─────────────────────────────────────────────────────────────────────────

    /// Stores a source as `Pending` without indexing it.
    pub async fn register_knowledge_source(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<KnowledgeSource, EngineError> {
        let source = KnowledgeSource::new(title, content)?;
        self.retrieval.register_source(source).await
    }

    /// Registers a source and queues it for indexing.
    pub async fn add_knowledge_source(
        &self,
        title: impl Into<String>,
        content: impl Into<String>,
    ) -> Result<KnowledgeSource, EngineError> {
        let source = self.register_knowledge_source(title, content).await?;
        self.indexing.enqueue(*source.id()).await?;
        Ok(source)
    }

    /// Indexes a registered source and waits for the result.
    pub async fn index_source(&self, source_id: KnowledgeSourceId) -> Result<KnowledgeSource, EngineError> {
        self.indexing.enqueue_and_wait(source_id).await
    }

    pub async fn knowledge_source(&self, source_id: &KnowledgeSourceId) -> Result<KnowledgeSource, EngineError> {
        self.retrieval.get_source(source_id).await
    }

    pub fn retrieval(&self) -> &RetrievalService {
        &self.retrieval
    }

    /// Stops the indexing workers after their current job.
    pub async fn shutdown(self) {
        self.indexing.shutdown().await;
        tracing::info!("Session orchestrator stopped");
    }

    async fn change_status(&self, session_id: SessionId, change: StatusChange) -> Result<Session, EngineError> {
        self.status
            .handle(ChangeSessionStatusCommand { session_id, change })
            .await
    }
}

