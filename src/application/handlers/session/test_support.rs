//! Shared fixtures for the session handler tests.

use std::sync::Arc;

use crate::adapters::ai::MockEmbeddingProvider;
use crate::adapters::storage::{
    InMemoryAssessmentRepository, InMemoryKnowledgeChunkRepository, InMemoryKnowledgeSourceRepository,
    InMemoryMessageRepository, InMemorySessionRepository, InMemoryStrategyRepository,
};
use crate::application::services::{RetrievalService, RetrievalSettings, SessionLocks};
use crate::domain::assessment::RecommendationTier;
use crate::domain::conversation::{Message, MessageKind};
use crate::domain::foundation::{SessionType, StrategyId, SubjectId};
use crate::domain::knowledge::TextChunker;
use crate::domain::session::Session;
use crate::domain::strategy::{
    AssessmentCriteria, ComparisonOp, CriteriaGroup, Criterion, Evaluator, ExtractionRule, Strategy, ValueType,
};
use crate::ports::{MessageRepository, SessionRepository};

pub(crate) struct Fixture {
    pub sessions: Arc<InMemorySessionRepository>,
    pub messages: Arc<InMemoryMessageRepository>,
    pub assessments: Arc<InMemoryAssessmentRepository>,
    pub strategies: Arc<InMemoryStrategyRepository>,
    pub locks: Arc<SessionLocks>,
}

impl Fixture {
    pub fn new() -> Self {
        Self {
            sessions: Arc::new(InMemorySessionRepository::new()),
            messages: Arc::new(InMemoryMessageRepository::new()),
            assessments: Arc::new(InMemoryAssessmentRepository::new()),
            strategies: Arc::new(InMemoryStrategyRepository::new()),
            locks: Arc::new(SessionLocks::new()),
        }
    }

    /// Stores a started session with its opening message.
    pub async fn started(&self, strategy: &Strategy) -> Session {
        let mut session = Session::start(
            strategy,
            SubjectId::new("patient-1").unwrap(),
            SessionType::Screening,
            serde_json::Value::Null,
        )
        .unwrap();
        let at = session.next_message_timestamp();
        let opening = Message::assistant(*session.id(), MessageKind::Question, "Hello, how can I help?", at).unwrap();
        session.touch(at);
        self.sessions.save(&session).await.unwrap();
        self.messages.append(&opening).await.unwrap();
        session
    }
}

/// Screening strategy: an age pattern rule and one adult criterion.
pub(crate) fn screening_strategy(max_turns: u32) -> Strategy {
    let criteria = AssessmentCriteria {
        required_facts: vec!["age".to_string(), "smoker".to_string()],
        groups: vec![CriteriaGroup::new(
            "eligibility",
            vec![Criterion::new(
                "adult",
                "age",
                Evaluator::Numeric {
                    operator: ComparisonOp::Gte,
                    threshold: 25.0,
                },
            )],
        )],
        recommendations: [(RecommendationTier::HighPriority, "Book a screening visit.".to_string())]
            .into_iter()
            .collect(),
    };

    Strategy::new(StrategyId::new("screening").unwrap(), "General screening", "Collect basic history")
        .with_rule(ExtractionRule::pattern("age", r"(\d{1,3})\s*years?\s*old", ValueType::Integer))
        .with_rule(ExtractionRule::keyword("smoker", &["i smoke", "smoker"]))
        .with_criteria(criteria)
        .with_max_turns(max_turns)
}

/// Retrieval over empty in-memory knowledge stores.
pub(crate) fn retrieval(embeddings: MockEmbeddingProvider) -> RetrievalService {
    RetrievalService::new(
        Arc::new(InMemoryKnowledgeSourceRepository::new()),
        Arc::new(InMemoryKnowledgeChunkRepository::new()),
        Arc::new(embeddings),
        TextChunker::new(200, 20).unwrap(),
        RetrievalSettings::default(),
    )
}
