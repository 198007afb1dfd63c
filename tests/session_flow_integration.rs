//! Integration tests for the session orchestrator.
//!
//! These tests drive complete conversations through `SessionOrchestrator`:
//! 1. Start a session against a stored strategy
//! 2. Process turns (extraction, completion, assessment)
//! 3. Close the session through its lifecycle operations
//!
//! Uses the in-memory repositories and mock capabilities.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use care_intake::adapters::ai::{MockAIProvider, MockEmbeddingProvider, MockError};
use care_intake::adapters::storage::{InMemoryStrategyRepository, YamlStrategyRepository};
use care_intake::application::{
    Capabilities, EngineDeps, EngineError, ProcessTurnCommand, SessionOrchestrator, StartSessionCommand,
};
use care_intake::config::AppConfig;
use care_intake::domain::assessment::{AssessmentStatus, RecommendationTier};
use care_intake::domain::conversation::Role;
use care_intake::domain::fact::FactValue;
use care_intake::domain::foundation::{ErrorCode, SessionId, SessionStatus, SessionType, StrategyId, SubjectId};
use care_intake::domain::session::{END_REASON_MAX_TURNS, END_REASON_TIMEOUT};
use care_intake::domain::strategy::{
    AssessmentCriteria, ComparisonOp, CriteriaGroup, Criterion, Evaluator, ExtractionRule, Strategy, ValueType,
};
use care_intake::ports::StrategyRepository;

// =============================================================================
// Test Infrastructure
// =============================================================================

struct TestEngine {
    engine: SessionOrchestrator,
    completion: MockAIProvider,
    embeddings: MockEmbeddingProvider,
}

fn test_config() -> AppConfig {
    let mut config = AppConfig::default();
    config.conversation.min_facts_for_assessment = 1;
    config.ai.completion_timeout_ms = 2_000;
    config
}

async fn engine_with(strategy: Strategy, completion: MockAIProvider, config: AppConfig) -> TestEngine {
    let strategies = Arc::new(InMemoryStrategyRepository::new());
    strategies.insert(strategy).await;
    let embeddings = MockEmbeddingProvider::new();
    let capabilities = Capabilities {
        completion: Arc::new(completion.clone()),
        embeddings: Arc::new(embeddings.clone()),
    };
    let engine = SessionOrchestrator::new(EngineDeps::in_memory(strategies, capabilities), &config).unwrap();
    TestEngine {
        engine,
        completion,
        embeddings,
    }
}

async fn engine(strategy: Strategy) -> TestEngine {
    engine_with(strategy, MockAIProvider::new(), test_config()).await
}

/// Eligibility strategy: adults of 25 or older qualify.
fn eligibility_strategy(max_turns: u32) -> Strategy {
    let criteria = AssessmentCriteria {
        required_facts: vec!["age".to_string()],
        groups: vec![CriteriaGroup::new(
            "eligibility",
            vec![Criterion::new(
                "age_25_plus",
                "age",
                Evaluator::Numeric {
                    operator: ComparisonOp::Gte,
                    threshold: 25.0,
                },
            )],
        )],
        recommendations: BTreeMap::new(),
    };
    Strategy::new(
        StrategyId::new("eligibility").unwrap(),
        "Eligibility check",
        "Confirm the patient's age for screening eligibility",
    )
    .with_rule(ExtractionRule::pattern("age", r"(\d{1,3})\s*years?\s*old", ValueType::Integer))
    .with_rule(ExtractionRule::keyword("smoker", &["i smoke", "smoker"]))
    .with_criteria(criteria)
    .with_max_turns(max_turns)
}

async fn start(engine: &SessionOrchestrator, strategy_id: &str) -> SessionId {
    let started = engine
        .start_session(StartSessionCommand::new(
            StrategyId::new(strategy_id).unwrap(),
            SubjectId::new("patient-001").unwrap(),
            SessionType::Screening,
        ))
        .await
        .unwrap();
    *started.session.id()
}

async fn say(engine: &SessionOrchestrator, session_id: SessionId, text: &str) -> care_intake::application::TurnOutcome {
    engine
        .process_turn(ProcessTurnCommand::new(session_id, text))
        .await
        .unwrap()
}

// =============================================================================
// Assessment scenarios
// =============================================================================

#[tokio::test]
async fn adult_patient_is_high_priority() {
    let t = engine(eligibility_strategy(10)).await;
    let session_id = start(&t.engine, "eligibility").await;

    let outcome = say(&t.engine, session_id, "I am 30 years old").await;

    assert_eq!(outcome.new_facts.get("age"), Some(&FactValue::Integer(30)));
    let assessment = outcome.assessment.expect("assessment after first fact");
    assert_eq!(assessment.status, AssessmentStatus::Scored);
    assert_eq!(assessment.tier, Some(RecommendationTier::HighPriority));
    assert_eq!(t.engine.get_assessment(&session_id).await.unwrap(), assessment);
}

#[tokio::test]
async fn missing_age_is_not_indicated() {
    let t = engine(eligibility_strategy(10)).await;
    let session_id = start(&t.engine, "eligibility").await;

    let outcome = say(&t.engine, session_id, "I smoke every day").await;

    let assessment = outcome.assessment.expect("assessment after first fact");
    assert_eq!(assessment.tier, Some(RecommendationTier::NotIndicated));
    assert_eq!(assessment.indeterminate_criteria.len(), 1);
    assert_eq!(assessment.missing_required_facts, vec!["age".to_string()]);
}

#[tokio::test]
async fn assessment_history_grows_per_scored_turn() {
    let t = engine(eligibility_strategy(10)).await;
    let session_id = start(&t.engine, "eligibility").await;

    say(&t.engine, session_id, "I smoke").await;
    say(&t.engine, session_id, "I'm 61 years old").await;

    let history = t.engine.assessment_history(&session_id).await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].tier, Some(RecommendationTier::NotIndicated));
    assert_eq!(history[1].tier, Some(RecommendationTier::HighPriority));
}

#[tokio::test]
async fn assessment_is_not_found_before_enough_facts() {
    let mut config = test_config();
    config.conversation.min_facts_for_assessment = 3;
    let t = engine_with(eligibility_strategy(10), MockAIProvider::new(), config).await;
    let session_id = start(&t.engine, "eligibility").await;

    say(&t.engine, session_id, "I am 30 years old").await;

    let err = t.engine.get_assessment(&session_id).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::AssessmentNotFound);
}

// =============================================================================
// Turn limits and degraded paths
// =============================================================================

#[tokio::test]
async fn session_completes_at_turn_limit() {
    let t = engine(eligibility_strategy(3)).await;
    let session_id = start(&t.engine, "eligibility").await;

    for text in ["hello", "I am 40 years old", "that's all"] {
        say(&t.engine, session_id, text).await;
    }

    let session = t.engine.get_session(&session_id).await.unwrap();
    assert_eq!(session.status(), SessionStatus::Completed);
    assert_eq!(session.end_reason(), Some(END_REASON_MAX_TURNS));
    assert_eq!(session.turn_count(), 3);

    let err = t
        .engine
        .process_turn(ProcessTurnCommand::new(session_id, "one more"))
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::InvalidState { .. }));
}

#[tokio::test]
async fn completion_timeout_uses_fallback_reply() {
    let mut config = test_config();
    config.ai.completion_timeout_ms = 50;
    let t = engine_with(
        eligibility_strategy(10),
        MockAIProvider::new().with_delay(Duration::from_millis(500)),
        config,
    )
    .await;
    let session_id = start(&t.engine, "eligibility").await;

    let outcome = say(&t.engine, session_id, "hi there").await;

    assert!(outcome.used_fallback);
    assert!(outcome.assistant_message.confidence().unwrap() < 1.0);
    assert!(!outcome.assistant_message.content().is_empty());
    let messages = t.engine.list_messages(&session_id).await.unwrap();
    assert_eq!(messages.iter().filter(|m| m.role() == Role::Assistant).count(), 2);
}

#[tokio::test]
async fn provider_failure_uses_fallback_reply() {
    let t = engine_with(
        eligibility_strategy(10),
        MockAIProvider::new().with_error(MockError::RateLimited { retry_after_secs: 30 }),
        test_config(),
    )
    .await;
    let session_id = start(&t.engine, "eligibility").await;

    let outcome = say(&t.engine, session_id, "I am 33 years old").await;

    assert!(outcome.used_fallback);
    assert_eq!(outcome.assistant_message.confidence(), Some(0.5));
    assert_eq!(outcome.session.facts().get("age"), Some(&FactValue::Integer(33)));
}

#[tokio::test]
async fn strategy_without_sources_never_embeds() {
    let t = engine(eligibility_strategy(10)).await;
    let session_id = start(&t.engine, "eligibility").await;

    let outcome = say(&t.engine, session_id, "What does screening involve?").await;

    assert_eq!(t.embeddings.call_count(), 0);
    assert!(outcome.assistant_message.sources().is_empty());
}

#[tokio::test]
async fn model_extraction_shares_the_completion_capability() {
    let strategy = eligibility_strategy(10).with_rule(ExtractionRule::model_hybrid(
        "systolic_bp",
        "Extract the systolic blood pressure in mmHg.",
        ValueType::Integer,
    ));
    let completion = MockAIProvider::new()
        .with_response(r#"{"value": 150}"#)
        .with_response("Thanks. Do you take any medication for it?");
    let t = engine_with(strategy, completion, test_config()).await;
    let session_id = start(&t.engine, "eligibility").await;

    let outcome = say(&t.engine, session_id, "My blood pressure was 150 over 90").await;

    assert_eq!(outcome.new_facts.get("systolic_bp"), Some(&FactValue::Integer(150)));
    assert_eq!(
        outcome.assistant_message.content(),
        "Thanks. Do you take any medication for it?"
    );
    assert_eq!(t.completion.call_count(), 2);
}

// =============================================================================
// Ordering and concurrency
// =============================================================================

#[tokio::test]
async fn messages_are_strictly_ordered() {
    let t = engine(eligibility_strategy(10)).await;
    let session_id = start(&t.engine, "eligibility").await;

    for text in ["hello", "I am 52 years old", "I smoke", "that is everything"] {
        say(&t.engine, session_id, text).await;
    }

    let messages = t.engine.list_messages(&session_id).await.unwrap();
    assert_eq!(messages.len(), 9);
    assert_eq!(messages[0].role(), Role::Assistant);
    for pair in messages.windows(2) {
        assert!(pair[0].created_at().is_before(pair[1].created_at()));
        assert_ne!(pair[0].role(), pair[1].role());
    }
}

#[tokio::test]
async fn concurrent_turns_are_serialized_per_session() {
    let t = engine_with(
        eligibility_strategy(10),
        MockAIProvider::new().with_delay(Duration::from_millis(25)),
        test_config(),
    )
    .await;
    let session_id = start(&t.engine, "eligibility").await;
    let other_id = start(&t.engine, "eligibility").await;

    let (a, b, c) = tokio::join!(
        t.engine.process_turn(ProcessTurnCommand::new(session_id, "first")),
        t.engine.process_turn(ProcessTurnCommand::new(session_id, "second")),
        t.engine.process_turn(ProcessTurnCommand::new(other_id, "elsewhere")),
    );
    a.unwrap();
    b.unwrap();
    c.unwrap();

    let roles: Vec<Role> = t
        .engine
        .list_messages(&session_id)
        .await
        .unwrap()
        .iter()
        .map(|m| m.role())
        .collect();
    assert_eq!(
        roles,
        vec![Role::Assistant, Role::User, Role::Assistant, Role::User, Role::Assistant]
    );
    assert_eq!(t.engine.get_session(&session_id).await.unwrap().turn_count(), 2);
    assert_eq!(t.engine.get_session(&other_id).await.unwrap().turn_count(), 1);
}

// =============================================================================
// Lifecycle
// =============================================================================

#[tokio::test]
async fn end_session_is_idempotent() {
    let t = engine(eligibility_strategy(10)).await;
    let session_id = start(&t.engine, "eligibility").await;

    let first = t.engine.end_session(session_id, Some("done".to_string())).await.unwrap();
    let second = t.engine.end_session(session_id, None).await.unwrap();

    assert!(first.changed);
    assert!(!second.changed);
    assert_eq!(second.session.status(), SessionStatus::Completed);
    assert_eq!(second.session.end_reason(), Some("done"));
}

#[tokio::test]
async fn paused_sessions_resume_and_cancelled_cannot_end() {
    let t = engine(eligibility_strategy(10)).await;
    let session_id = start(&t.engine, "eligibility").await;

    t.engine.pause_session(session_id).await.unwrap();
    let err = t
        .engine
        .process_turn(ProcessTurnCommand::new(session_id, "still there?"))
        .await
        .unwrap_err();
    assert!(err.is_invalid_state());

    t.engine.resume_session(session_id).await.unwrap();
    say(&t.engine, session_id, "yes").await;

    t.engine.cancel_session(session_id, "withdrew consent").await.unwrap();
    let err = t.engine.end_session(session_id, None).await.unwrap_err();
    assert!(err.is_invalid_state());
}

#[tokio::test]
async fn idle_sessions_time_out() {
    let mut config = test_config();
    config.conversation.session_timeout_mins = 0;
    let t = engine_with(eligibility_strategy(10), MockAIProvider::new(), config).await;
    let session_id = start(&t.engine, "eligibility").await;
    tokio::time::sleep(Duration::from_millis(10)).await;

    let result = t.engine.expire_idle_sessions().await.unwrap();

    assert_eq!(result.expired, vec![session_id]);
    let session = t.engine.get_session(&session_id).await.unwrap();
    assert_eq!(session.status(), SessionStatus::Completed);
    assert_eq!(session.end_reason(), Some(END_REASON_TIMEOUT));
}

#[tokio::test]
async fn unknown_ids_are_not_found() {
    let t = engine(eligibility_strategy(10)).await;

    let err = t
        .engine
        .start_session(StartSessionCommand::new(
            StrategyId::new("nope").unwrap(),
            SubjectId::new("p").unwrap(),
            SessionType::Screening,
        ))
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::StrategyNotFound);

    let err = t.engine.get_session(&SessionId::new()).await.unwrap_err();
    assert_eq!(err.code(), ErrorCode::SessionNotFound);
}

// =============================================================================
// Bundled strategy documents
// =============================================================================

#[tokio::test]
async fn bundled_strategies_load_and_run() {
    let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/strategies");
    let strategies = YamlStrategyRepository::new(dir);

    let ids = strategies.list_ids().await.unwrap();
    assert!(ids.contains(&StrategyId::new("hereditary-cancer").unwrap()));
    assert!(ids.contains(&StrategyId::new("cardiac-screening").unwrap()));

    let strategy = strategies
        .find_by_id(&StrategyId::new("hereditary-cancer").unwrap())
        .await
        .unwrap()
        .unwrap();
    let t = engine(strategy).await;
    let session_id = start(&t.engine, "hereditary-cancer").await;

    let outcome = say(
        &t.engine,
        session_id,
        "I'm 38 years old and my mother and sister had breast cancer",
    )
    .await;

    assert_eq!(outcome.session.facts().get("age"), Some(&FactValue::Integer(38)));
    assert_eq!(
        outcome.session.facts().get("cancer_type"),
        Some(&FactValue::Text("breast_ovarian".to_string()))
    );
    assert!(outcome.session.facts().contains("family_members"));
    let assessment = outcome.assessment.unwrap();
    assert!(assessment.tier.is_some());
    assert!(assessment.recommendation.is_some());
}

#[tokio::test]
async fn bundled_cardiac_strategy_opens_with_heart_health_questions() {
    let dir = concat!(env!("CARGO_MANIFEST_DIR"), "/strategies");
    let strategy = YamlStrategyRepository::new(dir)
        .find_by_id(&StrategyId::new("cardiac-screening").unwrap())
        .await
        .unwrap()
        .unwrap();
    let t = engine(strategy).await;
    let session_id = start(&t.engine, "cardiac-screening").await;

    let messages = t.engine.list_messages(&session_id).await.unwrap();
    assert_eq!(messages.len(), 1);
    assert!(messages[0].content().contains("heart health"));
}
