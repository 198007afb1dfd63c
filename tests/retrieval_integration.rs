//! Integration tests for knowledge indexing and retrieval-grounded turns.
//!
//! These tests verify the end-to-end flow:
//! 1. Knowledge sources are registered and indexed by the worker pool
//! 2. Turns retrieve context only from the strategy's own sources
//! 3. Grounding sources are recorded on the assistant message
//!
//! Uses the in-memory repositories and the deterministic mock embedder.

use std::collections::HashSet;
use std::sync::Arc;

use care_intake::adapters::ai::{MockAIProvider, MockEmbeddingProvider};
use care_intake::adapters::storage::InMemoryStrategyRepository;
use care_intake::application::{Capabilities, EngineDeps, ProcessTurnCommand, SessionOrchestrator, StartSessionCommand};
use care_intake::config::AppConfig;
use care_intake::domain::foundation::{KnowledgeSourceId, SessionType, StrategyId, SubjectId};
use care_intake::domain::knowledge::IndexStatus;
use care_intake::domain::strategy::Strategy;

const BRCA_GUIDE: &str = "BRCA1 and BRCA2 mutations raise the lifetime risk of breast cancer and ovarian cancer. \
Carriers are offered earlier screening and risk-reducing options. Testing is recommended when a first degree \
relative carries a known BRCA mutation.";

const LYNCH_GUIDE: &str = "Lynch syndrome raises the risk of colorectal cancer and endometrial cancer. \
Colonoscopy every one to two years is advised for carriers, starting at age twenty five.";

struct Fixture {
    engine: SessionOrchestrator,
    strategies: Arc<InMemoryStrategyRepository>,
    embeddings: MockEmbeddingProvider,
}

fn fixture() -> Fixture {
    let mut config = AppConfig::default();
    config.retrieval.min_similarity = 0.05;
    config.retrieval.chunk_size = 120;
    config.retrieval.chunk_overlap = 20;
    config.retrieval.indexing_workers = 1;

    let strategies = Arc::new(InMemoryStrategyRepository::new());
    let embeddings = MockEmbeddingProvider::new();
    let capabilities = Capabilities {
        completion: Arc::new(MockAIProvider::new()),
        embeddings: Arc::new(embeddings.clone()),
    };
    let engine = SessionOrchestrator::new(EngineDeps::in_memory(strategies.clone(), capabilities), &config).unwrap();
    Fixture {
        engine,
        strategies,
        embeddings,
    }
}

async fn indexed(f: &Fixture, title: &str, content: &str) -> KnowledgeSourceId {
    let source = f.engine.register_knowledge_source(title, content).await.unwrap();
    let source = f.engine.index_source(*source.id()).await.unwrap();
    assert_eq!(source.status(), IndexStatus::Indexed);
    *source.id()
}

#[tokio::test]
async fn indexing_produces_contiguous_chunks() {
    let f = fixture();
    let source_id = indexed(&f, "BRCA guide", BRCA_GUIDE).await;

    let source = f.engine.knowledge_source(&source_id).await.unwrap();
    let chunks = f.engine.retrieval().list_chunks(&source_id).await.unwrap();

    assert!(chunks.len() > 1);
    assert_eq!(source.chunk_count() as usize, chunks.len());
    for (expected, chunk) in chunks.iter().enumerate() {
        assert_eq!(chunk.ordinal as usize, expected);
    }
}

#[tokio::test]
async fn failed_embedding_leaves_no_partial_index() {
    let f = fixture();
    let source = f.engine.register_knowledge_source("BRCA guide", BRCA_GUIDE).await.unwrap();
    f.embeddings.set_failing(true);

    let source = f.engine.index_source(*source.id()).await.unwrap();

    assert_eq!(source.status(), IndexStatus::Failed);
    assert_eq!(source.chunk_count(), 0);
    assert!(f.engine.retrieval().list_chunks(source.id()).await.unwrap().is_empty());

    f.embeddings.set_failing(false);
    let source = f.engine.index_source(*source.id()).await.unwrap();
    assert_eq!(source.status(), IndexStatus::Indexed);
}

#[tokio::test]
async fn turns_are_grounded_only_in_strategy_sources() {
    let f = fixture();
    let brca = indexed(&f, "BRCA guide", BRCA_GUIDE).await;
    let lynch = indexed(&f, "Lynch guide", LYNCH_GUIDE).await;

    f.strategies
        .insert(
            Strategy::new(
                StrategyId::new("brca").unwrap(),
                "Hereditary breast cancer",
                "Assess BRCA testing eligibility",
            )
            .with_knowledge_source(brca),
        )
        .await;
    let started = f
        .engine
        .start_session(StartSessionCommand::new(
            StrategyId::new("brca").unwrap(),
            SubjectId::new("patient-9").unwrap(),
            SessionType::Assessment,
        ))
        .await
        .unwrap();

    let outcome = f
        .engine
        .process_turn(ProcessTurnCommand::new(
            *started.session.id(),
            "Does a cancer mutation in my family raise my risk?",
        ))
        .await
        .unwrap();

    let cited: HashSet<KnowledgeSourceId> = outcome
        .assistant_message
        .sources()
        .iter()
        .map(|s| s.source_id)
        .collect();
    assert!(!cited.is_empty());
    assert!(cited.contains(&brca));
    assert!(!cited.contains(&lynch));
    for pair in outcome.assistant_message.sources().windows(2) {
        assert!(pair[0].similarity >= pair[1].similarity);
    }
}

#[tokio::test]
async fn queued_sources_are_indexed_in_background() {
    let f = fixture();
    let source = f.engine.add_knowledge_source("Lynch guide", LYNCH_GUIDE).await.unwrap();

    let mut status = IndexStatus::Pending;
    for _ in 0..50 {
        status = f.engine.knowledge_source(source.id()).await.unwrap().status();
        if status == IndexStatus::Indexed {
            break;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }

    assert_eq!(status, IndexStatus::Indexed);
    f.engine.shutdown().await;
}
