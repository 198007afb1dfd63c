//! Application services shared by the session handlers.
//!
//! - [`ExtractionPipeline`] turns an utterance into facts
//! - [`RetrievalService`] indexes knowledge and finds grounding context
//! - [`IndexingQueue`] runs indexing on detached workers
//! - [`SessionLocks`] and [`SourceLocks`] serialize work on one session or source

mod extraction_pipeline;
mod indexing_queue;
mod keyed_locks;
mod model_extractor;
mod retrieval_service;

pub use extraction_pipeline::{ExtractionOutcome, ExtractionPipeline, RuleDiagnostic, RuleStatus};
pub use indexing_queue::{IndexingQueue, IndexingQueueConfig};
pub use keyed_locks::{KeyedLocks, SessionLocks, SourceLocks};
pub use model_extractor::ModelExtractor;
pub use retrieval_service::{RetrievalService, RetrievalSettings, RetrievedContext};
