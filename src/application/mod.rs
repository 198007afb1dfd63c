//! Application layer - Commands, Queries, Handlers and shared services.
//!
//! This layer orchestrates domain operations and coordinates between ports.
//! [`SessionOrchestrator`] is the single entry point; handlers stay usable
//! on their own for tests and custom wiring.

pub mod errors;
pub mod handlers;
pub mod orchestrator;
pub mod services;

pub use errors::EngineError;
pub use handlers::{
    EndSessionResult, ExpireIdleSessionsResult, ProcessTurnCommand, StartSessionCommand, StartSessionResult,
    StatusChange, TurnOutcome, TurnSettings,
};
pub use orchestrator::{Capabilities, EngineDeps, SessionOrchestrator};
pub use services::{ExtractionPipeline, IndexingQueue, RetrievalService, RetrievedContext, SessionLocks};
