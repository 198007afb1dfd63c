//! Domain layer containing business logic and domain types.
//!
//! # Module Organization
//!
//! - `foundation` - Shared domain primitives (IDs, timestamps, errors, state machine)
//! - `fact` - Typed facts accumulated over a conversation
//! - `strategy` - Declarative assessment workflows and their rules
//! - `session` - Session aggregate and lifecycle
//! - `conversation` - Messages, opening templates, fallback responder, prompts
//! - `extraction` - Fact extraction methods
//! - `knowledge` - Knowledge sources, chunking and similarity
//! - `assessment` - Pure criteria scoring

pub mod assessment;
pub mod conversation;
pub mod extraction;
pub mod fact;
pub mod foundation;
pub mod knowledge;
pub mod session;
pub mod strategy;
