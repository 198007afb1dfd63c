//! Conversation module - messages and the text the assistant says.
//!
//! - [`Message`] is the immutable record of one utterance
//! - [`templates`] picks the opening message for a strategy
//! - [`FallbackResponder`] replies when the model is unavailable
//! - [`prompt`] assembles system instructions and the history window

mod fallback;
mod message;
pub mod prompt;
pub mod templates;

pub use fallback::FallbackResponder;
pub use message::{GroundingSource, Message, MessageKind, Role};
