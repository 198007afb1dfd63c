//! Message entity for conversations.
//!
//! Messages are immutable, append-only records of one session's exchange.
//! Within a session they are totally ordered by `(created_at, id)`.

use serde::{Deserialize, Serialize};

use crate::domain::fact::Facts;
use crate::domain::foundation::{ChunkId, DomainError, KnowledgeSourceId, MessageId, SessionId, Timestamp};

/// Role of a message sender.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// System instructions (never shown to the subject).
    System,
    User,
    Assistant,
}

impl Role {
    /// Returns true if this is a user-visible role.
    pub fn is_user_visible(&self) -> bool {
        matches!(self, Self::User | Self::Assistant)
    }
}

/// What a message does in the conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    Question,
    Response,
    Summary,
    Assessment,
    Clarification,
}

/// Knowledge chunk that grounded an assistant reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroundingSource {
    pub source_id: KnowledgeSourceId,
    pub chunk_id: ChunkId,
    pub ordinal: u32,
    pub similarity: f32,
}

/// An immutable message within a session.
///
/// # Invariants
///
/// - `content` is non-empty (validated at construction)
/// - `confidence`, when present, lies in [0, 1]
/// - nothing changes after the message is persisted
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    id: MessageId,
    session_id: SessionId,
    role: Role,
    kind: MessageKind,
    content: String,
    confidence: Option<f64>,

    /// Facts extracted during the turn this assistant reply answers.
    extracted_facts: Option<Facts>,

    sources: Vec<GroundingSource>,
    processing_ms: Option<u64>,
    metadata: serde_json::Value,
    created_at: Timestamp,
}

impl Message {
    /// Creates a new message.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if content is empty
    pub fn new(
        session_id: SessionId,
        role: Role,
        kind: MessageKind,
        content: impl Into<String>,
        created_at: Timestamp,
    ) -> Result<Self, DomainError> {
        let content = content.into();
        Self::validate_content(&content)?;

        Ok(Self {
            id: MessageId::new(),
            session_id,
            role,
            kind,
            content,
            confidence: None,
            extracted_facts: None,
            sources: Vec::new(),
            processing_ms: None,
            metadata: serde_json::Value::Null,
            created_at,
        })
    }

    /// Creates a user answer.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if content is empty
    pub fn user(session_id: SessionId, content: impl Into<String>, created_at: Timestamp) -> Result<Self, DomainError> {
        Self::new(session_id, Role::User, MessageKind::Response, content, created_at)
    }

    /// Creates an assistant message of the given kind.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if content is empty
    pub fn assistant(
        session_id: SessionId,
        kind: MessageKind,
        content: impl Into<String>,
        created_at: Timestamp,
    ) -> Result<Self, DomainError> {
        Self::new(session_id, Role::Assistant, kind, content, created_at)
    }

    /// Sets the confidence, clamped to [0, 1].
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Some(if confidence.is_nan() { 0.0 } else { confidence.clamp(0.0, 1.0) });
        self
    }

    pub fn with_extracted_facts(mut self, facts: Facts) -> Self {
        self.extracted_facts = Some(facts);
        self
    }

    pub fn with_sources(mut self, sources: Vec<GroundingSource>) -> Self {
        self.sources = sources;
        self
    }

    pub fn with_processing_ms(mut self, ms: u64) -> Self {
        self.processing_ms = Some(ms);
        self
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn id(&self) -> &MessageId {
        &self.id
    }

    pub fn session_id(&self) -> &SessionId {
        &self.session_id
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn confidence(&self) -> Option<f64> {
        self.confidence
    }

    pub fn extracted_facts(&self) -> Option<&Facts> {
        self.extracted_facts.as_ref()
    }

    pub fn sources(&self) -> &[GroundingSource] {
        &self.sources
    }

    pub fn processing_ms(&self) -> Option<u64> {
        self.processing_ms
    }

    pub fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    /// Sort key giving a total order within a session.
    pub fn ordering_key(&self) -> (Timestamp, MessageId) {
        (self.created_at, self.id)
    }

    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }

    pub fn is_assistant(&self) -> bool {
        self.role == Role::Assistant
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Private helpers
    // ─────────────────────────────────────────────────────────────────────────

    fn validate_content(content: &str) -> Result<(), DomainError> {
        if content.trim().is_empty() {
            return Err(DomainError::validation("content", "Message content cannot be empty"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    #[test]
    fn user_messages_are_responses() {
        let m = Message::user(SessionId::new(), "I am 42", Timestamp::now()).unwrap();
        assert!(m.is_user());
        assert_eq!(m.kind(), MessageKind::Response);
        assert_eq!(m.confidence(), None);
    }

    #[test]
    fn empty_content_is_rejected() {
        let err = Message::user(SessionId::new(), "   ", Timestamp::now()).unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationFailed);
    }

    #[test]
    fn confidence_is_clamped() {
        let m = Message::assistant(SessionId::new(), MessageKind::Question, "Hi", Timestamp::now())
            .unwrap()
            .with_confidence(1.7);
        assert_eq!(m.confidence(), Some(1.0));
        let m = m.with_confidence(-0.2);
        assert_eq!(m.confidence(), Some(0.0));
    }

    #[test]
    fn ordering_key_breaks_timestamp_ties_by_id() {
        let at = Timestamp::now();
        let session = SessionId::new();
        let a = Message::user(session, "a", at).unwrap();
        let b = Message::user(session, "b", at).unwrap();
        assert_ne!(a.ordering_key(), b.ordering_key());
        assert_eq!(a.ordering_key().0, b.ordering_key().0);
    }

    #[test]
    fn serializes_kind_and_role_snake_case() {
        let m = Message::assistant(SessionId::new(), MessageKind::Clarification, "Could you clarify?", Timestamp::now())
            .unwrap();
        let json = serde_json::to_value(&m).unwrap();
        assert_eq!(json["role"], "assistant");
        assert_eq!(json["kind"], "clarification");
    }
}
