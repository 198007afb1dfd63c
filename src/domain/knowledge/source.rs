//! Knowledge source entity.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::foundation::{DomainError, ErrorCode, KnowledgeSourceId, StateMachine, Timestamp};

/// Indexing lifecycle of a source.
///
/// ```text
/// Pending ──► Indexing ──► Indexed | Failed
/// Indexed | Failed ──► Indexing        (reindex)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum IndexStatus {
    #[default]
    Pending,
    Indexing,
    Indexed,
    Failed,
}

impl StateMachine for IndexStatus {
    fn valid_transitions(&self) -> Vec<Self> {
        use IndexStatus::*;
        match self {
            Pending => vec![Indexing],
            Indexing => vec![Indexed, Failed],
            Indexed | Failed => vec![Indexing],
        }
    }
}

impl fmt::Display for IndexStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IndexStatus::Pending => "pending",
            IndexStatus::Indexing => "indexing",
            IndexStatus::Indexed => "indexed",
            IndexStatus::Failed => "failed",
        };
        write!(f, "{}", s)
    }
}

/// A reference document that can be chunked, embedded and searched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeSource {
    id: KnowledgeSourceId,
    title: String,
    content: String,
    metadata: serde_json::Value,
    status: IndexStatus,
    chunk_count: u32,
    indexed_at: Option<Timestamp>,
    last_error: Option<String>,
    created_at: Timestamp,
}

impl KnowledgeSource {
    /// Creates a pending source.
    ///
    /// # Errors
    ///
    /// - `ValidationFailed` if title or content is blank
    pub fn new(title: impl Into<String>, content: impl Into<String>) -> Result<Self, DomainError> {
        let title = title.into();
        let content = content.into();
        if title.trim().is_empty() {
            return Err(DomainError::validation("title", "Knowledge source title cannot be empty"));
        }
        if content.trim().is_empty() {
            return Err(DomainError::validation("content", "Knowledge source content cannot be empty"));
        }
        Ok(Self {
            id: KnowledgeSourceId::new(),
            title,
            content,
            metadata: serde_json::Value::Object(Default::default()),
            status: IndexStatus::Pending,
            chunk_count: 0,
            indexed_at: None,
            last_error: None,
            created_at: Timestamp::now(),
        })
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn id(&self) -> &KnowledgeSourceId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn metadata(&self) -> &serde_json::Value {
        &self.metadata
    }

    pub fn status(&self) -> IndexStatus {
        self.status
    }

    pub fn chunk_count(&self) -> u32 {
        self.chunk_count
    }

    pub fn indexed_at(&self) -> Option<&Timestamp> {
        self.indexed_at.as_ref()
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    pub fn created_at(&self) -> &Timestamp {
        &self.created_at
    }

    /// Starts an (re)index run.
    pub fn mark_indexing(&mut self) -> Result<(), DomainError> {
        self.transition(IndexStatus::Indexing)?;
        self.last_error = None;
        Ok(())
    }

    /// Records a completed run.
    pub fn mark_indexed(&mut self, chunk_count: u32) -> Result<(), DomainError> {
        self.transition(IndexStatus::Indexed)?;
        self.chunk_count = chunk_count;
        self.indexed_at = Some(Timestamp::now());
        Ok(())
    }

    /// Records a failed run; no chunks remain.
    pub fn mark_failed(&mut self, error: impl Into<String>) -> Result<(), DomainError> {
        self.transition(IndexStatus::Failed)?;
        self.chunk_count = 0;
        self.last_error = Some(error.into());
        Ok(())
    }

    fn transition(&mut self, target: IndexStatus) -> Result<(), DomainError> {
        self.status = self.status.transition_to(target).map_err(|_| {
            DomainError::new(
                ErrorCode::InvalidStateTransition,
                format!("Knowledge source {} cannot move from {} to {}", self.id, self.status, target),
            )
        })?;
        Ok(())
    }
}
