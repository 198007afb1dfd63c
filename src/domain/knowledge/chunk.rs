//! Knowledge chunks and search hits.

use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ChunkId, KnowledgeSourceId, Timestamp};

/// One embedded slice of a knowledge source. Immutable once stored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KnowledgeChunk {
    pub id: ChunkId,
    pub source_id: KnowledgeSourceId,
    /// Position within the source, contiguous from 0.
    pub ordinal: u32,
    pub content: String,
    pub embedding: Vec<f32>,
    /// Model that produced `embedding`; queries must use the same one.
    pub embedding_model: String,
    pub metadata: serde_json::Value,
    pub created_at: Timestamp,
}

impl KnowledgeChunk {
    pub fn new(
        source_id: KnowledgeSourceId,
        ordinal: u32,
        content: String,
        embedding: Vec<f32>,
        embedding_model: impl Into<String>,
    ) -> Self {
        Self {
            id: ChunkId::new(),
            source_id,
            ordinal,
            content,
            embedding,
            embedding_model: embedding_model.into(),
            metadata: serde_json::Value::Object(Default::default()),
            created_at: Timestamp::now(),
        }
    }

    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }
}

/// A chunk returned by similarity search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredChunk {
    pub chunk: KnowledgeChunk,
    pub similarity: f32,
}
