//! Knowledge store ports.
//!
//! Sources and chunks are stored separately. Chunks are only ever created in
//! bulk and deleted in bulk per source; there is no partial update.

use crate::domain::foundation::{DomainError, KnowledgeSourceId};
use crate::domain::knowledge::{KnowledgeChunk, KnowledgeSource, ScoredChunk};
use async_trait::async_trait;

/// Repository for knowledge source documents.
#[async_trait]
pub trait KnowledgeSourceRepository: Send + Sync {
    async fn save(&self, source: &KnowledgeSource) -> Result<(), DomainError>;

    /// # Errors
    ///
    /// - `KnowledgeSourceNotFound` if the source doesn't exist
    async fn update(&self, source: &KnowledgeSource) -> Result<(), DomainError>;

    async fn find_by_id(&self, id: &KnowledgeSourceId) -> Result<Option<KnowledgeSource>, DomainError>;
}

/// Similarity query scoped to a set of sources.
#[derive(Debug, Clone)]
pub struct ChunkSearch<'a> {
    pub embedding: &'a [f32],
    /// Only chunks embedded with this model are compared.
    pub embedding_model: &'a str,
    /// Never empty; callers short-circuit before searching.
    pub source_ids: &'a [KnowledgeSourceId],
    pub min_similarity: f32,
    pub limit: usize,
}

/// Chunks of one source skipped because another model embedded them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaleChunks {
    pub source_id: KnowledgeSourceId,
    pub embedding_model: String,
    pub count: usize,
}

/// Search hits plus the chunks the model filter excluded.
#[derive(Debug, Clone, Default)]
pub struct ChunkSearchResult {
    pub hits: Vec<ScoredChunk>,
    pub stale: Vec<StaleChunks>,
}

impl ChunkSearchResult {
    pub fn excluded(&self) -> usize {
        self.stale.iter().map(|s| s.count).sum()
    }
}

/// Repository for embedded chunks.
#[async_trait]
pub trait KnowledgeChunkRepository: Send + Sync {
    /// Stores a batch of chunks.
    async fn save_batch(&self, chunks: &[KnowledgeChunk]) -> Result<(), DomainError>;

    /// Deletes every chunk of a source. Returns how many were removed.
    async fn delete_by_source(&self, source_id: &KnowledgeSourceId) -> Result<usize, DomainError>;

    /// Chunks of one source ordered by ordinal.
    async fn list_by_source(&self, source_id: &KnowledgeSourceId) -> Result<Vec<KnowledgeChunk>, DomainError>;

    /// Top chunks by cosine similarity, descending, restricted to
    /// `search.source_ids` and `search.embedding_model`. Chunks of a
    /// requested source embedded by any other model are reported in `stale`.
    async fn search(&self, search: ChunkSearch<'_>) -> Result<ChunkSearchResult, DomainError>;
}
