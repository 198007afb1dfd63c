//! In-memory knowledge store.
//!
//! Search is a linear cosine scan over the chunks of the requested sources,
//! which is fine for test corpora and small deployments.

use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::{DomainError, ErrorCode, KnowledgeSourceId};
use crate::domain::knowledge::{cosine_similarity, KnowledgeChunk, KnowledgeSource, ScoredChunk};
use crate::ports::{ChunkSearch, ChunkSearchResult, KnowledgeChunkRepository, KnowledgeSourceRepository, StaleChunks};

#[derive(Debug, Clone, Default)]
pub struct InMemoryKnowledgeSourceRepository {
    sources: Arc<RwLock<HashMap<KnowledgeSourceId, KnowledgeSource>>>,
}

impl InMemoryKnowledgeSourceRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KnowledgeSourceRepository for InMemoryKnowledgeSourceRepository {
    async fn save(&self, source: &KnowledgeSource) -> Result<(), DomainError> {
        let mut sources = self.sources.write().await;
        if sources.contains_key(source.id()) {
            return Err(DomainError::database(format!("knowledge source {} already exists", source.id())));
        }
        sources.insert(*source.id(), source.clone());
        Ok(())
    }

    async fn update(&self, source: &KnowledgeSource) -> Result<(), DomainError> {
        let mut sources = self.sources.write().await;
        match sources.get_mut(source.id()) {
            Some(stored) => {
                *stored = source.clone();
                Ok(())
            }
            None => Err(DomainError::new(
                ErrorCode::KnowledgeSourceNotFound,
                format!("knowledge source {} not found", source.id()),
            )),
        }
    }

    async fn find_by_id(&self, id: &KnowledgeSourceId) -> Result<Option<KnowledgeSource>, DomainError> {
        Ok(self.sources.read().await.get(id).cloned())
    }
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryKnowledgeChunkRepository {
    chunks: Arc<RwLock<HashMap<KnowledgeSourceId, Vec<KnowledgeChunk>>>>,
}

impl InMemoryKnowledgeChunkRepository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total chunks across all sources.
    pub async fn total_chunks(&self) -> usize {
        self.chunks.read().await.values().map(Vec::len).sum()
    }
}

#[async_trait]
impl KnowledgeChunkRepository for InMemoryKnowledgeChunkRepository {
    async fn save_batch(&self, batch: &[KnowledgeChunk]) -> Result<(), DomainError> {
        let mut chunks = self.chunks.write().await;
        for chunk in batch {
            chunks.entry(chunk.source_id).or_default().push(chunk.clone());
        }
        Ok(())
    }

    async fn delete_by_source(&self, source_id: &KnowledgeSourceId) -> Result<usize, DomainError> {
        Ok(self.chunks.write().await.remove(source_id).map_or(0, |removed| removed.len()))
    }

    async fn list_by_source(&self, source_id: &KnowledgeSourceId) -> Result<Vec<KnowledgeChunk>, DomainError> {
        let mut listed = self.chunks.read().await.get(source_id).cloned().unwrap_or_default();
        listed.sort_by_key(|c| c.ordinal);
        Ok(listed)
    }

    async fn search(&self, search: ChunkSearch<'_>) -> Result<ChunkSearchResult, DomainError> {
        let wanted: HashSet<&KnowledgeSourceId> = search.source_ids.iter().collect();
        let chunks = self.chunks.read().await;

        let mut result = ChunkSearchResult::default();
        let mut stale: BTreeMap<(KnowledgeSourceId, &str), usize> = BTreeMap::new();
        for (source_id, source_chunks) in chunks.iter().filter(|(source_id, _)| wanted.contains(source_id)) {
            for chunk in source_chunks {
                if chunk.embedding_model != search.embedding_model {
                    *stale.entry((*source_id, chunk.embedding_model.as_str())).or_default() += 1;
                    continue;
                }
                let similarity = cosine_similarity(search.embedding, &chunk.embedding);
                if similarity >= search.min_similarity {
                    result.hits.push(ScoredChunk {
                        similarity,
                        chunk: chunk.clone(),
                    });
                }
            }
        }

        // Ties resolve by source then ordinal so results are stable.
        result.hits.sort_by(|a, b| {
            b.similarity
                .total_cmp(&a.similarity)
                .then_with(|| a.chunk.source_id.cmp(&b.chunk.source_id))
                .then_with(|| a.chunk.ordinal.cmp(&b.chunk.ordinal))
        });
        result.hits.truncate(search.limit);
        result.stale = stale
            .into_iter()
            .map(|((source_id, model), count)| StaleChunks {
                source_id,
                embedding_model: model.to_string(),
                count,
            })
            .collect();
        Ok(result)
    }
}
