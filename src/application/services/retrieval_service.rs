//! Retrieval service: knowledge indexing and similarity search.
//!
//! Retrieval is an enhancement. `retrieve` never fails; embedding problems
//! produce an empty result and a warning. `embed_query` is the diagnostic
//! path that does surface capability errors.

use futures::stream::{self, StreamExt};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::application::errors::EngineError;
use crate::application::services::SourceLocks;
use crate::domain::conversation::GroundingSource;
use crate::domain::foundation::KnowledgeSourceId;
use crate::domain::knowledge::{KnowledgeChunk, KnowledgeSource, ScoredChunk, TextChunker};
use crate::ports::{
    ChunkSearch, EmbeddingError, EmbeddingProvider, KnowledgeChunkRepository, KnowledgeSourceRepository,
};

/// Tunables taken from the retrieval and AI configuration sections.
#[derive(Debug, Clone)]
pub struct RetrievalSettings {
    pub top_k: usize,
    pub min_similarity: f32,
    pub max_context_chars: usize,
    pub embedding_concurrency: usize,
    pub embedding_timeout: Duration,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            top_k: 5,
            min_similarity: 0.7,
            max_context_chars: 4000,
            embedding_concurrency: 4,
            embedding_timeout: Duration::from_secs(5),
        }
    }
}

/// Retrieved chunks rendered into a bounded block of prompt text.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RetrievedContext {
    pub text: String,
    /// Chunks that made it into `text`, best first.
    pub sources: Vec<GroundingSource>,
    /// True when the budget cut or dropped a chunk.
    pub truncated: bool,
}

impl RetrievedContext {
    /// Renders `chunks` (best first) within `max_chars` characters.
    ///
    /// The lowest-ranked chunk that does not fit is truncated, and every
    /// chunk after it is dropped.
    pub fn build(chunks: &[ScoredChunk], max_chars: usize) -> Self {
        let mut context = Self::default();
        let mut used = 0;

        for (rank, hit) in chunks.iter().enumerate() {
            let separator = if context.text.is_empty() { 0 } else { 2 };
            let header = format!("[{}] ", rank + 1);
            let overhead = separator + header.chars().count();
            let remaining = max_chars.saturating_sub(used + overhead);
            if remaining == 0 {
                context.truncated = true;
                break;
            }

            let body_len = hit.chunk.content.chars().count();
            let body: String = if body_len <= remaining {
                hit.chunk.content.clone()
            } else {
                context.truncated = true;
                hit.chunk.content.chars().take(remaining).collect()
            };

            if separator > 0 {
                context.text.push_str("\n\n");
            }
            context.text.push_str(&header);
            context.text.push_str(&body);
            used += overhead + body.chars().count();
            context.sources.push(GroundingSource {
                source_id: hit.chunk.source_id,
                chunk_id: hit.chunk.id,
                ordinal: hit.chunk.ordinal,
                similarity: hit.similarity,
            });

            if context.truncated {
                break;
            }
        }
        context
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

pub struct RetrievalService {
    sources: Arc<dyn KnowledgeSourceRepository>,
    chunks: Arc<dyn KnowledgeChunkRepository>,
    embeddings: Arc<dyn EmbeddingProvider>,
    chunker: TextChunker,
    settings: RetrievalSettings,
    source_locks: SourceLocks,
}

impl RetrievalService {
    pub fn new(
        sources: Arc<dyn KnowledgeSourceRepository>,
        chunks: Arc<dyn KnowledgeChunkRepository>,
        embeddings: Arc<dyn EmbeddingProvider>,
        chunker: TextChunker,
        settings: RetrievalSettings,
    ) -> Self {
        Self {
            sources,
            chunks,
            embeddings,
            chunker,
            settings,
            source_locks: SourceLocks::new(),
        }
    }

    pub fn settings(&self) -> &RetrievalSettings {
        &self.settings
    }

    /// Stores a new, pending source. Indexing is a separate step.
    pub async fn register_source(&self, source: KnowledgeSource) -> Result<KnowledgeSource, EngineError> {
        self.sources.save(&source).await?;
        tracing::info!(source_id = %source.id(), title = source.title(), "Knowledge source registered");
        Ok(source)
    }

    pub async fn get_source(&self, id: &KnowledgeSourceId) -> Result<KnowledgeSource, EngineError> {
        self.sources
            .find_by_id(id)
            .await?
            .ok_or_else(|| EngineError::source_not_found(id))
    }

    pub async fn list_chunks(&self, id: &KnowledgeSourceId) -> Result<Vec<KnowledgeChunk>, EngineError> {
        Ok(self.chunks.list_by_source(id).await?)
    }

    /// Indexes a source from scratch.
    pub async fn index_source(&self, id: &KnowledgeSourceId) -> Result<KnowledgeSource, EngineError> {
        self.reindex_source(id).await
    }

    /// Deletes every chunk of the source, then chunks, embeds and stores it
    /// again.
    ///
    /// An embedding failure on any chunk leaves the source `Failed` with no
    /// chunks; the returned source carries that status. Repository errors
    /// are returned. Runs on the same source are serialized.
    pub async fn reindex_source(&self, id: &KnowledgeSourceId) -> Result<KnowledgeSource, EngineError> {
        let guard = self.source_locks.acquire(*id).await;
        let result = self.reindex_locked(id).await;
        drop(guard);
        self.source_locks.release(id);
        result
    }

    async fn reindex_locked(&self, id: &KnowledgeSourceId) -> Result<KnowledgeSource, EngineError> {
        let started = Instant::now();
        let mut source = self.get_source(id).await?;

        source.mark_indexing()?;
        self.sources.update(&source).await?;

        let removed = self.chunks.delete_by_source(id).await?;
        if removed > 0 {
            tracing::debug!(source_id = %id, removed, "Removed previous chunks");
        }

        let texts = self.chunker.chunk(source.content());
        let chunks = match self.embed_chunks(&source, texts).await {
            Ok(chunks) => chunks,
            Err(err) => {
                tracing::warn!(source_id = %id, error = %err, "Indexing failed, source left without chunks");
                source.mark_failed(err.to_string())?;
                self.sources.update(&source).await?;
                return Ok(source);
            }
        };

        if let Err(err) = self.chunks.save_batch(&chunks).await {
            self.chunks.delete_by_source(id).await?;
            source.mark_failed(err.to_string())?;
            self.sources.update(&source).await?;
            return Err(err.into());
        }

        source.mark_indexed(chunks.len() as u32)?;
        self.sources.update(&source).await?;

        tracing::info!(
            source_id = %id,
            chunks = chunks.len(),
            embedding_model = self.embeddings.model_id(),
            latency_ms = started.elapsed().as_millis() as u64,
            "Knowledge source indexed"
        );
        Ok(source)
    }

    async fn embed_chunks(
        &self,
        source: &KnowledgeSource,
        texts: Vec<String>,
    ) -> Result<Vec<KnowledgeChunk>, EmbeddingError> {
        let model = self.embeddings.model_id().to_string();
        let source_id = *source.id();

        let embedded: Vec<Result<KnowledgeChunk, EmbeddingError>> = stream::iter(texts.into_iter().enumerate())
            .map(|(ordinal, text)| {
                let model = model.clone();
                async move {
                    let embedding = self.embed_with_timeout(&text).await?;
                    Ok(KnowledgeChunk::new(source_id, ordinal as u32, text, embedding, model).with_metadata(
                        serde_json::json!({ "source_title": source.title() }),
                    ))
                }
            })
            .buffered(self.settings.embedding_concurrency.max(1))
            .collect()
            .await;

        embedded.into_iter().collect()
    }

    async fn embed_with_timeout(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let embedding = timeout(self.settings.embedding_timeout, self.embeddings.embed(text))
            .await
            .map_err(|_| EmbeddingError::Timeout {
                timeout_ms: self.settings.embedding_timeout.as_millis() as u64,
            })??;

        let expected = self.embeddings.dimensions();
        if embedding.len() != expected {
            return Err(EmbeddingError::DimensionMismatch {
                expected,
                actual: embedding.len(),
            });
        }
        Ok(embedding)
    }

    /// Embeds a query, surfacing capability errors.
    pub async fn embed_query(&self, query: &str) -> Result<Vec<f32>, EngineError> {
        if query.trim().is_empty() {
            return Err(EngineError::validation("query cannot be empty"));
        }
        Ok(self.embed_with_timeout(query).await?)
    }

    /// Top chunks for `query` from the given sources, best first.
    ///
    /// Returns empty without embedding when `source_ids` is empty, and
    /// empty with a warning when embedding or search fails.
    pub async fn retrieve(&self, query: &str, source_ids: &[KnowledgeSourceId], limit: usize) -> Vec<ScoredChunk> {
        if source_ids.is_empty() || limit == 0 || query.trim().is_empty() {
            return Vec::new();
        }

        let embedding = match self.embed_with_timeout(query).await {
            Ok(embedding) => embedding,
            Err(err) => {
                tracing::warn!(error = %err, "Query embedding failed, continuing without context");
                return Vec::new();
            }
        };

        let search = ChunkSearch {
            embedding: &embedding,
            embedding_model: self.embeddings.model_id(),
            source_ids,
            min_similarity: self.settings.min_similarity,
            limit,
        };
        match self.chunks.search(search).await {
            Ok(result) => {
                for stale in &result.stale {
                    tracing::warn!(
                        source_id = %stale.source_id,
                        embedding_model = %stale.embedding_model,
                        active_model = self.embeddings.model_id(),
                        excluded = stale.count,
                        "Chunks embedded by another model excluded, reindex the source"
                    );
                }
                tracing::debug!(sources = source_ids.len(), hits = result.hits.len(), "Retrieved knowledge chunks");
                result.hits
            }
            Err(err) => {
                tracing::warn!(error = %err, "Chunk search failed, continuing without context");
                Vec::new()
            }
        }
    }

    /// Retrieves with the configured `top_k` and renders the context block.
    pub async fn retrieve_context(&self, query: &str, source_ids: &[KnowledgeSourceId]) -> RetrievedContext {
        let hits = self.retrieve(query, source_ids, self.settings.top_k).await;
        RetrievedContext::build(&hits, self.settings.max_context_chars)
    }
}
