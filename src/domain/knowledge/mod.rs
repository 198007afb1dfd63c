//! Knowledge module - reference documents, chunks and similarity.

mod chunk;
mod chunker;
mod similarity;
mod source;

pub use chunk::{KnowledgeChunk, ScoredChunk};
pub use chunker::{TextChunker, DEFAULT_CHUNK_OVERLAP, DEFAULT_CHUNK_SIZE};
pub use similarity::cosine_similarity;
pub use source::{IndexStatus, KnowledgeSource};
