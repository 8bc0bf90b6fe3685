//! Core data types and error definitions for the pipeline.

use crate::chain::CompletionError;
use crate::document::{DocumentChunk, LoadError};
use crate::embedding::EmbeddingError;
use crate::index::IndexError;
use thiserror::Error;

/// Errors emitted while vectorizing and indexing a document.
///
/// Each variant corresponds to one external collaborator, so callers can
/// surface a diagnosable message without inspecting source error types. All
/// are terminal for the current call; nothing is retried and no partial
/// results are returned.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Source document was unreachable or unparseable.
    #[error("Failed to load document: {0}")]
    Load(#[from] LoadError),
    /// Embedding provider call failed.
    #[error("Failed to generate document vectors: {0}")]
    Embedding(#[from] EmbeddingError),
    /// Write to the vector index failed.
    #[error("Failed to upsert to index: {0}")]
    Index(#[from] IndexError),
}

/// Errors emitted while answering a question over indexed content.
#[derive(Debug, Error)]
pub enum AnswerError {
    /// Embedding provider failed to vectorize the question.
    #[error("Failed to embed question: {0}")]
    Embedding(#[from] EmbeddingError),
    /// Embedding provider returned no vector for the question.
    #[error("Embedding provider returned no vector for the question")]
    EmptyEmbedding,
    /// Index query failed.
    #[error("Failed to query index: {0}")]
    Index(#[from] IndexError),
    /// Completion model call failed.
    #[error("Failed to generate answer: {0}")]
    Completion(#[from] CompletionError),
}

/// Positionally-aligned vectorization result.
///
/// `vectors` and `chunks` always have equal length; the i-th vector was
/// computed from the i-th chunk.
#[derive(Debug, Clone)]
pub struct VectorizedDocument {
    /// One embedding vector per chunk, in chunk order.
    pub vectors: Vec<Vec<f32>>,
    /// Document chunks with source metadata, in split order.
    pub chunks: Vec<DocumentChunk>,
}

/// Summary of a completed ingestion.
#[derive(Debug, Clone, Copy)]
pub struct IngestOutcome {
    /// Number of records upserted into the index.
    pub chunk_count: usize,
}
