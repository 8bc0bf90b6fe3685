#![deny(missing_docs)]

//! Core library for the docrag question-answering backend.

/// HTTP routing and REST handlers.
pub mod api;
/// Prompt-templated answer chain over a completion model.
pub mod chain;
/// Environment-driven configuration management.
pub mod config;
/// PDF loading and text splitting.
pub mod document;
/// Embedding client abstraction and adapters.
pub mod embedding;
/// Pinecone vector index integration.
pub mod index;
/// Structured logging and tracing setup.
pub mod logging;
/// Ingestion metrics helpers.
pub mod metrics;
/// Pipeline orchestration: upload, vectorize, upsert, answer.
pub mod pipeline;
/// S3 object storage integration.
pub mod storage;
