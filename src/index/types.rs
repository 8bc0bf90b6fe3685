//! Shared types used by the Pinecone client.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;

/// Errors returned while interacting with Pinecone.
#[derive(Debug, Error)]
pub enum IndexError {
    /// Index host URL failed to parse or normalize.
    #[error("Invalid Pinecone host: {0}")]
    InvalidHost(String),
    /// HTTP layer failed before receiving a response.
    #[error("Index request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Pinecone responded with an unexpected status code.
    #[error("Unexpected Pinecone response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from Pinecone.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}

/// One record submitted to the index: identifier, vector values, and metadata.
///
/// Ownership transfers to the index once upserted; the pipeline retains no copy.
#[derive(Debug, Clone, Serialize)]
pub struct VectorRecord {
    /// Record identifier, keyed for insert-or-overwrite semantics.
    pub id: String,
    /// Embedding vector values.
    pub values: Vec<f32>,
    /// Metadata object stored alongside the vector.
    pub metadata: Map<String, Value>,
}

/// Scored match returned by an index query.
#[derive(Debug, Clone)]
pub struct QueryMatch {
    /// Identifier of the matched record.
    pub id: String,
    /// Similarity score computed by the index.
    pub score: f32,
    /// Metadata stored with the record, if requested.
    pub metadata: Option<Map<String, Value>>,
}

#[derive(Deserialize)]
pub(crate) struct QueryResponse {
    #[serde(default)]
    pub(crate) matches: Vec<QueryResponseMatch>,
}

#[derive(Deserialize)]
pub(crate) struct QueryResponseMatch {
    pub(crate) id: String,
    #[serde(default)]
    pub(crate) score: f32,
    #[serde(default)]
    pub(crate) metadata: Option<Map<String, Value>>,
}
