//! HTTP surface for docrag.
//!
//! This module exposes a compact Axum router with three endpoints:
//!
//! - `POST /documents` – Multipart upload of a PDF plus a `namespace` field.
//!   The payload is written to S3 under its filename, then loaded, chunked,
//!   embedded, and upserted into the vector index. Returns the public URL and
//!   the number of chunks indexed.
//! - `POST /ask` – Answer a question from content indexed under a namespace.
//! - `GET /metrics` – Observe pipeline counters.
//!
//! Core errors are mapped to HTTP statuses here; the pipeline itself signals
//! plain error kinds and never deals in wire statuses.

use crate::pipeline::{AnswerError, IngestError, PipelineApi};
use crate::storage::StorageError;
use axum::{
    Json, Router,
    extract::{Multipart, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Build the HTTP router exposing the pipeline API surface.
pub fn create_router<S>(service: Arc<S>) -> Router
where
    S: PipelineApi + 'static,
{
    Router::new()
        .route("/documents", post(upload_document::<S>))
        .route("/ask", post(ask_question::<S>))
        .route("/metrics", get(get_metrics::<S>))
        .with_state(service)
}

/// Success response for the `POST /documents` endpoint.
#[derive(Serialize)]
struct UploadResponse {
    /// Public URL of the stored document.
    url: String,
    /// Number of chunks upserted into the index.
    chunk_count: usize,
}

/// Upload a document and ingest it into the target namespace.
///
/// Expects a multipart body with a `file` part (the PDF payload, named with
/// its destination key) and a `namespace` part.
async fn upload_document<S>(
    State(service): State<Arc<S>>,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>, AppError>
where
    S: PipelineApi,
{
    let mut file: Option<(String, Vec<u8>)> = None;
    let mut namespace: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|err| AppError::BadRequest(err.to_string()))?
    {
        let name = field.name().map(ToString::to_string);
        match name.as_deref() {
            Some("file") => {
                let filename = field
                    .file_name()
                    .map(ToString::to_string)
                    .ok_or_else(|| AppError::BadRequest("file part has no filename".into()))?;
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|err| AppError::BadRequest(err.to_string()))?;
                file = Some((filename, bytes.to_vec()));
            }
            Some("namespace") => {
                let value = field
                    .text()
                    .await
                    .map_err(|err| AppError::BadRequest(err.to_string()))?;
                namespace = Some(value);
            }
            _ => {}
        }
    }

    let (filename, bytes) = file.ok_or_else(|| AppError::BadRequest("missing file part".into()))?;
    let namespace =
        namespace.ok_or_else(|| AppError::BadRequest("missing namespace part".into()))?;

    let url = service.upload_document(bytes, &filename).await?;
    let outcome = service.ingest_document(&url, &namespace).await?;
    tracing::info!(
        url,
        namespace,
        chunks = outcome.chunk_count,
        "Document request completed"
    );
    Ok(Json(UploadResponse {
        url,
        chunk_count: outcome.chunk_count,
    }))
}

/// Request body for the `POST /ask` endpoint.
#[derive(Deserialize)]
struct AskRequest {
    /// Natural-language question to answer.
    question: String,
    /// Namespace holding the indexed document content.
    namespace: String,
}

/// Success response for the `POST /ask` endpoint.
#[derive(Serialize)]
struct AskResponse {
    /// Generated answer text.
    answer: String,
}

/// Answer a question from content indexed under a namespace.
async fn ask_question<S>(
    State(service): State<Arc<S>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError>
where
    S: PipelineApi,
{
    let answer = service
        .answer_question(&request.question, &request.namespace)
        .await?;
    Ok(Json(AskResponse { answer }))
}

/// Return a concise metrics snapshot with pipeline counters.
async fn get_metrics<S>(
    State(service): State<Arc<S>>,
) -> Json<crate::metrics::MetricsSnapshot>
where
    S: PipelineApi,
{
    Json(service.metrics_snapshot())
}

/// Error type translating core error kinds into HTTP responses.
enum AppError {
    /// Request body was malformed or incomplete.
    BadRequest(String),
    /// Object storage write failed.
    Storage(StorageError),
    /// Vectorize-and-upsert pipeline failed.
    Ingest(IngestError),
    /// Question answering failed.
    Answer(AnswerError),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            Self::Storage(error) => (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
            Self::Ingest(error) => (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
            Self::Answer(error) => (StatusCode::INTERNAL_SERVER_ERROR, error.to_string()),
        };
        (status, message).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(inner: StorageError) -> Self {
        Self::Storage(inner)
    }
}

impl From<IngestError> for AppError {
    fn from(inner: IngestError) -> Self {
        Self::Ingest(inner)
    }
}

impl From<AnswerError> for AppError {
    fn from(inner: AnswerError) -> Self {
        Self::Answer(inner)
    }
}
