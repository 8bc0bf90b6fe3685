use crate::config::OpenAiConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised by embedding providers.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    /// HTTP layer failed before receiving a response.
    #[error("Embedding request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider responded with a non-success status.
    #[error("Unexpected embeddings response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the provider.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Provider returned a different number of vectors than inputs.
    #[error("Embedding provider returned {actual} vectors for {expected} inputs")]
    CountMismatch {
        /// Number of input texts submitted.
        expected: usize,
        /// Number of vectors received.
        actual: usize,
    },
}

/// Interface implemented by embedding backends.
///
/// Implementations must return one vector per input, preserving order, so
/// callers can rely on positional alignment with the submitted texts.
#[async_trait]
pub trait EmbeddingClient {
    /// Produce an embedding vector for each supplied text.
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError>;
}

/// Embedding client backed by the OpenAI embeddings API.
pub struct OpenAiEmbeddingClient {
    pub(crate) client: Client,
    pub(crate) endpoint: String,
    pub(crate) api_key: String,
    pub(crate) model: String,
}

impl OpenAiEmbeddingClient {
    /// Construct a client from OpenAI configuration.
    pub fn new(config: &OpenAiConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/embeddings", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.embedding_model.clone(),
        }
    }
}

#[async_trait]
impl EmbeddingClient for OpenAiEmbeddingClient {
    /// Submit all texts in a single batched call and collect vectors in input order.
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        if texts.is_empty() {
            return Ok(Vec::new());
        }
        let expected = texts.len();

        tracing::debug!(model = %self.model, inputs = expected, "Generating embeddings");
        let request = EmbeddingRequest {
            model: &self.model,
            input: &texts,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = EmbeddingError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Embedding request rejected");
            return Err(error);
        }

        let mut payload: EmbeddingResponse = response.json().await?;
        payload.data.sort_by_key(|entry| entry.index);

        if payload.data.len() != expected {
            return Err(EmbeddingError::CountMismatch {
                expected,
                actual: payload.data.len(),
            });
        }

        Ok(payload
            .data
            .into_iter()
            .map(|entry| entry.embedding)
            .collect())
    }
}

#[derive(Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Deserialize)]
struct EmbeddingData {
    embedding: Vec<f32>,
    index: usize,
}
