//! HTTP client wrapper for interacting with Pinecone.

use crate::config::IndexConfig;
use crate::index::types::{IndexError, QueryMatch, QueryResponse, VectorRecord};
use reqwest::{Client, Method};
use serde_json::json;

/// Lightweight HTTP client for Pinecone data-plane operations.
pub struct PineconeClient {
    pub(crate) client: Client,
    pub(crate) base_url: String,
    pub(crate) api_key: String,
}

impl PineconeClient {
    /// Construct a new client from index configuration.
    pub fn new(config: &IndexConfig) -> Result<Self, IndexError> {
        let client = Client::builder().user_agent("docrag/0.1").build()?;
        let base_url = normalize_base_url(&config.host).map_err(IndexError::InvalidHost)?;
        tracing::debug!(host = %base_url, "Initialized Pinecone HTTP client");

        Ok(Self {
            client,
            base_url,
            api_key: config.api_key.clone(),
        })
    }

    /// Submit records to the index in a single batched write scoped to a namespace.
    ///
    /// Records sharing an identifier with ones already present in the
    /// namespace are overwritten. An empty batch is acknowledged locally
    /// without touching the index.
    pub async fn upsert(
        &self,
        namespace: &str,
        records: Vec<VectorRecord>,
    ) -> Result<(), IndexError> {
        if records.is_empty() {
            return Ok(());
        }

        let record_count = records.len();
        let body = json!({
            "vectors": records,
            "namespace": namespace,
        });

        let response = self
            .request(Method::POST, "vectors/upsert")
            .json(&body)
            .send()
            .await?;

        if response.status().is_success() {
            tracing::debug!(namespace, records = record_count, "Vectors upserted");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = IndexError::UnexpectedStatus { status, body };
            tracing::error!(namespace, error = %error, "Pinecone upsert failed");
            Err(error)
        }
    }

    /// Query a namespace for the records most similar to a vector.
    pub async fn query(
        &self,
        namespace: &str,
        vector: Vec<f32>,
        top_k: usize,
    ) -> Result<Vec<QueryMatch>, IndexError> {
        let body = json!({
            "vector": vector,
            "topK": top_k,
            "namespace": namespace,
            "includeMetadata": true,
        });

        let response = self
            .request(Method::POST, "query")
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = IndexError::UnexpectedStatus { status, body };
            tracing::error!(namespace, error = %error, "Pinecone query failed");
            return Err(error);
        }

        let payload: QueryResponse = response.json().await?;
        Ok(payload
            .matches
            .into_iter()
            .map(|entry| QueryMatch {
                id: entry.id,
                score: entry.score,
                metadata: entry.metadata,
            })
            .collect())
    }

    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}/{}", self.base_url.trim_end_matches('/'), path);
        self.client
            .request(method, url)
            .header("api-key", &self.api_key)
    }
}

fn normalize_base_url(host: &str) -> Result<String, String> {
    let candidate = if host.starts_with("http://") || host.starts_with("https://") {
        host.to_string()
    } else {
        // Pinecone consoles hand out bare hostnames.
        format!("https://{host}")
    };
    let parsed = reqwest::Url::parse(&candidate).map_err(|err| err.to_string())?;
    Ok(parsed.to_string().trim_end_matches('/').to_string())
}
