//! HTTP client wrapper for writing objects to S3.

use crate::config::StorageConfig;
use crate::storage::sign::{SigningParams, sha256_hex, sign_request, uri_encode_path};
use crate::storage::types::StorageError;
use reqwest::Client;
use time::OffsetDateTime;

/// Lightweight S3 client covering the single operation the pipeline needs:
/// a blocking PUT of an in-memory payload under a destination key.
///
/// Requests are signed with AWS Signature V4. The public URL is formed from
/// the bucket name, region, and key; it is an assumed addressing convention
/// and is never validated against the bucket.
pub struct S3Client {
    pub(crate) client: Client,
    pub(crate) bucket: String,
    pub(crate) region: String,
    pub(crate) access_key: String,
    pub(crate) secret_key: String,
    pub(crate) endpoint: String,
    pub(crate) host: String,
}

impl S3Client {
    /// Construct a new client from storage configuration.
    pub fn new(config: &StorageConfig) -> Result<Self, StorageError> {
        let client = Client::builder().user_agent("docrag/0.1").build()?;
        let (endpoint, host) = resolve_endpoint(config)?;
        tracing::debug!(
            bucket = %config.bucket,
            region = %config.region,
            endpoint = %endpoint,
            "Initialized S3 HTTP client"
        );

        Ok(Self {
            client,
            bucket: config.bucket.clone(),
            region: config.region.clone(),
            access_key: config.access_key.clone(),
            secret_key: config.secret_key.clone(),
            endpoint,
            host,
        })
    }

    /// Write a byte payload to the bucket under the given key.
    ///
    /// The call blocks until S3 acknowledges the write. No retry is attempted;
    /// any failure surfaces as a [`StorageError`] carrying the response detail.
    pub async fn put_object(&self, key: &str, bytes: Vec<u8>) -> Result<(), StorageError> {
        let canonical_uri = format!("/{}", uri_encode_path(key));
        let payload_hash = sha256_hex(&bytes);
        let signed = sign_request(&SigningParams {
            access_key: &self.access_key,
            secret_key: &self.secret_key,
            region: &self.region,
            host: &self.host,
            method: "PUT",
            canonical_uri: &canonical_uri,
            payload_hash: &payload_hash,
            timestamp: OffsetDateTime::now_utc(),
        });

        let content_type = mime_guess::from_path(key).first_or_octet_stream();
        let response = self
            .client
            .put(format!("{}{}", self.endpoint, canonical_uri))
            .header("authorization", signed.authorization)
            .header("x-amz-date", signed.amz_date)
            .header("x-amz-content-sha256", payload_hash)
            .header("content-type", content_type.as_ref())
            .body(bytes)
            .send()
            .await?;

        if response.status().is_success() {
            tracing::debug!(bucket = %self.bucket, key, "Object stored");
            Ok(())
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = StorageError::UnexpectedStatus { status, body };
            tracing::error!(bucket = %self.bucket, key, error = %error, "Object write failed");
            Err(error)
        }
    }

    /// Deterministic public URL for an object key.
    pub fn public_url(&self, key: &str) -> String {
        format!(
            "https://{}.s3.{}.amazonaws.com/{}",
            self.bucket, self.region, key
        )
    }
}

/// Resolve the request endpoint and `Host` header value for the bucket.
///
/// Defaults to virtual-hosted-style addressing; an explicit endpoint override
/// (LocalStack, MinIO, test servers) is used verbatim.
fn resolve_endpoint(config: &StorageConfig) -> Result<(String, String), StorageError> {
    match &config.endpoint {
        Some(endpoint) => {
            let url = reqwest::Url::parse(endpoint)
                .map_err(|err| StorageError::InvalidEndpoint(err.to_string()))?;
            let host = url
                .host_str()
                .ok_or_else(|| StorageError::InvalidEndpoint(endpoint.clone()))?;
            let host = match url.port() {
                Some(port) => format!("{host}:{port}"),
                None => host.to_string(),
            };
            Ok((endpoint.trim_end_matches('/').to_string(), host))
        }
        None => {
            let host = format!("{}.s3.{}.amazonaws.com", config.bucket, config.region);
            Ok((format!("https://{host}"), host))
        }
    }
}
