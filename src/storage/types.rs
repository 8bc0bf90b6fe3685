//! Shared types used by the storage client.

use reqwest::StatusCode;
use thiserror::Error;

/// Errors returned while writing objects to S3.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Endpoint override failed to parse.
    #[error("Invalid storage endpoint: {0}")]
    InvalidEndpoint(String),
    /// HTTP layer failed before receiving a response.
    #[error("Storage request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// S3 responded with an unexpected status code.
    #[error("Unexpected storage response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned from S3.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
}
