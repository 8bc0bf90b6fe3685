//! S3 object storage integration.

pub mod client;
mod sign;
pub mod types;

pub use client::S3Client;
pub use types::StorageError;
