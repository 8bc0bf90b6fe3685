//! Pinecone vector index integration.

pub mod client;
pub mod types;

pub use client::PineconeClient;
pub use types::{IndexError, QueryMatch, VectorRecord};
