//! PDF loading and text splitting.

pub mod loader;
pub mod splitter;

pub use loader::{LoadError, PageText, PdfLoader};
pub use splitter::{ChunkMetadata, DocumentChunk, split_pages};
