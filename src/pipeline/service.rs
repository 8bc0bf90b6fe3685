//! Pipeline service coordinating storage, loading, embedding, indexing, and answering.

use crate::{
    chain::AnswerChain,
    config::SplitterConfig,
    document::{DocumentChunk, PageText, PdfLoader, split_pages},
    embedding::EmbeddingClient,
    index::{PineconeClient, VectorRecord},
    metrics::{MetricsSnapshot, PipelineMetrics},
    pipeline::types::{AnswerError, IngestError, IngestOutcome, VectorizedDocument},
    storage::{S3Client, StorageError},
};
use async_trait::async_trait;
use serde_json::{Map, Value};
use std::sync::Arc;

/// Number of index matches retrieved as answer context.
const ANSWER_TOP_K: usize = 4;

/// Coordinates the document pipeline: upload, vectorize, upsert, and answer.
///
/// Every external collaborator is injected at construction and owned by the
/// caller's composition root, so tests can substitute stub clients. The
/// service holds no per-request state; each call runs sequentially against
/// the external services with no internal retries.
pub struct PipelineService {
    storage: S3Client,
    loader: PdfLoader,
    embedder: Box<dyn EmbeddingClient + Send + Sync>,
    index: PineconeClient,
    chain: AnswerChain,
    splitter: SplitterConfig,
    metrics: Arc<PipelineMetrics>,
}

/// Abstraction over the pipeline used by the HTTP surface.
#[async_trait]
pub trait PipelineApi: Send + Sync {
    /// Store a byte payload under a key and return its public URL.
    async fn upload_document(&self, bytes: Vec<u8>, key: &str) -> Result<String, StorageError>;

    /// Vectorize a document and upsert its records into a namespace.
    async fn ingest_document(
        &self,
        uri: &str,
        namespace: &str,
    ) -> Result<IngestOutcome, IngestError>;

    /// Answer a question from content indexed under a namespace.
    async fn answer_question(&self, question: &str, namespace: &str)
    -> Result<String, AnswerError>;

    /// Retrieve the current metrics snapshot for diagnostics.
    fn metrics_snapshot(&self) -> MetricsSnapshot;
}

impl PipelineService {
    /// Build a new pipeline service from injected collaborators.
    pub fn new(
        storage: S3Client,
        loader: PdfLoader,
        embedder: Box<dyn EmbeddingClient + Send + Sync>,
        index: PineconeClient,
        chain: AnswerChain,
        splitter: SplitterConfig,
    ) -> Self {
        Self {
            storage,
            loader,
            embedder,
            index,
            chain,
            splitter,
            metrics: Arc::new(PipelineMetrics::new()),
        }
    }

    /// Store a byte payload under a key and return its public URL.
    ///
    /// The URL is formed from the bucket, region, and key; it is not
    /// validated for existence.
    pub async fn upload_document(
        &self,
        bytes: Vec<u8>,
        key: &str,
    ) -> Result<String, StorageError> {
        self.storage.put_object(key, bytes).await?;
        self.metrics.record_upload();
        Ok(self.storage.public_url(key))
    }

    /// Load a document, split it into chunks, and embed every chunk.
    ///
    /// Returns two positionally-aligned sequences of equal length. An empty
    /// or zero-page document produces empty sequences without touching the
    /// embedding provider; a loader failure surfaces before any embedding
    /// call is made.
    pub async fn vectorize(&self, uri: &str) -> Result<VectorizedDocument, IngestError> {
        let pages = self.loader.load_pages(uri).await?;
        self.vectorize_pages(pages, uri).await
    }

    pub(crate) async fn vectorize_pages(
        &self,
        pages: Vec<PageText>,
        source: &str,
    ) -> Result<VectorizedDocument, IngestError> {
        let chunks = split_pages(
            &pages,
            self.splitter.chunk_size,
            self.splitter.chunk_overlap,
            source,
        );
        tracing::debug!(source, chunks = chunks.len(), "Split document");

        let texts: Vec<String> = chunks.iter().map(|chunk| chunk.text.clone()).collect();
        let vectors = if texts.is_empty() {
            Vec::new()
        } else {
            self.embedder.generate_embeddings(texts).await?
        };

        debug_assert_eq!(vectors.len(), chunks.len());

        Ok(VectorizedDocument { vectors, chunks })
    }

    /// Vectorize a document and upsert its records into a namespace.
    ///
    /// Record identifiers are the chunks' zero-based positions, stringified,
    /// so re-ingesting the same URI overwrites the previous records in that
    /// namespace instead of accumulating new ones. All records go out in one
    /// batched write.
    pub async fn ingest_document(
        &self,
        uri: &str,
        namespace: &str,
    ) -> Result<IngestOutcome, IngestError> {
        tracing::info!(uri, namespace, "Ingesting document");
        let VectorizedDocument { vectors, chunks } = self.vectorize(uri).await?;
        let records = build_records(vectors, chunks);
        let chunk_count = records.len();

        self.index.upsert(namespace, records).await?;

        self.metrics.record_ingest(chunk_count as u64);
        tracing::info!(uri, namespace, chunks = chunk_count, "Document ingested");
        Ok(IngestOutcome { chunk_count })
    }

    /// Answer a question from content indexed under a namespace.
    ///
    /// Embeds the question, retrieves the closest records, joins their stored
    /// text into a context block, and runs the answer chain over it.
    pub async fn answer_question(
        &self,
        question: &str,
        namespace: &str,
    ) -> Result<String, AnswerError> {
        let mut vectors = self
            .embedder
            .generate_embeddings(vec![question.to_string()])
            .await?;
        let vector = vectors.pop().ok_or(AnswerError::EmptyEmbedding)?;

        let matches = self.index.query(namespace, vector, ANSWER_TOP_K).await?;
        let context = matches
            .iter()
            .filter_map(|entry| entry.metadata.as_ref()?.get("text")?.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        tracing::debug!(
            namespace,
            matches = matches.len(),
            context_bytes = context.len(),
            "Retrieved answer context"
        );

        let answer = self.chain.run(&context, question).await?;
        self.metrics.record_question();
        Ok(answer)
    }

    /// Return the current pipeline metrics snapshot.
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }
}

#[async_trait]
impl PipelineApi for PipelineService {
    async fn upload_document(&self, bytes: Vec<u8>, key: &str) -> Result<String, StorageError> {
        PipelineService::upload_document(self, bytes, key).await
    }

    async fn ingest_document(
        &self,
        uri: &str,
        namespace: &str,
    ) -> Result<IngestOutcome, IngestError> {
        PipelineService::ingest_document(self, uri, namespace).await
    }

    async fn answer_question(
        &self,
        question: &str,
        namespace: &str,
    ) -> Result<String, AnswerError> {
        PipelineService::answer_question(self, question, namespace).await
    }

    fn metrics_snapshot(&self) -> MetricsSnapshot {
        PipelineService::metrics_snapshot(self)
    }
}

/// Pair vectors with chunks into index records.
///
/// The i-th record takes the i-th vector, the stringified position as its
/// identifier, and the chunk's metadata fields plus the raw text under
/// `text`.
pub(crate) fn build_records(
    vectors: Vec<Vec<f32>>,
    chunks: Vec<DocumentChunk>,
) -> Vec<VectorRecord> {
    vectors
        .into_iter()
        .zip(chunks)
        .enumerate()
        .map(|(position, (values, chunk))| {
            let mut metadata = Map::new();
            metadata.insert("source".into(), Value::String(chunk.metadata.source));
            metadata.insert("page".into(), Value::from(chunk.metadata.page));
            metadata.insert(
                "start_index".into(),
                Value::from(chunk.metadata.start_index),
            );
            metadata.insert("text".into(), Value::String(chunk.text));

            VectorRecord {
                id: position.to_string(),
                values,
                metadata,
            }
        })
        .collect()
}
