use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters describing pipeline activity.
#[derive(Default)]
pub struct PipelineMetrics {
    documents_uploaded: AtomicU64,
    documents_ingested: AtomicU64,
    chunks_indexed: AtomicU64,
    questions_answered: AtomicU64,
}

impl PipelineMetrics {
    /// Create an empty metrics accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a document stored in object storage.
    pub fn record_upload(&self) {
        self.documents_uploaded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record an ingested document and the number of chunks upserted for it.
    pub fn record_ingest(&self, chunk_count: u64) {
        self.documents_ingested.fetch_add(1, Ordering::Relaxed);
        self.chunks_indexed
            .fetch_add(chunk_count, Ordering::Relaxed);
    }

    /// Record an answered question.
    pub fn record_question(&self) {
        self.questions_answered.fetch_add(1, Ordering::Relaxed);
    }

    /// Return a snapshot of the current counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            documents_uploaded: self.documents_uploaded.load(Ordering::Relaxed),
            documents_ingested: self.documents_ingested.load(Ordering::Relaxed),
            chunks_indexed: self.chunks_indexed.load(Ordering::Relaxed),
            questions_answered: self.questions_answered.load(Ordering::Relaxed),
        }
    }
}

/// Immutable view of pipeline counters used for reporting.
#[derive(Debug, Clone, Copy, serde::Serialize)]
pub struct MetricsSnapshot {
    /// Number of documents uploaded to object storage since startup.
    pub documents_uploaded: u64,
    /// Number of documents ingested into the vector index since startup.
    pub documents_ingested: u64,
    /// Total chunk count upserted across all ingested documents.
    pub chunks_indexed: u64,
    /// Number of questions answered since startup.
    pub questions_answered: u64,
}
