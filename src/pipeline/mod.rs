//! Pipeline orchestration: upload, vectorize, upsert, and answer.

mod service;
pub mod types;

pub use service::{PipelineApi, PipelineService};
pub use types::{AnswerError, IngestError, IngestOutcome, VectorizedDocument};
