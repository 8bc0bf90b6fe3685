//! End-to-end pipeline tests against mocked external services.
//!
//! Every collaborator (S3, OpenAI, Pinecone) is served by `httpmock`; the PDF
//! fixture is assembled at runtime so object offsets stay correct.

use async_trait::async_trait;
use docrag::chain::{AnswerChain, NO_ANSWER_PHRASE};
use docrag::config::{IndexConfig, OpenAiConfig, SplitterConfig, StorageConfig};
use docrag::document::PdfLoader;
use docrag::embedding::{EmbeddingClient, EmbeddingError, OpenAiEmbeddingClient};
use docrag::index::PineconeClient;
use docrag::pipeline::{IngestError, PipelineService};
use docrag::storage::S3Client;
use httpmock::{Method::GET, Method::POST, MockServer};
use serde_json::json;
use std::io::Write;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Assemble a one-page PDF with the given text, computing xref offsets at
/// runtime so the fixture is always well-formed.
fn minimal_pdf(text: Option<&str>) -> Vec<u8> {
    let content = match text {
        Some(text) => format!("BT /F1 12 Tf 72 720 Td ({text}) Tj ET"),
        None => String::new(),
    };
    let objects = [
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        "<< /Type /Pages /Kids [3 0 R] /Count 1 >>".to_string(),
        "<< /Type /Page /Parent 2 0 R /MediaBox [0 0 612 792] \
         /Resources << /Font << /F1 4 0 R >> >> /Contents 5 0 R >>"
            .to_string(),
        "<< /Type /Font /Subtype /Type1 /BaseFont /Helvetica >>".to_string(),
        format!(
            "<< /Length {} >>\nstream\n{content}\nendstream",
            content.len()
        ),
    ];

    let mut pdf: Vec<u8> = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (index, body) in objects.iter().enumerate() {
        offsets.push(pdf.len());
        pdf.extend_from_slice(format!("{} 0 obj\n{body}\nendobj\n", index + 1).as_bytes());
    }

    let xref_offset = pdf.len();
    pdf.extend_from_slice(format!("xref\n0 {}\n", objects.len() + 1).as_bytes());
    pdf.extend_from_slice(b"0000000000 65535 f \n");
    for offset in offsets {
        pdf.extend_from_slice(format!("{offset:010} 00000 n \n").as_bytes());
    }
    pdf.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{xref_offset}\n%%EOF\n",
            objects.len() + 1
        )
        .as_bytes(),
    );
    pdf
}

struct CountingEmbedder {
    calls: Arc<AtomicUsize>,
}

#[async_trait]
impl EmbeddingClient for CountingEmbedder {
    async fn generate_embeddings(
        &self,
        texts: Vec<String>,
    ) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(texts.iter().map(|_| vec![0.5, 0.25]).collect())
    }
}

fn openai_config(server: &MockServer) -> OpenAiConfig {
    OpenAiConfig {
        api_key: "sk-test".into(),
        base_url: server.base_url(),
        embedding_model: "text-embedding-3-small".into(),
        chat_model: "gpt-4o-mini".into(),
    }
}

fn build_service(
    server: &MockServer,
    embedder: Box<dyn EmbeddingClient + Send + Sync>,
) -> PipelineService {
    let storage = S3Client::new(&StorageConfig {
        access_key: "AKIDEXAMPLE".into(),
        secret_key: "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY".into(),
        region: "us-east-1".into(),
        bucket: "mybucket".into(),
        endpoint: Some(server.base_url()),
    })
    .expect("storage client");
    let index = PineconeClient::new(&IndexConfig {
        api_key: "pc-test".into(),
        host: server.base_url(),
    })
    .expect("index client");
    let chain = AnswerChain::with_openai(&openai_config(server));

    PipelineService::new(
        storage,
        PdfLoader::new(),
        embedder,
        index,
        chain,
        SplitterConfig::default(),
    )
}

fn build_service_with_openai_embedder(server: &MockServer) -> PipelineService {
    build_service(
        server,
        Box::new(OpenAiEmbeddingClient::new(&openai_config(server))),
    )
}

#[tokio::test]
async fn upload_returns_deterministic_public_url() {
    let server = MockServer::start_async().await;
    let put = server
        .mock_async(|when, then| {
            when.method(httpmock::Method::PUT).path("/doc.pdf");
            then.status(200);
        })
        .await;

    let service = build_service_with_openai_embedder(&server);
    let url = service
        .upload_document(minimal_pdf(Some("Hello world")), "doc.pdf")
        .await
        .expect("upload");

    put.assert();
    assert_eq!(url, "https://mybucket.s3.us-east-1.amazonaws.com/doc.pdf");
}

#[tokio::test]
async fn ingest_embeds_and_upserts_sequential_records() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/doc.pdf");
            then.status(200)
                .header("content-type", "application/pdf")
                .body(minimal_pdf(Some("Hello world")));
        })
        .await;
    let embeddings = server
        .mock_async(|when, then| {
            when.method(POST).path("/embeddings");
            then.status(200).json_body(json!({
                "data": [ { "index": 0, "embedding": [0.5, 0.25] } ]
            }));
        })
        .await;
    let upsert = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/vectors/upsert")
                .json_body_partial(
                    json!({
                        "namespace": "ns-1",
                        "vectors": [ { "id": "0" } ]
                    })
                    .to_string(),
                );
            then.status(200).json_body(json!({ "upsertedCount": 1 }));
        })
        .await;

    let service = build_service_with_openai_embedder(&server);
    let outcome = service
        .ingest_document(&format!("{}/doc.pdf", server.base_url()), "ns-1")
        .await
        .expect("ingest");

    assert_eq!(outcome.chunk_count, 1);
    embeddings.assert();
    upsert.assert();
}

#[tokio::test]
async fn reingesting_reuses_the_same_record_ids() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/doc.pdf");
            then.status(200).body(minimal_pdf(Some("Hello world")));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/embeddings");
            then.status(200).json_body(json!({
                "data": [ { "index": 0, "embedding": [0.5, 0.25] } ]
            }));
        })
        .await;
    let upsert = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/vectors/upsert")
                .json_body_partial(json!({ "vectors": [ { "id": "0" } ] }).to_string());
            then.status(200).json_body(json!({ "upsertedCount": 1 }));
        })
        .await;

    let service = build_service_with_openai_embedder(&server);
    let uri = format!("{}/doc.pdf", server.base_url());
    service.ingest_document(&uri, "ns-1").await.expect("first");
    service.ingest_document(&uri, "ns-1").await.expect("second");

    // Both writes targeted id "0"; nothing accumulated under fresh ids.
    upsert.assert_hits(2);
}

#[tokio::test]
async fn empty_document_ingests_no_records() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/empty.pdf");
            then.status(200).body(minimal_pdf(None));
        })
        .await;
    let embeddings = server
        .mock_async(|when, then| {
            when.method(POST).path("/embeddings");
            then.status(200).json_body(json!({ "data": [] }));
        })
        .await;
    let upsert = server
        .mock_async(|when, then| {
            when.method(POST).path("/vectors/upsert");
            then.status(200);
        })
        .await;

    let service = build_service_with_openai_embedder(&server);
    let outcome = service
        .ingest_document(&format!("{}/empty.pdf", server.base_url()), "ns-1")
        .await
        .expect("empty ingest");

    assert_eq!(outcome.chunk_count, 0);
    embeddings.assert_hits(0);
    upsert.assert_hits(0);
}

#[tokio::test]
async fn corrupt_document_fails_before_any_embedding_call() {
    let server = MockServer::start_async().await;
    let upsert = server
        .mock_async(|when, then| {
            when.method(POST).path("/vectors/upsert");
            then.status(200);
        })
        .await;

    let mut file = tempfile::NamedTempFile::new().expect("temp file");
    file.write_all(b"definitely not a pdf").expect("write");

    let calls = Arc::new(AtomicUsize::new(0));
    let service = build_service(
        &server,
        Box::new(CountingEmbedder {
            calls: calls.clone(),
        }),
    );

    let error = service
        .ingest_document(file.path().to_str().expect("utf-8 path"), "ns-1")
        .await
        .expect_err("corrupt document");

    assert!(matches!(error, IngestError::Load(_)));
    assert_eq!(calls.load(Ordering::SeqCst), 0);
    upsert.assert_hits(0);
}

#[tokio::test]
async fn vectorize_keeps_vectors_aligned_with_chunks() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/doc.pdf");
            then.status(200).body(minimal_pdf(Some("Hello world")));
        })
        .await;

    let calls = Arc::new(AtomicUsize::new(0));
    let service = build_service(
        &server,
        Box::new(CountingEmbedder {
            calls: calls.clone(),
        }),
    );

    let result = service
        .vectorize(&format!("{}/doc.pdf", server.base_url()))
        .await
        .expect("vectorize");

    assert_eq!(result.vectors.len(), result.chunks.len());
    assert!(!result.chunks.is_empty());
    assert!(result.chunks[0].text.contains("Hello"));
    assert_eq!(result.chunks[0].metadata.page, 0);
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn question_flow_retrieves_context_and_answers() {
    let server = MockServer::start_async().await;
    let embeddings = server
        .mock_async(|when, then| {
            when.method(POST).path("/embeddings");
            then.status(200).json_body(json!({
                "data": [ { "index": 0, "embedding": [0.5, 0.25] } ]
            }));
        })
        .await;
    let query = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/query")
                .json_body_partial(json!({ "namespace": "ns-1", "topK": 4 }).to_string());
            then.status(200).json_body(json!({
                "matches": [
                    {
                        "id": "0",
                        "score": 0.75,
                        "metadata": { "text": "France's capital is Paris.", "page": 0 }
                    }
                ]
            }));
        })
        .await;
    let chat = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/chat/completions")
                .body_contains("France's capital is Paris.");
            then.status(200).json_body(json!({
                "choices": [
                    { "message": { "role": "assistant", "content": "Paris." } }
                ]
            }));
        })
        .await;

    let service = build_service_with_openai_embedder(&server);
    let answer = service
        .answer_question("What is the capital of France?", "ns-1")
        .await
        .expect("answer");

    assert_eq!(answer, "Paris.");
    embeddings.assert();
    query.assert();
    chat.assert();
}

#[tokio::test]
async fn chain_wiring_passes_refusal_phrase_through_verbatim() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/embeddings");
            then.status(200).json_body(json!({
                "data": [ { "index": 0, "embedding": [0.5, 0.25] } ]
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/query");
            then.status(200).json_body(json!({
                "matches": [
                    {
                        "id": "0",
                        "score": 0.75,
                        "metadata": { "text": "Unrelated content." }
                    }
                ]
            }));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/chat/completions");
            then.status(200).json_body(json!({
                "choices": [
                    { "message": { "role": "assistant", "content": NO_ANSWER_PHRASE } }
                ]
            }));
        })
        .await;

    let service = build_service_with_openai_embedder(&server);
    let answer = service
        .answer_question("What is the airspeed of an unladen swallow?", "ns-1")
        .await
        .expect("answer");

    assert_eq!(answer, NO_ANSWER_PHRASE);
}
