use docrag::{
    api,
    chain::AnswerChain,
    config::Config,
    document::PdfLoader,
    embedding::OpenAiEmbeddingClient,
    index::PineconeClient,
    logging,
    pipeline::PipelineService,
    storage::S3Client,
};
use std::sync::Arc;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();
    logging::init_tracing();

    let config = Config::from_env().expect("Failed to load config from environment");
    let storage = S3Client::new(&config.storage).expect("Failed to build S3 client");
    let index = PineconeClient::new(&config.index).expect("Failed to build Pinecone client");
    let embedder = Box::new(OpenAiEmbeddingClient::new(&config.openai));
    let chain = AnswerChain::with_openai(&config.openai);

    let service = PipelineService::new(
        storage,
        PdfLoader::new(),
        embedder,
        index,
        chain,
        config.splitter,
    );
    let app = api::create_router(Arc::new(service));

    let (listener, port) = bind_listener(config.server_port)
        .await
        .expect("Failed to bind listener");
    tracing::info!("Listening on http://0.0.0.0:{}", port);
    axum::serve(listener, app).await.unwrap();
}

async fn bind_listener(configured_port: Option<u16>) -> Result<(TcpListener, u16), std::io::Error> {
    use std::net::Ipv4Addr;

    if let Some(port) = configured_port {
        return TcpListener::bind((Ipv4Addr::UNSPECIFIED, port))
            .await
            .map(|listener| (listener, port));
    }

    const PORT_RANGE: std::ops::RangeInclusive<u16> = 8300..=8399;
    for port in PORT_RANGE {
        match TcpListener::bind((Ipv4Addr::UNSPECIFIED, port)).await {
            Ok(listener) => {
                tracing::debug!(port, "Bound server port");
                return Ok((listener, port));
            }
            Err(err) if err.kind() == std::io::ErrorKind::AddrInUse => {
                tracing::debug!(port, "Port already in use; trying next");
                continue;
            }
            Err(err) => return Err(err),
        }
    }

    Err(std::io::Error::new(
        std::io::ErrorKind::AddrNotAvailable,
        "No available port found in range 8300-8399",
    ))
}
