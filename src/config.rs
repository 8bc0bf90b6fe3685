use std::env;
use thiserror::Error;

/// Default OpenAI API base URL.
pub const DEFAULT_OPENAI_BASE_URL: &str = "https://api.openai.com/v1";
/// Default embedding model identifier.
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
/// Default chat completion model identifier.
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4o-mini";
/// Default target chunk size in characters.
pub const DEFAULT_CHUNK_SIZE: usize = 1000;
/// Default overlap between adjacent chunks in characters.
pub const DEFAULT_CHUNK_OVERLAP: usize = 100;

/// Errors encountered while loading configuration from environment variables.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Required environment variable was not provided.
    #[error("Missing environment variable: {0}")]
    MissingVariable(String),
    /// Environment variable contained a value that could not be parsed.
    #[error("Invalid value for environment variable: {0}")]
    InvalidValue(String),
}

/// Credentials and addressing for the S3 bucket that stores uploaded documents.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// AWS access key id used to sign requests.
    pub access_key: String,
    /// AWS secret access key used to sign requests.
    pub secret_key: String,
    /// AWS region hosting the bucket.
    pub region: String,
    /// Name of the destination bucket.
    pub bucket: String,
    /// Optional endpoint override (LocalStack, MinIO, test servers).
    pub endpoint: Option<String>,
}

/// Connection settings for the Pinecone index.
#[derive(Debug, Clone)]
pub struct IndexConfig {
    /// API key sent with every index request.
    pub api_key: String,
    /// Index host URL assigned by Pinecone.
    pub host: String,
}

/// Settings shared by the OpenAI embedding and chat clients.
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    /// API key for bearer authentication.
    pub api_key: String,
    /// Base URL of the OpenAI-compatible API.
    pub base_url: String,
    /// Embedding model identifier.
    pub embedding_model: String,
    /// Chat completion model identifier.
    pub chat_model: String,
}

/// Character budget and overlap applied by the text splitter.
#[derive(Debug, Clone, Copy)]
pub struct SplitterConfig {
    /// Target chunk size in characters.
    pub chunk_size: usize,
    /// Overlap between adjacent chunks in characters.
    pub chunk_overlap: usize,
}

impl Default for SplitterConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            chunk_overlap: DEFAULT_CHUNK_OVERLAP,
        }
    }
}

/// Runtime configuration for the docrag server.
#[derive(Debug, Clone)]
pub struct Config {
    /// Object storage settings.
    pub storage: StorageConfig,
    /// Vector index settings.
    pub index: IndexConfig,
    /// OpenAI client settings.
    pub openai: OpenAiConfig,
    /// Text splitter settings.
    pub splitter: SplitterConfig,
    /// Optional override for the HTTP server port.
    pub server_port: Option<u16>,
}

impl Config {
    /// Load configuration from environment variables, performing validation along the way.
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            storage: StorageConfig {
                access_key: load_env("AWS_ACCESS_KEY_ID")?,
                secret_key: load_env("AWS_SECRET_ACCESS_KEY")?,
                region: load_env("AWS_REGION")?,
                bucket: load_env("AWS_BUCKET_NAME")?,
                endpoint: load_env_optional("AWS_ENDPOINT_URL"),
            },
            index: IndexConfig {
                api_key: load_env("PINECONE_API_KEY")?,
                host: load_env("PINECONE_INDEX_HOST")?,
            },
            openai: OpenAiConfig {
                api_key: load_env("OPENAI_API_KEY")?,
                base_url: load_env_optional("OPENAI_API_BASE")
                    .unwrap_or_else(|| DEFAULT_OPENAI_BASE_URL.to_string()),
                embedding_model: load_env_optional("EMBEDDING_MODEL")
                    .unwrap_or_else(|| DEFAULT_EMBEDDING_MODEL.to_string()),
                chat_model: load_env_optional("CHAT_MODEL")
                    .unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            },
            splitter: SplitterConfig {
                chunk_size: load_env_parsed("TEXT_SPLITTER_CHUNK_SIZE")?
                    .unwrap_or(DEFAULT_CHUNK_SIZE),
                chunk_overlap: load_env_parsed("TEXT_SPLITTER_CHUNK_OVERLAP")?
                    .unwrap_or(DEFAULT_CHUNK_OVERLAP),
            },
            server_port: load_env_parsed("SERVER_PORT")?,
        })
    }
}

fn load_env(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError::MissingVariable(key.to_string()))
}

fn load_env_optional(key: &str) -> Option<String> {
    env::var(key).ok().filter(|value| !value.trim().is_empty())
}

fn load_env_parsed<T: std::str::FromStr>(key: &str) -> Result<Option<T>, ConfigError> {
    load_env_optional(key)
        .map(|value| {
            value
                .parse()
                .map_err(|_| ConfigError::InvalidValue(key.to_string()))
        })
        .transpose()
}
