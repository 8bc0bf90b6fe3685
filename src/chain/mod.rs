//! Prompt-templated question answering over a completion model.
//!
//! The chain binds a fixed instruction template to a completion client. It is
//! stateless and reusable: build it once, invoke it per query with a context
//! and a question. Retrieval of the context is the caller's responsibility.

use crate::config::OpenAiConfig;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Literal phrase the model is instructed to return when the context does not
/// contain the answer.
pub const NO_ANSWER_PHRASE: &str = "answer is not available in the context";

/// Instruction template with `{context}` and `{question}` slots.
///
/// Directs the model to answer only from the supplied context and to return
/// the fixed refusal phrase instead of fabricating an answer.
pub const ANSWER_PROMPT: &str = "\
Answer the question as detailed as possible from the provided context and make \
sure to provide all the details. If the answer is not in the provided context \
just say, \"answer is not available in the context\"; do not provide a wrong \
answer.

Context:
{context}

Question:
{question}

Answer:
";

/// Errors raised by completion providers.
#[derive(Debug, Error)]
pub enum CompletionError {
    /// HTTP layer failed before receiving a response.
    #[error("Completion request failed: {0}")]
    Http(#[from] reqwest::Error),
    /// Provider responded with a non-success status.
    #[error("Unexpected completion response ({status}): {body}")]
    UnexpectedStatus {
        /// HTTP status returned by the provider.
        status: StatusCode,
        /// Body payload associated with the failing response.
        body: String,
    },
    /// Provider returned no generated text.
    #[error("Completion provider returned no choices")]
    EmptyResponse,
}

/// Interface implemented by completion backends.
#[async_trait]
pub trait CompletionClient {
    /// Generate answer text for a rendered prompt.
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError>;
}

/// Completion client backed by the OpenAI chat completions API.
///
/// Uses the provider's default sampling settings; a single user message
/// carries the rendered prompt.
pub struct OpenAiChatClient {
    pub(crate) client: Client,
    pub(crate) endpoint: String,
    pub(crate) api_key: String,
    pub(crate) model: String,
}

impl OpenAiChatClient {
    /// Construct a client from OpenAI configuration.
    pub fn new(config: &OpenAiConfig) -> Self {
        Self {
            client: Client::new(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: config.api_key.clone(),
            model: config.chat_model.clone(),
        }
    }
}

#[async_trait]
impl CompletionClient for OpenAiChatClient {
    async fn complete(&self, prompt: &str) -> Result<String, CompletionError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let error = CompletionError::UnexpectedStatus { status, body };
            tracing::error!(error = %error, "Completion request rejected");
            return Err(error);
        }

        let payload: ChatResponse = response.json().await?;
        payload
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or(CompletionError::EmptyResponse)
    }
}

/// Reusable composition of the answer template and a completion client.
pub struct AnswerChain {
    completion: Box<dyn CompletionClient + Send + Sync>,
}

impl AnswerChain {
    /// Build a chain around an arbitrary completion backend.
    pub fn new(completion: Box<dyn CompletionClient + Send + Sync>) -> Self {
        Self { completion }
    }

    /// Build a chain around an OpenAI chat client with default settings.
    pub fn with_openai(config: &OpenAiConfig) -> Self {
        Self::new(Box::new(OpenAiChatClient::new(config)))
    }

    /// Render the instruction template for a context and question pair.
    pub fn render_prompt(context: &str, question: &str) -> String {
        ANSWER_PROMPT
            .replace("{context}", context)
            .replace("{question}", question)
    }

    /// Answer a question from the supplied context.
    pub async fn run(&self, context: &str, question: &str) -> Result<String, CompletionError> {
        let prompt = Self::render_prompt(context, question);
        self.completion.complete(&prompt).await
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: AssistantMessage,
}

#[derive(Deserialize)]
struct AssistantMessage {
    content: String,
}
