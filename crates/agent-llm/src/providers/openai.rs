//! OpenAI-compatible provider implementation
//!
//! Implements [`LLMProvider`] over `/chat/completions` and
//! [`EmbeddingProvider`] over `/embeddings`. Any server speaking the same
//! protocol (vLLM, llama.cpp, LM Studio, Azure deployments) works by changing
//! the base URL.
//!
//! # Example
//!
//! ```no_run
//! use agent_llm::{CompletionRequest, LLMProvider, Message};
//! use agent_llm::providers::{OpenAIConfig, OpenAIProvider};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = OpenAIConfig::new("not-needed").with_api_base("http://localhost:8000/v1");
//!     let provider = OpenAIProvider::with_config(config)?;
//!
//!     let request = CompletionRequest::builder("local-model")
//!         .add_message(Message::user("Hello!"))
//!         .max_tokens(100)
//!         .build();
//!
//!     let response = provider.complete(request).await?;
//!     println!("{}", response.text());
//!     Ok(())
//! }
//! ```

use crate::{
    CompletionRequest, CompletionResponse, EmbeddingProvider, LLMError, LLMProvider, Message,
    Result, Role, StopReason, TokenUsage,
};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

const DEFAULT_OPENAI_API_BASE: &str = "https://api.openai.com/v1";
const DEFAULT_TIMEOUT_SECS: u64 = 120;
const DEFAULT_EMBEDDING_BATCH: usize = 16;

/// Configuration for OpenAI provider
#[derive(Debug, Clone)]
pub struct OpenAIConfig {
    /// API key for authentication
    pub api_key: String,

    /// Base URL for the API (default: "https://api.openai.com/v1")
    pub api_base: String,

    /// Request timeout in seconds (default: 120)
    pub timeout_secs: u64,
}

impl OpenAIConfig {
    /// Create a new config with the given API key and default settings
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    /// Set custom API base URL
    pub fn with_api_base(mut self, api_base: impl Into<String>) -> Self {
        self.api_base = api_base.into();
        self
    }

    /// Set request timeout in seconds
    pub fn with_timeout(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{path}", self.api_base.trim_end_matches('/'))
    }

    fn build_client(&self) -> Result<Client> {
        Ok(Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .build()?)
    }
}

impl Default for OpenAIConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            api_base: DEFAULT_OPENAI_API_BASE.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        }
    }
}

/// Chat-completion provider
pub struct OpenAIProvider {
    client: Client,
    config: OpenAIConfig,
}

impl OpenAIProvider {
    /// Create a provider with custom configuration
    pub fn with_config(config: OpenAIConfig) -> Result<Self> {
        let client = config.build_client()?;
        Ok(Self { client, config })
    }

    /// Create a provider with API key and default settings
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        Self::with_config(OpenAIConfig::new(api_key))
    }

    /// Get the current configuration
    pub fn config(&self) -> &OpenAIConfig {
        &self.config
    }
}

#[async_trait]
impl LLMProvider for OpenAIProvider {
    #[instrument(skip(self, request), fields(model = %request.model, api_base = %self.config.api_base))]
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
        let body = ChatRequest {
            model: request.model.clone(),
            messages: build_chat_messages(request.system, request.messages),
            max_tokens: request.max_tokens,
            temperature: request.temperature,
            stop: request.stop_sequences,
            response_format: request.json_mode.then(|| ResponseFormat {
                format_type: "json_object".to_string(),
            }),
        };

        let response = self
            .client
            .post(self.config.endpoint("chat/completions"))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(status_error(status, error_text, request.model));
        }

        let chat: ChatResponse = response
            .json()
            .await
            .map_err(|e| LLMError::UnexpectedResponse(format!("Failed to parse response: {e}")))?;

        let choice = chat
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| LLMError::UnexpectedResponse("No choices in response".to_string()))?;

        let usage = chat.usage.map_or_else(TokenUsage::default, |u| TokenUsage {
            input_tokens: u.prompt_tokens,
            output_tokens: u.completion_tokens,
        });

        debug!(
            finish_reason = choice.finish_reason.as_deref().unwrap_or("none"),
            input_tokens = usage.input_tokens,
            output_tokens = usage.output_tokens,
            "Received completion"
        );

        Ok(CompletionResponse {
            message: Message::assistant(choice.message.content.unwrap_or_default()),
            stop_reason: map_stop_reason(choice.finish_reason.as_deref()),
            usage,
        })
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}

/// Embedding client for the `/embeddings` endpoint
///
/// Inputs are sent in batches of `batch_size`; vectors come back in input
/// order regardless of how the service orders its `data` array.
pub struct OpenAIEmbeddings {
    client: Client,
    config: OpenAIConfig,
    model: String,
    batch_size: usize,
}

impl OpenAIEmbeddings {
    /// Create an embedding client for `model`
    pub fn with_config(config: OpenAIConfig, model: impl Into<String>) -> Result<Self> {
        let client = config.build_client()?;
        Ok(Self {
            client,
            config,
            model: model.into(),
            batch_size: DEFAULT_EMBEDDING_BATCH,
        })
    }

    /// Set how many inputs go into one request
    pub fn with_batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size.max(1);
        self
    }

    /// Inputs per request
    pub fn batch_size(&self) -> usize {
        self.batch_size
    }

    async fn embed_batch(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let body = EmbeddingRequest {
            model: &self.model,
            input: inputs,
        };

        let response = self
            .client
            .post(self.config.endpoint("embeddings"))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await?;
            return Err(status_error(status, error_text, self.model.clone()));
        }

        let parsed: EmbeddingResponse = response.json().await.map_err(|e| {
            LLMError::UnexpectedResponse(format!("Failed to parse embeddings: {e}"))
        })?;

        order_embeddings(parsed.data, inputs.len())
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddings {
    #[instrument(skip(self, inputs), fields(model = %self.model, count = inputs.len()))]
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>> {
        let mut vectors = Vec::with_capacity(inputs.len());
        for batch in inputs.chunks(self.batch_size) {
            vectors.extend(self.embed_batch(batch).await?);
        }
        debug!("Embedded {} inputs", vectors.len());
        Ok(vectors)
    }
}

// ============================================================================
// Wire types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    format_type: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
    usage: Option<ChatUsage>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ChatUsage {
    prompt_tokens: usize,
    completion_tokens: usize,
}

#[derive(Debug, Serialize)]
struct EmbeddingRequest<'a> {
    model: &'a str,
    input: &'a [String],
}

#[derive(Debug, Deserialize)]
struct EmbeddingResponse {
    data: Vec<EmbeddingData>,
}

#[derive(Debug, Deserialize)]
struct EmbeddingData {
    index: usize,
    embedding: Vec<f32>,
}

// ============================================================================
// Conversion functions
// ============================================================================

/// System prompt goes first in the messages array
fn build_chat_messages(system: Option<String>, messages: Vec<Message>) -> Vec<ChatMessage> {
    system
        .map(|content| ChatMessage {
            role: Role::System.as_str(),
            content,
        })
        .into_iter()
        .chain(messages.into_iter().map(|m| ChatMessage {
            role: m.role.as_str(),
            content: m.content,
        }))
        .collect()
}

fn map_stop_reason(reason: Option<&str>) -> StopReason {
    match reason {
        Some("length") => StopReason::MaxTokens,
        Some("stop") | None => StopReason::EndTurn,
        Some(other) => {
            debug!("Unmapped finish reason: {}", other);
            StopReason::EndTurn
        }
    }
}

fn status_error(status: StatusCode, error_text: String, model: String) -> LLMError {
    match status.as_u16() {
        401 => LLMError::AuthenticationFailed,
        429 => LLMError::RateLimitExceeded(error_text),
        400 => LLMError::InvalidRequest(error_text),
        404 => LLMError::ModelNotFound(model),
        _ => LLMError::RequestFailed(format!("HTTP {status}: {error_text}")),
    }
}

fn order_embeddings(mut data: Vec<EmbeddingData>, expected: usize) -> Result<Vec<Vec<f32>>> {
    if data.len() != expected {
        return Err(LLMError::UnexpectedResponse(format!(
            "Expected {expected} embeddings, received {}",
            data.len()
        )));
    }
    data.sort_by_key(|d| d.index);
    Ok(data.into_iter().map(|d| d.embedding).collect())
}

// ============================================================================
// Tests
// ============================================================================
