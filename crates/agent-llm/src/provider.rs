//! LLM provider trait definitions

use async_trait::async_trait;
use crate::{CompletionRequest, CompletionResponse, Result};

/// Trait for text-completion services
///
/// Implementations wrap a concrete chat-completion API. Pipelines only see
/// this trait, so tests substitute scripted providers.
#[async_trait]
pub trait LLMProvider: Send + Sync {
    /// Generate a completion from the LLM
    ///
    /// # Arguments
    ///
    /// * `request` - The completion request with messages and parameters
    ///
    /// # Returns
    ///
    /// The completion response with the assistant's message and metadata
    async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse>;

    /// Get the provider name (e.g., "openai")
    fn name(&self) -> &str;
}

/// Trait for embedding services
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed each input text, returning one vector per input in input order
    async fn embed(&self, inputs: &[String]) -> Result<Vec<Vec<f32>>>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Message, StopReason, TokenUsage};

    struct EchoProvider;

    #[async_trait]
    impl LLMProvider for EchoProvider {
        async fn complete(&self, request: CompletionRequest) -> Result<CompletionResponse> {
            let last = request
                .messages
                .last()
                .map(|m| m.content.clone())
                .unwrap_or_default();
            Ok(CompletionResponse {
                message: Message::assistant(last),
                stop_reason: StopReason::EndTurn,
                usage: TokenUsage::default(),
            })
        }

        fn name(&self) -> &str {
            "echo"
        }
    }

    #[test]
    fn test_provider_as_trait_object() {
        let provider: Box<dyn LLMProvider> = Box::new(EchoProvider);
        let request = CompletionRequest::builder("any")
            .add_message(Message::user("ping"))
            .build();

        let response = tokio_test::block_on(provider.complete(request)).unwrap();
        assert_eq!(response.text(), "ping");
        assert_eq!(provider.name(), "echo");
    }
}
