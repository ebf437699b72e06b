//! Test doubles for the completion and embedding services

use agent_llm::{
    CompletionRequest, CompletionResponse, EmbeddingProvider, LLMError, LLMProvider, Message, StopReason,
    TokenUsage,
};
use async_trait::async_trait;
use mockall::mock;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

mock! {
    pub Embedder {}

    #[async_trait]
    impl EmbeddingProvider for Embedder {
        async fn embed(&self, inputs: &[String]) -> agent_llm::Result<Vec<Vec<f32>>>;
    }
}

/// Provider replaying canned replies and recording the prompts it received
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(str::to_string).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> agent_llm::Result<CompletionResponse> {
        if let Some(message) = request.messages.last() {
            self.prompts.lock().unwrap().push(message.content.clone());
        }
        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LLMError::UnexpectedResponse("no scripted reply left".to_string()))?;
        Ok(CompletionResponse {
            message: Message::assistant(reply),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}
