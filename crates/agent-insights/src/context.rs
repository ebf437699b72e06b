//! Shared state handed to every pipeline operation

use crate::config::InsightsConfig;
use crate::error::Result;
use crate::extract::MarketDataSource;
use crate::prompts::register_prompts;
use crate::store::StockDatabase;
use agent_llm::{CompletionRequest, LLMProvider, Message, StructuredOutput, parse_structured};
use agent_prompt::PromptRegistry;
use serde_json::Value;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, instrument};

/// Completion service, market data source, prompts and store for one session
///
/// Operations receive the context explicitly instead of reaching for
/// process-wide state, so tests can build one per case.
pub struct InsightsContext {
    provider: Arc<dyn LLMProvider>,
    market_data: Arc<dyn MarketDataSource>,
    prompts: PromptRegistry,
    database: StockDatabase,
    config: InsightsConfig,
}

impl InsightsContext {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        market_data: Arc<dyn MarketDataSource>,
        config: InsightsConfig,
    ) -> Result<Self> {
        config.validate()?;
        let prompts = PromptRegistry::new();
        register_prompts(&prompts)?;

        Ok(Self {
            provider,
            market_data,
            prompts,
            database: StockDatabase::new(config.database_path.clone()),
            config,
        })
    }

    pub fn config(&self) -> &InsightsConfig {
        &self.config
    }

    pub fn database(&self) -> &StockDatabase {
        &self.database
    }

    pub fn market_data(&self) -> &dyn MarketDataSource {
        self.market_data.as_ref()
    }

    pub fn prompts(&self) -> &PromptRegistry {
        &self.prompts
    }

    /// Render a registered prompt
    pub fn render(&self, template: &str, vars: &Value) -> Result<String> {
        Ok(self.prompts.render(template, vars)?)
    }

    fn request(&self, prompt: String, json_mode: bool) -> CompletionRequest {
        CompletionRequest::builder(self.config.model.clone())
            .add_message(Message::user(prompt))
            .max_tokens(self.config.max_tokens)
            .temperature(self.config.temperature)
            .json_mode(json_mode)
            .build()
    }

    /// Send a single-turn prompt and return the reply text
    #[instrument(skip(self, prompt), fields(provider = self.provider.name(), prompt_chars = prompt.len()))]
    pub async fn complete(&self, prompt: String) -> Result<String> {
        let start = Instant::now();
        let response = self.provider.complete(self.request(prompt, false)).await?;
        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            reply_chars = response.text().len(),
            "Completion received"
        );
        Ok(response.text().to_string())
    }

    /// Send a prompt that asks for a JSON object and decode the reply into `T`
    #[instrument(skip(self, prompt), fields(provider = self.provider.name(), prompt_chars = prompt.len()))]
    pub async fn complete_structured<T: StructuredOutput>(&self, prompt: String) -> Result<T> {
        let start = Instant::now();
        let response = self.provider.complete(self.request(prompt, true)).await?;
        debug!(
            elapsed_ms = start.elapsed().as_millis() as u64,
            reply_chars = response.text().len(),
            "Structured completion received"
        );
        Ok(parse_structured::<T>(response.text())?)
    }
}

impl std::fmt::Debug for InsightsContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InsightsContext")
            .field("provider", &self.provider.name())
            .field("database", &self.database.path())
            .field("prompts", &self.prompts)
            .finish_non_exhaustive()
    }
}
