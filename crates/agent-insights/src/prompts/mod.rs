//! Prompt templates used by the insights pipelines

mod templates;

pub use templates::*;

use agent_prompt::{PromptRegistry, Result};

/// Register all insights prompts with the given registry
pub fn register_prompts(registry: &PromptRegistry) -> Result<()> {
    registry.register(select_tables()?);
    registry.register(text_to_sql()?);
    registry.register(dataframe_chat()?);
    registry.register(symbol_list()?);
    registry.register(news_answer()?);

    Ok(())
}
