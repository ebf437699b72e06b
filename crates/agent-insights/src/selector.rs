//! LLM selection of the tables relevant to a request

use crate::context::InsightsContext;
use crate::error::Result;
use crate::prompts::SELECT_TABLES;
use crate::summary::{summary_json, table_summaries_from_symbols};
use agent_llm::{StructuredOutput, format_instructions};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{info, instrument};

/// Structured reply of the table selection prompt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableNames {
    pub table_names: Vec<String>,
}

impl StructuredOutput for TableNames {
    fn json_schema() -> Value {
        json!({
            "type": "object",
            "properties": {
                "table_names": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "List of the most relevant table names for the user query"
                }
            },
            "required": ["table_names"]
        })
    }
}

/// Ask the completion service which tables of `symbols` answer `user_request`
///
/// The returned names are not checked against the store; callers summarize
/// them by name, which drops names that do not exist.
#[instrument(skip(ctx))]
pub async fn select_tables(
    ctx: &InsightsContext,
    user_request: &str,
    symbols: &[String],
) -> Result<Vec<String>> {
    let summaries = table_summaries_from_symbols(ctx.database(), symbols)?;
    let prompt = ctx.render(
        SELECT_TABLES,
        &json!({
            "summaries": summary_json(&summaries)?,
            "user_request": user_request,
            "format_instructions": format_instructions::<TableNames>(),
        }),
    )?;

    let selection: TableNames = ctx.complete_structured(prompt).await?;
    info!(tables = ?selection.table_names, "Selected tables");
    Ok(selection.table_names)
}
