//! Dataframe chat: answer from the selected tables one table at a time

use crate::context::InsightsContext;
use crate::error::Result;
use crate::prompts::DATAFRAME_CHAT;
use crate::selector::select_tables;
use crate::store::QueryRows;
use crate::summary::resolve_table_names;
use comfy_table::Table as TextTable;
use comfy_table::presets::ASCII_MARKDOWN;
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use tracing::{debug, info, instrument};

/// Answer produced from a single table
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableAnswer {
    pub table: String,
    pub answer: String,
}

/// Render rows as a markdown table for the prompt
pub fn render_rows(rows: &QueryRows) -> String {
    let mut table = TextTable::new();
    table.load_preset(ASCII_MARKDOWN).set_header(rows.columns.clone());
    for row in &rows.rows {
        table.add_row(row.iter().map(cell_text).collect::<Vec<_>>());
    }
    table.to_string()
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Ask the completion service about each selected table of each symbol
///
/// Selected names are matched to stored tables ignoring case; names that do
/// not exist in the store are skipped.
#[instrument(skip(ctx))]
pub async fn query_dataframe_chat(
    ctx: &InsightsContext,
    user_request: &str,
    symbols: &[String],
) -> Result<BTreeMap<String, Vec<TableAnswer>>> {
    let limit = ctx.config().dataframe_row_limit;

    let mut answers = BTreeMap::new();
    for symbol in symbols {
        let selected = select_tables(ctx, user_request, std::slice::from_ref(symbol)).await?;

        let mut symbol_answers = Vec::new();
        for table in resolve_table_names(ctx.database(), &selected)? {
            let rows = ctx.database().read_table(&table, limit)?;
            debug!(table = %table, rows = rows.rows.len(), "Loaded table for chat");

            let prompt = ctx.render(
                DATAFRAME_CHAT,
                &json!({
                    "table_name": table,
                    "table": render_rows(&rows),
                    "user_request": user_request,
                }),
            )?;
            let answer = ctx.complete(prompt).await?;
            symbol_answers.push(TableAnswer { table, answer });
        }

        info!(symbol = %symbol, answers = symbol_answers.len(), "Dataframe chat finished");
        answers.insert(symbol.clone(), symbol_answers);
    }
    Ok(answers)
}
