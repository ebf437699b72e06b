//! Text-to-SQL over the stock database
//!
//! The completion service writes SQLite for the request against the schemas
//! of the selected tables. Every statement in its fenced block is executed on
//! a read-only connection that can only see those tables.

use crate::context::InsightsContext;
use crate::error::{InsightsError, Result};
use crate::prompts::TEXT_TO_SQL;
use crate::selector::select_tables;
use crate::store::StatementOutcome;
use crate::summary::{summary_json, table_summaries_from_names};
use regex::Regex;
use serde::Serialize;
use serde_json::json;
use std::sync::LazyLock;
use tracing::{debug, info, instrument};

// Dialect tags such as sqlite count as sql
static SQL_BLOCK: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?i:sql)\w*\s+(.*?)\s*```").expect("valid sql fence pattern"));
// Any other language tag is dropped with its line
static ANY_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?s)```(?:[\w+#.-]*[ \t]*\n)?\s*(.*?)\s*```").expect("valid fence pattern")
});

/// Statements, their outcomes and a readable transcript
#[derive(Debug, Clone, Serialize)]
pub struct SqlQueryResponse {
    pub queries: Vec<String>,
    pub results: Vec<StatementOutcome>,
    pub message: String,
}

/// Extract the SQL from a completion
///
/// Prefers a ```sql block (any sql dialect tag) and falls back to the first
/// fenced block, without its language tag.
pub fn find_sql(text: &str) -> Result<String> {
    SQL_BLOCK
        .captures(text)
        .or_else(|| ANY_BLOCK.captures(text))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|sql| !sql.is_empty())
        .ok_or(InsightsError::NoQueryFound)
}

/// Split a SQL block into its non-empty statements, in order
///
/// Only top-level `;` separates statements; one inside a quoted string or
/// identifier is kept. Comments are not parsed.
pub fn split_statements(sql: &str) -> Vec<String> {
    let mut fragments = Vec::new();
    let mut quote: Option<char> = None;
    let mut start = 0;

    for (index, ch) in sql.char_indices() {
        if let Some(open) = quote {
            // a doubled quote closes and reopens, which keeps '' escapes intact
            if ch == open {
                quote = None;
            }
        } else if matches!(ch, '\'' | '"' | '`') {
            quote = Some(ch);
        } else if ch == ';' {
            fragments.push(&sql[start..index]);
            start = index + 1;
        }
    }
    fragments.push(&sql[start..]);

    fragments
        .into_iter()
        .map(str::trim)
        .filter(|statement| !statement.is_empty())
        .map(str::to_string)
        .collect()
}

fn transcript(queries: &[String], results: &[StatementOutcome]) -> String {
    queries
        .iter()
        .zip(results)
        .map(|(query, result)| format!("Query {query} executed with result {result}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Answer `user_request` about `symbols` with generated SQL
///
/// A failing statement records its error in its slot and the remaining
/// statements still run.
#[instrument(skip(ctx))]
pub async fn query_text_to_sql(
    ctx: &InsightsContext,
    user_request: &str,
    symbols: &[String],
) -> Result<SqlQueryResponse> {
    let selected = select_tables(ctx, user_request, symbols).await?;
    let summaries = table_summaries_from_names(ctx.database(), &selected)?;

    let prompt = ctx.render(
        TEXT_TO_SQL,
        &json!({
            "summaries": summary_json(&summaries)?,
            "user_request": user_request,
        }),
    )?;
    let reply = ctx.complete(prompt).await?;
    let sql = find_sql(&reply)?;
    debug!(sql = %sql, "Synthesized SQL");

    let queries = split_statements(&sql);
    let results: Vec<StatementOutcome> = queries
        .iter()
        .map(|query| ctx.database().execute_statement(query, &selected))
        .collect();

    let failed = results.iter().filter(|r| r.is_error()).count();
    info!(statements = queries.len(), failed, "Executed synthesized SQL");

    let message = transcript(&queries, &results);
    Ok(SqlQueryResponse {
        queries,
        results,
        message,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::QueryRows;
    use crate::test_support::{ScriptedProvider, context_with};

    #[test]
    fn test_find_sql_prefers_sql_block() {
        let text = "Here:\n```python\nprint(1)\n```\nand\n```sql\nSELECT MAX(Close) FROM aapl_history;\n```";
        assert_eq!(find_sql(text).unwrap(), "SELECT MAX(Close) FROM aapl_history;");
    }

    #[test]
    fn test_find_sql_generic_fallback() {
        let text = "```\nSELECT 1\n```";
        assert_eq!(find_sql(text).unwrap(), "SELECT 1");
    }

    #[test]
    fn test_find_sql_dialect_tags() {
        assert_eq!(find_sql("```sqlite\nSELECT 1\n```").unwrap(), "SELECT 1");
        assert_eq!(find_sql("```SQLite\nSELECT 1;\n```").unwrap(), "SELECT 1;");
        assert_eq!(find_sql("```postgresql\nSELECT 2\n```").unwrap(), "SELECT 2");
    }

    #[test]
    fn test_find_sql_fallback_drops_language_tag() {
        assert_eq!(find_sql("```text\nSELECT 1\n```").unwrap(), "SELECT 1");
        assert_eq!(find_sql("Run ```SELECT 1``` now").unwrap(), "SELECT 1");
    }

    #[test]
    fn test_find_sql_none() {
        assert!(matches!(find_sql("SELECT 1"), Err(InsightsError::NoQueryFound)));
        assert!(matches!(find_sql("```sql\n\n```"), Err(InsightsError::NoQueryFound)));
    }

    #[test]
    fn test_split_statements() {
        assert_eq!(split_statements("SELECT 1; SELECT 2;"), vec!["SELECT 1", "SELECT 2"]);
        assert_eq!(split_statements(" ;\n;"), Vec::<String>::new());
    }

    #[test]
    fn test_split_statements_keeps_quoted_separators() {
        let sql = "SELECT * FROM aapl_info WHERE Value LIKE '%a;b%'; SELECT 2;";
        assert_eq!(
            split_statements(sql),
            vec!["SELECT * FROM aapl_info WHERE Value LIKE '%a;b%'", "SELECT 2"]
        );

        let escaped = "SELECT 'it''s; fine' AS \"a;b\"; SELECT 3";
        assert_eq!(
            split_statements(escaped),
            vec!["SELECT 'it''s; fine' AS \"a;b\"", "SELECT 3"]
        );
    }

    #[tokio::test]
    async fn test_query_text_to_sql_collects_all_outcomes() {
        let provider = ScriptedProvider::new(vec![
            r#"{"table_names": ["aapl_history"]}"#,
            "```sql\nSELECT COUNT(*) FROM aapl_history;\nSELECT * FROM msft_history;\nSELECT 2;\n```",
        ]);
        let (_dir, ctx) = context_with(provider.clone(), &["AAPL", "MSFT"]);

        let response = query_text_to_sql(&ctx, "How many trading days?", &["AAPL".to_string()])
            .await
            .unwrap();

        assert_eq!(response.queries.len(), 3);
        assert_eq!(response.queries.len(), response.results.len());
        assert_eq!(
            response.results[0],
            StatementOutcome::Rows(QueryRows {
                columns: vec!["COUNT(*)".into()],
                rows: vec![vec![json!(2)]],
            })
        );
        assert!(response.results[1].is_error());
        assert!(!response.results[2].is_error());

        let lines: Vec<&str> = response.message.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Query SELECT COUNT(*) FROM aapl_history executed with result [[2]]");
        assert!(lines[1].starts_with("Query SELECT * FROM msft_history executed with result Error: "));

        let sql_prompt = provider.prompts().remove(1);
        assert!(sql_prompt.contains("aapl_history"));
        assert!(!sql_prompt.contains("msft_history"));
    }

    #[tokio::test]
    async fn test_query_text_to_sql_without_block() {
        let provider = ScriptedProvider::new(vec![
            r#"{"table_names": ["aapl_history"]}"#,
            "The answer is 42.",
        ]);
        let (_dir, ctx) = context_with(provider, &["AAPL"]);

        let result = query_text_to_sql(&ctx, "anything", &["AAPL".to_string()]).await;
        assert!(matches!(result, Err(InsightsError::NoQueryFound)));
    }

    #[tokio::test]
    async fn test_response_serializes_with_expected_keys() {
        let provider = ScriptedProvider::new(vec![
            r#"{"table_names": ["aapl_history"]}"#,
            "```sql\nSELECT 1\n```",
        ]);
        let (_dir, ctx) = context_with(provider, &["AAPL"]);

        let response = query_text_to_sql(&ctx, "one", &["AAPL".to_string()]).await.unwrap();
        let value = serde_json::to_value(&response).unwrap();
        assert_eq!(value["queries"], json!(["SELECT 1"]));
        assert_eq!(value["results"][0]["status"], "rows");
        assert!(value["message"].is_string());
    }
}
