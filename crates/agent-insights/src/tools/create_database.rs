//! Tool populating the stock database from market data

use super::{CREATE_STOCK_DATABASE, run_tool};
use crate::context::InsightsContext;
use crate::error::Result;
use crate::extract::DateRange;
use agent_core::Result as AgentResult;
use agent_tools::Tool;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, instrument};

/// Extract every symbol over `range` and store the results
///
/// Symbols are fetched one after another, then written together. Returns the
/// table names created for each symbol.
#[instrument(skip(ctx, range), fields(start = %range.start(), end = %range.end()))]
pub async fn create_stock_database(
    ctx: &InsightsContext,
    symbols: &[String],
    range: &DateRange,
) -> Result<BTreeMap<String, Vec<String>>> {
    let mut records = Vec::with_capacity(symbols.len());
    for symbol in symbols {
        records.push(ctx.market_data().extract(symbol, range).await);
    }

    let tables = ctx.database().store_records(records)?;
    info!(
        symbols = tables.len(),
        tables = tables.values().map(Vec::len).sum::<usize>(),
        path = %ctx.database().path().display(),
        "Stock database created"
    );
    Ok(tables)
}

/// Tool for building the stock database
pub struct CreateStockDatabaseTool {
    ctx: Arc<InsightsContext>,
}

impl CreateStockDatabaseTool {
    pub fn new(ctx: Arc<InsightsContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for CreateStockDatabaseTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        run_tool(&self.ctx, CREATE_STOCK_DATABASE, params).await
    }

    fn name(&self) -> &str {
        CREATE_STOCK_DATABASE
    }

    fn description(&self) -> &str {
        "Fetch market data from Yahoo Finance for the given ticker symbols and store it \
         in the stock database, one table per symbol and data category. \
         The date range defaults to the last 365 days and may not exceed one year."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol_list": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Ticker symbols to fetch (e.g., ['AAPL', 'MSFT'])"
                },
                "start_date": {
                    "type": "string",
                    "format": "date",
                    "description": "First day of price history (YYYY-MM-DD)"
                },
                "end_date": {
                    "type": "string",
                    "format": "date",
                    "description": "Last day of price history (YYYY-MM-DD), defaults to today"
                }
            },
            "required": ["symbol_list"]
        })
    }

    fn output_schema(&self) -> Value {
        json!({
            "type": "object",
            "description": "Created table names keyed by symbol",
            "additionalProperties": { "type": "array", "items": { "type": "string" } }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{ScriptedProvider, context_with_market};
    use chrono::NaiveDate;

    fn range() -> DateRange {
        DateRange::new(
            NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            NaiveDate::from_ymd_opt(2024, 1, 31).unwrap(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_stock_database_stores_each_symbol() {
        let (_dir, ctx, market) = context_with_market(ScriptedProvider::new(vec![]), &[]);

        let tables = create_stock_database(&ctx, &["AAPL".to_string(), "MSFT".to_string()], &range())
            .await
            .unwrap();

        assert_eq!(tables.keys().collect::<Vec<_>>(), vec!["AAPL", "MSFT"]);
        // the empty sustainability dataset has no columns and is skipped
        assert_eq!(tables["AAPL"], vec!["aapl_info", "aapl_history"]);
        assert_eq!(market.extracted().len(), 2);
        assert_eq!(ctx.database().list_tables().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn test_create_twice_replaces_tables() {
        let (_dir, ctx, _market) = context_with_market(ScriptedProvider::new(vec![]), &[]);
        let symbols = vec!["AAPL".to_string()];

        create_stock_database(&ctx, &symbols, &range()).await.unwrap();
        create_stock_database(&ctx, &symbols, &range()).await.unwrap();

        let rows = ctx.database().read_table("aapl_history", 10).unwrap();
        assert_eq!(rows.rows.len(), 2);
    }

    #[tokio::test]
    async fn test_tool_rejects_non_list_symbols() {
        let (_dir, ctx, market) = context_with_market(ScriptedProvider::new(vec![]), &[]);
        let tool = CreateStockDatabaseTool::new(Arc::new(ctx));

        let result = tool.execute(json!({ "symbol_list": "AAPL" })).await;
        assert!(matches!(
            result,
            Err(agent_core::Error::InvalidArguments { ref detail, .. }) if detail.starts_with("TypeError")
        ));
        assert!(market.extracted().is_empty());
    }

    #[tokio::test]
    async fn test_tool_defaults_end_date_to_today() {
        let (_dir, ctx, market) = context_with_market(ScriptedProvider::new(vec![]), &[]);
        let tool = CreateStockDatabaseTool::new(Arc::new(ctx));

        let out = tool.execute(json!({ "symbol_list": ["AAPL"] })).await.unwrap();
        assert!(out["AAPL"].as_array().is_some_and(|t| !t.is_empty()));

        let (_, used) = &market.extracted()[0];
        let today = chrono::Utc::now().date_naive();
        assert!(used.end() == today || used.end() == today.pred_opt().unwrap());
        assert_eq!((used.end() - used.start()).num_days(), 365);
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_create_stock_database_live() {
        use crate::config::InsightsConfig;
        use crate::extract::YahooMarketData;

        let dir = tempfile::tempdir().unwrap();
        let config = InsightsConfig::builder()
            .database_path(dir.path().join("stock_database.db"))
            .build()
            .unwrap();
        let market = Arc::new(YahooMarketData::new(&config).unwrap());
        let provider = ScriptedProvider::new(vec![]);
        let ctx = InsightsContext::new(provider, market, config).unwrap();

        let today = chrono::Utc::now().date_naive();
        let range = DateRange::resolve(today.checked_sub_days(chrono::Days::new(30)), Some(today), today).unwrap();
        let tables = create_stock_database(&ctx, &["AAPL".to_string()], &range).await.unwrap();

        assert_eq!(tables.keys().collect::<Vec<_>>(), vec!["AAPL"]);
        assert!(!tables["AAPL"].is_empty());
        assert!(tables["AAPL"].iter().all(|name| name.starts_with("aapl_")));
    }
}
