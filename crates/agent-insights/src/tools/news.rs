//! Symbol extraction and news tools

use super::{RETRIEVE_SYMBOL_LIST, SCRAPE_YAHOO_FINANCE_NEWS, run_tool};
use crate::context::InsightsContext;
use agent_core::Result as AgentResult;
use agent_tools::Tool;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

/// Tool extracting ticker symbols from a request
pub struct RetrieveSymbolListTool {
    ctx: Arc<InsightsContext>,
}

impl RetrieveSymbolListTool {
    pub fn new(ctx: Arc<InsightsContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for RetrieveSymbolListTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        run_tool(&self.ctx, RETRIEVE_SYMBOL_LIST, params).await
    }

    fn name(&self) -> &str {
        RETRIEVE_SYMBOL_LIST
    }

    fn description(&self) -> &str {
        "List the stock ticker symbols of the companies mentioned in a request."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "user_request": {
                    "type": "string",
                    "description": "Free-form request mentioning companies or tickers"
                }
            },
            "required": ["user_request"]
        })
    }

    fn output_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "symbol_list": { "type": "array", "items": { "type": "string" } }
            },
            "required": ["symbol_list"]
        })
    }
}

/// Tool answering a request from recent Yahoo Finance news
pub struct ScrapeYahooFinanceNewsTool {
    ctx: Arc<InsightsContext>,
}

impl ScrapeYahooFinanceNewsTool {
    pub fn new(ctx: Arc<InsightsContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for ScrapeYahooFinanceNewsTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        run_tool(&self.ctx, SCRAPE_YAHOO_FINANCE_NEWS, params).await
    }

    fn name(&self) -> &str {
        SCRAPE_YAHOO_FINANCE_NEWS
    }

    fn description(&self) -> &str {
        "Answer a request using recent Yahoo Finance news headlines for the given \
         ticker symbols. Returns the answer and the article links it drew on."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "user_request": {
                    "type": "string",
                    "description": "Question about recent events"
                },
                "symbol_list": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Ticker symbols to fetch news for"
                }
            },
            "required": ["user_request", "symbol_list"]
        })
    }

    fn output_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "answer": { "type": "string" },
                "url_list": { "type": "array", "items": { "type": "string", "format": "uri" } }
            },
            "required": ["answer", "url_list"]
        })
    }
}
