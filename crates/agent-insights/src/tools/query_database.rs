//! Tool answering questions from the stock database

use super::{QUERY_STOCK_DATABASE, run_tool};
use crate::context::InsightsContext;
use crate::error::InsightsError;
use agent_core::Result as AgentResult;
use agent_tools::Tool;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

/// How a database question is answered
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryMethod {
    TextToSql,
    DataframeChat,
}

impl QueryMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryMethod::TextToSql => "text-to-SQL",
            QueryMethod::DataframeChat => "dataframe-chat",
        }
    }
}

impl fmt::Display for QueryMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QueryMethod {
    type Err = InsightsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text-to-SQL" => Ok(QueryMethod::TextToSql),
            // legacy name of the dataframe method
            "dataframe-chat" | "PandasAI-SqliteConnector" => Ok(QueryMethod::DataframeChat),
            other => Err(InsightsError::ValueError(format!(
                "Unknown method '{other}', expected 'text-to-SQL' or 'dataframe-chat'"
            ))),
        }
    }
}

/// Tool for querying the stock database in natural language
pub struct QueryStockDatabaseTool {
    ctx: Arc<InsightsContext>,
}

impl QueryStockDatabaseTool {
    pub fn new(ctx: Arc<InsightsContext>) -> Self {
        Self { ctx }
    }
}

#[async_trait]
impl Tool for QueryStockDatabaseTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        run_tool(&self.ctx, QUERY_STOCK_DATABASE, params).await
    }

    fn name(&self) -> &str {
        QUERY_STOCK_DATABASE
    }

    fn description(&self) -> &str {
        "Answer a question about stocks already stored in the stock database. \
         'text-to-SQL' generates and runs SQLite queries over the relevant tables; \
         'dataframe-chat' answers from each relevant table separately."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "user_request": {
                    "type": "string",
                    "description": "Question to answer from the stored data"
                },
                "symbol_list": {
                    "type": "array",
                    "items": { "type": "string" },
                    "description": "Ticker symbols whose tables may be used"
                },
                "method": {
                    "type": "string",
                    "enum": ["text-to-SQL", "dataframe-chat"],
                    "description": "Query method"
                }
            },
            "required": ["user_request", "symbol_list", "method"]
        })
    }

    fn output_schema(&self) -> Value {
        json!({
            "oneOf": [
                {
                    "type": "object",
                    "properties": {
                        "queries": { "type": "array", "items": { "type": "string" } },
                        "results": { "type": "array" },
                        "message": { "type": "string" }
                    },
                    "required": ["queries", "results", "message"]
                },
                {
                    "type": "object",
                    "description": "Per symbol, one answer per relevant table",
                    "additionalProperties": {
                        "type": "array",
                        "items": {
                            "type": "object",
                            "properties": {
                                "table": { "type": "string" },
                                "answer": { "type": "string" }
                            }
                        }
                    }
                }
            ]
        })
    }
}
