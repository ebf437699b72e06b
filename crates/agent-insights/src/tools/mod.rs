//! Tools exposing the insights pipelines to an orchestration layer
//!
//! Each tool parses its JSON arguments into a [`ToolCall`] and hands it to
//! [`dispatch`]. All argument checks run before any market data, store or
//! completion access.

pub mod create_database;
pub mod news;
pub mod query_database;

pub use create_database::{CreateStockDatabaseTool, create_stock_database};
pub use news::{RetrieveSymbolListTool, ScrapeYahooFinanceNewsTool};
pub use query_database::{QueryMethod, QueryStockDatabaseTool};

use crate::context::InsightsContext;
use crate::dataframe::query_dataframe_chat;
use crate::error::{InsightsError, Result};
use crate::extract::DateRange;
use crate::news::{retrieve_symbol_list, scrape_yahoo_finance_news};
use crate::synthesizer::query_text_to_sql;
use agent_tools::ToolRegistry;
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, instrument};

pub const CREATE_STOCK_DATABASE: &str = "create_stock_database";
pub const QUERY_STOCK_DATABASE: &str = "query_stock_database";
pub const RETRIEVE_SYMBOL_LIST: &str = "retrieve_symbol_list";
pub const SCRAPE_YAHOO_FINANCE_NEWS: &str = "scrape_yahoo_finance_news";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreateDatabaseArgs {
    pub symbol_list: Value,
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct QueryDatabaseArgs {
    pub user_request: String,
    pub symbol_list: Value,
    pub method: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SymbolListArgs {
    pub user_request: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct NewsArgs {
    pub user_request: String,
    pub symbol_list: Value,
}

/// A tool invocation with its parsed arguments
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "name", content = "arguments", rename_all = "snake_case")]
pub enum ToolCall {
    CreateStockDatabase(CreateDatabaseArgs),
    QueryStockDatabase(QueryDatabaseArgs),
    RetrieveSymbolList(SymbolListArgs),
    ScrapeYahooFinanceNews(NewsArgs),
}

impl ToolCall {
    /// Parse the arguments of the named tool
    ///
    /// Arguments of the wrong shape are reported as a `TypeError`.
    pub fn parse(name: &str, arguments: Value) -> Result<Self> {
        serde_json::from_value(json!({ "name": name, "arguments": arguments }))
            .map_err(|e| InsightsError::TypeError(format!("{name}: {e}")))
    }
}

/// Validate a symbol list argument: a non-empty array of strings
///
/// Symbols are trimmed and deduplicated ignoring case, since tables are
/// keyed by the lowercased symbol. The first spelling is kept.
pub fn parse_symbol_list(value: &Value) -> Result<Vec<String>> {
    let items = value.as_array().ok_or_else(|| {
        InsightsError::TypeError(format!("symbol_list must be a list of strings, got {value}"))
    })?;

    let mut symbols: Vec<String> = Vec::with_capacity(items.len());
    for item in items {
        let symbol = item
            .as_str()
            .ok_or_else(|| InsightsError::TypeError(format!("symbol_list entries must be strings, got {item}")))?
            .trim();
        if symbol.is_empty() {
            return Err(InsightsError::ValueError("symbol_list contains an empty symbol".to_string()));
        }
        if !symbols.iter().any(|s| s.eq_ignore_ascii_case(symbol)) {
            symbols.push(symbol.to_string());
        }
    }

    if symbols.is_empty() {
        return Err(InsightsError::ValueError("symbol_list must contain at least one symbol".to_string()));
    }
    Ok(symbols)
}

/// Run a parsed tool call against the context
#[instrument(skip(ctx, call))]
pub async fn dispatch(ctx: &InsightsContext, call: ToolCall) -> Result<Value> {
    match call {
        ToolCall::CreateStockDatabase(args) => {
            let symbols = parse_symbol_list(&args.symbol_list)?;
            let range = DateRange::resolve(args.start_date, args.end_date, Utc::now().date_naive())?;
            debug!(tool = CREATE_STOCK_DATABASE, symbols = symbols.len(), "Dispatching");
            let tables = create_stock_database(ctx, &symbols, &range).await?;
            Ok(serde_json::to_value(tables)?)
        },
        ToolCall::QueryStockDatabase(args) => {
            let symbols = parse_symbol_list(&args.symbol_list)?;
            let method: QueryMethod = args.method.parse()?;
            debug!(tool = QUERY_STOCK_DATABASE, method = %method, "Dispatching");
            match method {
                QueryMethod::TextToSql => {
                    let response = query_text_to_sql(ctx, &args.user_request, &symbols).await?;
                    Ok(serde_json::to_value(response)?)
                },
                QueryMethod::DataframeChat => {
                    let answers = query_dataframe_chat(ctx, &args.user_request, &symbols).await?;
                    Ok(serde_json::to_value(answers)?)
                },
            }
        },
        ToolCall::RetrieveSymbolList(args) => {
            let symbol_list = retrieve_symbol_list(ctx, &args.user_request).await?;
            Ok(json!({ "symbol_list": symbol_list }))
        },
        ToolCall::ScrapeYahooFinanceNews(args) => {
            let symbols = parse_symbol_list(&args.symbol_list)?;
            let answer = scrape_yahoo_finance_news(ctx, &args.user_request, &symbols).await?;
            Ok(serde_json::to_value(answer)?)
        },
    }
}

/// Parse and dispatch on behalf of a tool, converting errors for the caller
///
/// Argument errors become [`agent_core::Error::InvalidArguments`].
pub(crate) async fn run_tool(ctx: &InsightsContext, tool: &str, params: Value) -> agent_core::Result<Value> {
    let outcome = match ToolCall::parse(tool, params) {
        Ok(call) => dispatch(ctx, call).await,
        Err(e) => Err(e),
    };
    outcome.map_err(|e| match e {
        InsightsError::TypeError(_) | InsightsError::ValueError(_) | InsightsError::InvalidRange(_) => {
            agent_core::Error::invalid_arguments(tool, e)
        },
        other => other.into(),
    })
}

/// Register every insights tool, sharing one context
pub fn register_tools(registry: &ToolRegistry, ctx: Arc<InsightsContext>) {
    registry.register(Arc::new(CreateStockDatabaseTool::new(ctx.clone())));
    registry.register(Arc::new(QueryStockDatabaseTool::new(ctx.clone())));
    registry.register(Arc::new(RetrieveSymbolListTool::new(ctx.clone())));
    registry.register(Arc::new(ScrapeYahooFinanceNewsTool::new(ctx)));
}
