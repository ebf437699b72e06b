//! Stock database pipelines for tool-calling assistants
//!
//! This crate turns Yahoo Finance market data into a queryable SQLite store
//! and answers natural-language questions over it:
//!
//! - Market data extraction into typed datasets, one per data category
//! - Table writes with sanitized columns and replace semantics
//! - Schema summaries used to prompt the completion service
//! - LLM table selection followed by text-to-SQL or per-table dataframe chat
//! - Ticker symbol extraction and news-grounded answers
//!
//! # Architecture
//!
//! Every operation receives an explicit [`InsightsContext`] holding the
//! completion provider, the market data source, the prompt registry and the
//! database handle. The [`tools`] module exposes the operations through an
//! [`agent_tools::ToolRegistry`].
//!
//! # Example
//!
//! ```rust,ignore
//! use agent_insights::{InsightsConfig, InsightsContext, YahooMarketData, tools};
//! use agent_tools::ToolRegistry;
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let config = InsightsConfig::default();
//!     let market = Arc::new(YahooMarketData::new(&config)?);
//!     let ctx = Arc::new(InsightsContext::new(/* your provider */, market, config)?);
//!
//!     let registry = ToolRegistry::new();
//!     tools::register_tools(&registry, ctx);
//!
//!     let tables = registry
//!         .invoke("create_stock_database", json!({ "symbol_list": ["AAPL"] }))
//!         .await?;
//!     println!("{tables}");
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod context;
pub mod dataframe;
pub mod error;
pub mod extract;
pub mod news;
pub mod prompts;
pub mod record;
pub mod selector;
pub mod store;
pub mod summary;
pub mod synthesizer;
pub mod tools;

#[cfg(test)]
mod test_support;

pub use config::InsightsConfig;
pub use context::InsightsContext;
pub use dataframe::{TableAnswer, query_dataframe_chat};
pub use error::{InsightsError, Result};
pub use extract::{Category, DateRange, MarketDataSource, YahooMarketData};
pub use news::{NewsAnswer, handle_news_question, retrieve_symbol_list, scrape_yahoo_finance_news};
pub use record::{Dataset, SymbolRecord, Table};
pub use selector::select_tables;
pub use store::{QueryRows, StatementOutcome, StockDatabase};
pub use summary::{SchemaSummary, resolve_table_names, table_summaries_from_names, table_summaries_from_symbols};
pub use synthesizer::{SqlQueryResponse, query_text_to_sql};
pub use tools::{QueryMethod, ToolCall, create_stock_database, dispatch, register_tools};
