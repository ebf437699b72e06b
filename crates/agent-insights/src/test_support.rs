//! Scripted collaborators for pipeline tests

use crate::api::NewsArticle;
use crate::config::InsightsConfig;
use crate::context::InsightsContext;
use crate::error::{InsightsError, Result};
use crate::extract::{Category, DateRange, MarketDataSource};
use crate::record::{Dataset, SymbolRecord, Table};
use agent_llm::{CompletionRequest, CompletionResponse, LLMError, LLMProvider, Message, StopReason, TokenUsage};
use async_trait::async_trait;
use serde_json::json;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Provider replaying canned replies and recording the prompts it received
pub struct ScriptedProvider {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(replies: Vec<&str>) -> Arc<Self> {
        Arc::new(Self {
            replies: Mutex::new(replies.into_iter().map(str::to_string).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedProvider {
    async fn complete(&self, request: CompletionRequest) -> agent_llm::Result<CompletionResponse> {
        let prompt = request
            .messages
            .last()
            .map(|m| m.content.clone())
            .unwrap_or_default();
        self.prompts.lock().unwrap().push(prompt);

        let reply = self
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| LLMError::UnexpectedResponse("no scripted reply left".to_string()))?;
        Ok(CompletionResponse {
            message: Message::assistant(reply),
            stop_reason: StopReason::EndTurn,
            usage: TokenUsage::default(),
        })
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Offline market data: fixed tables per symbol, canned news
#[derive(Default)]
pub struct FakeMarketData {
    extracted: Mutex<Vec<(String, DateRange)>>,
}

impl FakeMarketData {
    pub fn extracted(&self) -> Vec<(String, DateRange)> {
        self.extracted.lock().unwrap().clone()
    }
}

/// A small record: two history rows, a profile and an empty category
pub fn sample_record(symbol: &str) -> SymbolRecord {
    let mut record = SymbolRecord::new(symbol);
    record.push(
        Category::Info.as_str(),
        Dataset::KeyValue(vec![
            ("longName".into(), json!(format!("{symbol} Inc."))),
            ("sector".into(), json!("Technology")),
        ]),
    );
    record.push(
        Category::History.as_str(),
        Dataset::Table(Table::new(
            vec!["Date".into(), "Close".into(), "Volume".into()],
            vec![
                vec![json!("2024-01-02"), json!(185.64), json!(82_488_700)],
                vec![json!("2024-01-03"), json!(184.25), json!(58_414_500)],
            ],
        )),
    );
    record.push(Category::Sustainability.as_str(), Dataset::empty());
    record
}

#[async_trait]
impl MarketDataSource for FakeMarketData {
    async fn extract(&self, symbol: &str, range: &DateRange) -> SymbolRecord {
        self.extracted.lock().unwrap().push((symbol.to_string(), *range));
        sample_record(symbol)
    }

    async fn news(&self, symbol: &str, count: usize) -> Result<Vec<NewsArticle>> {
        if symbol == "FAIL" {
            return Err(InsightsError::YahooFinance("HTTP 404".to_string()));
        }
        Ok((0..count.min(2))
            .map(|i| NewsArticle {
                title: format!("{symbol} headline {i}"),
                publisher: Some("Reuters".to_string()),
                link: format!("https://finance.yahoo.com/news/{}-{i}.html", symbol.to_lowercase()),
                published_at: None,
                related_tickers: vec![symbol.to_string()],
            })
            .collect())
    }
}

/// Context over a temporary database seeded with `symbols`
pub fn context_with(provider: Arc<ScriptedProvider>, symbols: &[&str]) -> (tempfile::TempDir, InsightsContext) {
    let (dir, ctx, _) = context_with_market(provider, symbols);
    (dir, ctx)
}

/// Like [`context_with`], also handing back the market data double
pub fn context_with_market(
    provider: Arc<ScriptedProvider>,
    symbols: &[&str],
) -> (tempfile::TempDir, InsightsContext, Arc<FakeMarketData>) {
    let dir = tempfile::tempdir().unwrap();
    let config = InsightsConfig::builder()
        .database_path(dir.path().join("stock_database.db"))
        .news_count(5)
        .build()
        .unwrap();
    let market = Arc::new(FakeMarketData::default());
    let ctx = InsightsContext::new(provider, market.clone(), config).unwrap();

    if !symbols.is_empty() {
        ctx.database()
            .store_records(symbols.iter().map(|s| sample_record(s)).collect())
            .unwrap();
    }
    (dir, ctx, market)
}
