//! Yahoo Finance backed market data source

use super::tables::{self, Field, SUMMARY_MODULES};
use super::{Category, DateRange, MarketDataSource};
use crate::api::{NewsArticle, PriceBar, YahooFinanceClient};
use crate::config::InsightsConfig;
use crate::error::Result;
use crate::record::{Dataset, SymbolRecord};
use async_trait::async_trait;
use serde_json::Value;
use tracing::{info, instrument, warn};

/// Market data source backed by the Yahoo Finance endpoints
pub struct YahooMarketData {
    client: YahooFinanceClient,
    news_count: usize,
}

/// Raw payloads fetched for one symbol, each possibly failed
struct Payloads {
    summary: Result<Value>,
    history: Result<Vec<PriceBar>>,
    chart: Result<Value>,
    expirations: Result<Vec<i64>>,
    news: Result<Vec<NewsArticle>>,
}

impl YahooMarketData {
    pub fn new(config: &InsightsConfig) -> Result<Self> {
        Ok(Self {
            client: YahooFinanceClient::new(config.request_timeout)?,
            news_count: config.news_count,
        })
    }

    async fn fetch(&self, symbol: &str, range: &DateRange) -> Payloads {
        let (start, end) = range.bounds();
        Payloads {
            summary: self.client.quote_summary(symbol, SUMMARY_MODULES).await,
            history: self.client.history(symbol, start, end).await,
            chart: self.client.chart(symbol, start, end).await,
            expirations: self.client.option_expirations(symbol).await,
            news: self.client.news(symbol, self.news_count).await,
        }
    }
}

#[async_trait]
impl MarketDataSource for YahooMarketData {
    #[instrument(skip(self, range), fields(start = %range.start(), end = %range.end()))]
    async fn extract(&self, symbol: &str, range: &DateRange) -> SymbolRecord {
        let payloads = self.fetch(symbol, range).await;
        let record = assemble(symbol, &payloads);
        info!(datasets = record.datasets.len(), "Extracted market data");
        record
    }

    async fn news(&self, symbol: &str, count: usize) -> Result<Vec<NewsArticle>> {
        self.client.news(symbol, count).await
    }
}

/// Build the record from fetched payloads, one dataset per category
fn assemble(symbol: &str, payloads: &Payloads) -> SymbolRecord {
    let mut record = SymbolRecord::new(symbol);
    for category in Category::ALL {
        let dataset = match build(category, payloads) {
            Ok(dataset) => dataset,
            Err(reason) => {
                warn!(symbol, category = category.as_str(), reason = %reason, "Data unavailable, storing empty table");
                Dataset::empty()
            },
        };
        record.push(category.as_str(), dataset);
    }
    record
}

fn build(category: Category, p: &Payloads) -> std::result::Result<Dataset, String> {
    match category {
        Category::Info => derive(&p.summary, tables::info),
        Category::History => derive(&p.history, |bars| Some(tables::history(bars))),
        Category::HistoryMetadata => derive(&p.chart, tables::history_metadata),
        Category::Actions => derive(&p.chart, |chart| Some(tables::actions(chart))),
        Category::Dividends => derive(&p.chart, |chart| Some(tables::dividends(chart))),
        Category::Splits => derive(&p.chart, |chart| Some(tables::splits(chart))),
        Category::CapitalGains => derive(&p.chart, |chart| Some(tables::capital_gains(chart))),
        Category::Shares => derive(&p.summary, tables::shares),
        Category::IncomeStmt => statement(p, "incomeStatementHistory", "incomeStatementHistory"),
        Category::QuarterlyIncomeStmt => {
            statement(p, "incomeStatementHistoryQuarterly", "incomeStatementHistory")
        },
        Category::BalanceSheet => statement(p, "balanceSheetHistory", "balanceSheetStatements"),
        Category::QuarterlyBalanceSheet => {
            statement(p, "balanceSheetHistoryQuarterly", "balanceSheetStatements")
        },
        Category::Cashflow => statement(p, "cashflowStatementHistory", "cashflowStatements"),
        Category::QuarterlyCashflow => {
            statement(p, "cashflowStatementHistoryQuarterly", "cashflowStatements")
        },
        Category::MajorHolders => {
            derive(&p.summary, |s| tables::key_value(s.get("majorHoldersBreakdown"), None))
        },
        Category::InstitutionalHolders => {
            list(p, "institutionOwnership", "ownershipList", tables::INSTITUTIONAL_HOLDERS)
        },
        Category::MutualfundHolders => {
            list(p, "fundOwnership", "ownershipList", tables::INSTITUTIONAL_HOLDERS)
        },
        Category::InsiderTransactions => {
            list(p, "insiderTransactions", "transactions", tables::INSIDER_TRANSACTIONS)
        },
        Category::InsiderPurchases => {
            derive(&p.summary, |s| tables::key_value(s.get("netSharePurchaseActivity"), None))
        },
        Category::InsiderRosterHolders => list(p, "insiderHolders", "holders", tables::INSIDER_ROSTER),
        Category::Sustainability => derive(&p.summary, |s| tables::key_value(s.get("esgScores"), None)),
        Category::Recommendations => list(p, "recommendationTrend", "trend", tables::RECOMMENDATIONS),
        Category::RecommendationsSummary => derive(&p.summary, tables::recommendations_summary),
        Category::UpgradesDowngrades => {
            list(p, "upgradeDowngradeHistory", "history", tables::UPGRADES_DOWNGRADES)
        },
        Category::EarningsDates => derive(&p.summary, tables::earnings_dates),
        Category::Identifiers => derive(&p.summary, |s| tables::key_value(s.get("quoteType"), None)),
        Category::Options => derive(&p.expirations, |dates| Some(tables::options(dates))),
        Category::News => derive(&p.news, |articles| Some(tables::news(articles))),
    }
}

fn derive<T>(
    payload: &Result<T>,
    convert: impl FnOnce(&T) -> Option<Dataset>,
) -> std::result::Result<Dataset, String> {
    match payload {
        Ok(value) => convert(value).ok_or_else(|| "not present in response".to_string()),
        Err(e) => Err(e.to_string()),
    }
}

fn statement(p: &Payloads, module: &str, list_key: &str) -> std::result::Result<Dataset, String> {
    derive(&p.summary, |s| tables::statement(s, module, list_key))
}

fn list(p: &Payloads, module: &str, list_key: &str, fields: &[Field]) -> std::result::Result<Dataset, String> {
    derive(&p.summary, |s| tables::list_table(s, module, list_key, fields))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::InsightsError;
    use crate::record::Table;
    use serde_json::json;

    fn payloads() -> Payloads {
        Payloads {
            summary: Ok(json!({
                "price": { "symbol": "AAPL", "longName": "Apple Inc." },
                "quoteType": { "symbol": "AAPL", "quoteType": "EQUITY", "exchange": "NMS" },
                "recommendationTrend": { "trend": [{ "period": "0m", "strongBuy": 10, "buy": 20, "hold": 5, "sell": 1, "strongSell": 0 }] }
            })),
            history: Ok(vec![PriceBar {
                date: "2024-01-02".into(),
                open: 187.15,
                high: 188.44,
                low: 183.89,
                close: 185.64,
                adj_close: 184.94,
                volume: 82_488_700,
            }]),
            chart: Err(InsightsError::YahooFinance("HTTP 500".into())),
            expirations: Ok(vec![1_737_072_000]),
            news: Ok(Vec::new()),
        }
    }

    #[test]
    fn test_assemble_keeps_every_category_in_order() {
        let record = assemble("AAPL", &payloads());
        let names: Vec<&str> = record.datasets.iter().map(|(c, _)| c.as_str()).collect();
        let expected: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(names, expected);
        assert_eq!(record.symbol, "AAPL");
    }

    #[test]
    fn test_failed_payload_becomes_empty_table() {
        let record = assemble("AAPL", &payloads());
        assert_eq!(record.get("dividends"), Some(&Dataset::empty()));
        assert_eq!(record.get("history_metadata"), Some(&Dataset::empty()));
        // module missing from the summary
        assert_eq!(record.get("income_stmt"), Some(&Dataset::empty()));
    }

    #[test]
    fn test_available_payloads_converted() {
        let record = assemble("AAPL", &payloads());

        let Some(Dataset::Table(history)) = record.get("history") else {
            panic!("expected history table");
        };
        assert_eq!(history.columns[5], "Adj Close");
        assert_eq!(history.rows[0][6], json!(82_488_700));

        let Some(Dataset::KeyValue(identifiers)) = record.get("identifiers") else {
            panic!("expected identifiers");
        };
        assert!(identifiers.contains(&("exchange".to_string(), json!("NMS"))));

        assert_eq!(
            record.get("options"),
            Some(&Dataset::Sequence(vec![json!("2025-01-17")]))
        );
        assert!(matches!(record.get("recommendations"), Some(Dataset::Table(Table { rows, .. })) if rows.len() == 1));
        assert!(matches!(record.get("news"), Some(Dataset::Table(t)) if t.rows.is_empty() && t.columns.len() == 5));
    }

    #[tokio::test]
    #[ignore] // Requires network access
    async fn test_extract_live() {
        let source = YahooMarketData::new(&InsightsConfig::default()).unwrap();
        let today = chrono::Utc::now().date_naive();
        let range = DateRange::resolve(today.checked_sub_days(chrono::Days::new(30)), Some(today), today).unwrap();

        let record = source.extract("AAPL", &range).await;
        assert_eq!(record.datasets.len(), Category::ALL.len());
        assert!(matches!(record.get("history"), Some(Dataset::Table(t)) if !t.rows.is_empty()));
    }
}
