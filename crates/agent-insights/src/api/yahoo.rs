//! Yahoo Finance API client
//!
//! Price history goes through `yahoo_finance_api`. The remaining endpoints
//! (quoteSummary modules, chart events, option expirations, news search) are
//! plain JSON over `reqwest`; the authenticated ones need a session cookie
//! and the crumb token issued for it.

use crate::error::{InsightsError, Result};
use chrono::{DateTime, Utc};
use reqwest::header::{COOKIE, SET_COOKIE};
use reqwest::{Client, StatusCode, Url};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use tracing::{debug, instrument};
use yahoo_finance_api as yahoo;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";
const COOKIE_URL: &str = "https://fc.yahoo.com";
const CRUMB_URL: &str = "https://query1.finance.yahoo.com/v1/test/getcrumb";
const QUERY_BASE: &str = "https://query1.finance.yahoo.com";

/// One daily price bar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBar {
    pub date: String,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub adj_close: f64,
    pub volume: u64,
}

/// A news article returned by the Yahoo Finance search endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsArticle {
    pub title: String,
    pub publisher: Option<String>,
    pub link: String,
    /// Publish time, RFC 3339
    pub published_at: Option<String>,
    #[serde(default)]
    pub related_tickers: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    news: Vec<RawNews>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawNews {
    title: String,
    publisher: Option<String>,
    link: String,
    provider_publish_time: Option<i64>,
    #[serde(default)]
    related_tickers: Vec<String>,
}

#[derive(Debug, Clone)]
struct Crumb {
    cookie: String,
    crumb: String,
}

/// Yahoo Finance API client
pub struct YahooFinanceClient {
    http: Client,
    crumb: RwLock<Option<Crumb>>,
}

impl YahooFinanceClient {
    /// Create a client whose requests time out after `timeout`
    pub fn new(timeout: Duration) -> Result<Self> {
        let http = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            http,
            crumb: RwLock::new(None),
        })
    }

    async fn crumb(&self) -> Result<Crumb> {
        if let Some(crumb) = self.crumb.read().await.as_ref() {
            return Ok(crumb.clone());
        }

        let fresh = self.fetch_crumb().await?;
        *self.crumb.write().await = Some(fresh.clone());
        Ok(fresh)
    }

    async fn fetch_crumb(&self) -> Result<Crumb> {
        // fc.yahoo.com answers 404 but still sets the session cookie
        let response = self.http.get(COOKIE_URL).send().await?;
        let cookie = response
            .headers()
            .get(SET_COOKIE)
            .and_then(|h| h.to_str().ok())
            .and_then(|s| s.split(';').next())
            .map(str::to_string)
            .ok_or_else(|| InsightsError::YahooFinance("Failed to parse Yahoo cookie".to_string()))?;

        let crumb = self
            .http
            .get(CRUMB_URL)
            .header(COOKIE, &cookie)
            .send()
            .await?
            .error_for_status()?
            .text()
            .await?;
        if crumb.is_empty() || crumb.contains('<') {
            return Err(InsightsError::YahooFinance("Yahoo returned an invalid crumb".to_string()));
        }

        debug!("Obtained Yahoo crumb");
        Ok(Crumb { cookie, crumb })
    }

    async fn get_json(&self, mut url: Url, authenticated: bool) -> Result<Value> {
        let mut cookie = None;
        if authenticated {
            let crumb = self.crumb().await?;
            url.query_pairs_mut().append_pair("crumb", &crumb.crumb);
            cookie = Some(crumb.cookie);
        }

        let path = url.path().to_string();
        let mut request = self.http.get(url);
        if let Some(cookie) = cookie {
            request = request.header(COOKIE, cookie);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == StatusCode::UNAUTHORIZED {
            *self.crumb.write().await = None;
            return Err(InsightsError::YahooFinance(format!(
                "Unauthorized request to {path}, crumb cleared"
            )));
        }
        if !status.is_success() {
            return Err(InsightsError::YahooFinance(format!("HTTP {status} from {path}")));
        }

        Ok(response.json::<Value>().await?)
    }

    /// Fetch quoteSummary modules for a symbol
    ///
    /// Returns the single result object keyed by module name.
    #[instrument(skip(self, modules))]
    pub async fn quote_summary(&self, symbol: &str, modules: &[&str]) -> Result<Value> {
        let mut url = endpoint(&["v10", "finance", "quoteSummary", symbol])?;
        url.query_pairs_mut().append_pair("modules", &modules.join(","));

        let body = self.get_json(url, true).await?;
        first_result(&body, "quoteSummary")
    }

    /// Fetch the daily chart for a range, including dividend, split and
    /// capital gain events
    #[instrument(skip(self))]
    pub async fn chart(&self, symbol: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Value> {
        let mut url = endpoint(&["v8", "finance", "chart", symbol])?;
        url.query_pairs_mut()
            .append_pair("period1", &start.timestamp().to_string())
            .append_pair("period2", &end.timestamp().to_string())
            .append_pair("interval", "1d")
            .append_pair("events", "div,splits,capitalGains");

        let body = self.get_json(url, false).await?;
        first_result(&body, "chart")
    }

    /// Option expiration dates as unix timestamps
    #[instrument(skip(self))]
    pub async fn option_expirations(&self, symbol: &str) -> Result<Vec<i64>> {
        let url = endpoint(&["v7", "finance", "options", symbol])?;
        let body = self.get_json(url, true).await?;
        let result = first_result(&body, "optionChain")?;

        Ok(result["expirationDates"]
            .as_array()
            .map(|dates| dates.iter().filter_map(Value::as_i64).collect())
            .unwrap_or_default())
    }

    /// Recent news articles mentioning a symbol
    #[instrument(skip(self))]
    pub async fn news(&self, symbol: &str, count: usize) -> Result<Vec<NewsArticle>> {
        let mut url = endpoint(&["v1", "finance", "search"])?;
        url.query_pairs_mut()
            .append_pair("q", symbol)
            .append_pair("quotesCount", "0")
            .append_pair("newsCount", &count.to_string());

        let body = self.get_json(url, false).await?;
        parse_news(body)
    }

    /// Daily price history between two instants
    #[instrument(skip(self))]
    pub async fn history(&self, symbol: &str, start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Vec<PriceBar>> {
        let provider = yahoo::YahooConnector::new()
            .map_err(|e| InsightsError::YahooFinance(e.to_string()))?;

        let start_odt = OffsetDateTime::from_unix_timestamp(start.timestamp())
            .map_err(|e| InsightsError::YahooFinance(format!("Invalid start timestamp: {e}")))?;
        let end_odt = OffsetDateTime::from_unix_timestamp(end.timestamp())
            .map_err(|e| InsightsError::YahooFinance(format!("Invalid end timestamp: {e}")))?;

        let response = provider
            .get_quote_history(symbol, start_odt, end_odt)
            .await
            .map_err(|e| InsightsError::YahooFinance(e.to_string()))?;

        let quotes = response
            .quotes()
            .map_err(|e| InsightsError::YahooFinance(e.to_string()))?;

        Ok(quotes
            .iter()
            .map(|q| PriceBar {
                date: epoch_date(q.timestamp as i64).unwrap_or_default(),
                open: q.open,
                high: q.high,
                low: q.low,
                close: q.close,
                adj_close: q.adjclose,
                volume: q.volume,
            })
            .collect())
    }
}

/// Format a unix timestamp as `YYYY-MM-DD`
pub fn epoch_date(secs: i64) -> Option<String> {
    DateTime::from_timestamp(secs, 0).map(|d| d.format("%Y-%m-%d").to_string())
}

fn endpoint(segments: &[&str]) -> Result<Url> {
    let mut url = Url::parse(QUERY_BASE).map_err(|e| InsightsError::YahooFinance(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|()| InsightsError::YahooFinance(format!("{QUERY_BASE} cannot be a base URL")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

/// Unwrap the `{root: {result: [..], error}}` envelope used by Yahoo
fn first_result(body: &Value, root: &str) -> Result<Value> {
    let envelope = &body[root];
    if let Some(error) = envelope.get("error").filter(|e| !e.is_null()) {
        let description = error["description"]
            .as_str()
            .map_or_else(|| error.to_string(), str::to_string);
        return Err(InsightsError::YahooFinance(description));
    }

    match envelope["result"].get(0) {
        Some(result) if !result.is_null() => Ok(result.clone()),
        _ => Err(InsightsError::YahooFinance(format!("Empty {root} response"))),
    }
}

fn parse_news(body: Value) -> Result<Vec<NewsArticle>> {
    let response: SearchResponse = serde_json::from_value(body)?;
    Ok(response
        .news
        .into_iter()
        .map(|raw| NewsArticle {
            title: raw.title,
            publisher: raw.publisher,
            link: raw.link,
            published_at: raw
                .provider_publish_time
                .and_then(|secs| DateTime::from_timestamp(secs, 0))
                .map(|d| d.to_rfc3339()),
            related_tickers: raw.related_tickers,
        })
        .collect())
}
