//! Market data extraction
//!
//! A [`MarketDataSource`] turns a ticker symbol and a date range into a
//! [`SymbolRecord`] holding one [`Dataset`](crate::record::Dataset) per
//! [`Category`]. Extraction never fails as a whole: a category whose data
//! cannot be fetched is recorded as an empty table.

mod tables;
mod yahoo;

pub use yahoo::YahooMarketData;

use crate::api::NewsArticle;
use crate::error::{InsightsError, Result};
use crate::record::SymbolRecord;
use async_trait::async_trait;
use chrono::{DateTime, Days, NaiveDate, NaiveTime, Utc};
use serde::Serialize;

/// Longest span, in days, a single extraction may cover
pub const MAX_RANGE_DAYS: u64 = 365;

/// Validated calendar range, end date inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DateRange {
    start: NaiveDate,
    end: NaiveDate,
}

impl DateRange {
    /// Accept `start..=end` when it is ordered and spans at most a year
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self> {
        if start > end {
            return Err(InsightsError::InvalidRange(format!(
                "start date {start} is after end date {end}"
            )));
        }

        let span = (end - start).num_days();
        if span > MAX_RANGE_DAYS as i64 {
            return Err(InsightsError::InvalidRange(format!(
                "{start} to {end} spans {span} days, at most {MAX_RANGE_DAYS} are allowed"
            )));
        }

        Ok(Self { start, end })
    }

    /// Fill in missing bounds: end defaults to `today`, start to a year before end
    pub fn resolve(start: Option<NaiveDate>, end: Option<NaiveDate>, today: NaiveDate) -> Result<Self> {
        let end = end.unwrap_or(today);
        let start = start.unwrap_or_else(|| {
            end.checked_sub_days(Days::new(MAX_RANGE_DAYS))
                .unwrap_or(NaiveDate::MIN)
        });
        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDate {
        self.start
    }

    pub fn end(&self) -> NaiveDate {
        self.end
    }

    /// UTC instants covering the whole range: start midnight to the
    /// midnight after the end date
    pub fn bounds(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let after_end = self.end.checked_add_days(Days::new(1)).unwrap_or(self.end);
        (
            self.start.and_time(NaiveTime::MIN).and_utc(),
            after_end.and_time(NaiveTime::MIN).and_utc(),
        )
    }
}

/// Extracted data categories, in extraction order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
    Info,
    History,
    HistoryMetadata,
    Actions,
    Dividends,
    Splits,
    CapitalGains,
    Shares,
    IncomeStmt,
    QuarterlyIncomeStmt,
    BalanceSheet,
    QuarterlyBalanceSheet,
    Cashflow,
    QuarterlyCashflow,
    MajorHolders,
    InstitutionalHolders,
    MutualfundHolders,
    InsiderTransactions,
    InsiderPurchases,
    InsiderRosterHolders,
    Sustainability,
    Recommendations,
    RecommendationsSummary,
    UpgradesDowngrades,
    EarningsDates,
    Identifiers,
    Options,
    News,
}

impl Category {
    pub const ALL: [Category; 28] = [
        Category::Info,
        Category::History,
        Category::HistoryMetadata,
        Category::Actions,
        Category::Dividends,
        Category::Splits,
        Category::CapitalGains,
        Category::Shares,
        Category::IncomeStmt,
        Category::QuarterlyIncomeStmt,
        Category::BalanceSheet,
        Category::QuarterlyBalanceSheet,
        Category::Cashflow,
        Category::QuarterlyCashflow,
        Category::MajorHolders,
        Category::InstitutionalHolders,
        Category::MutualfundHolders,
        Category::InsiderTransactions,
        Category::InsiderPurchases,
        Category::InsiderRosterHolders,
        Category::Sustainability,
        Category::Recommendations,
        Category::RecommendationsSummary,
        Category::UpgradesDowngrades,
        Category::EarningsDates,
        Category::Identifiers,
        Category::Options,
        Category::News,
    ];

    /// Category name, also the suffix of the stored table name
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Info => "info",
            Category::History => "history",
            Category::HistoryMetadata => "history_metadata",
            Category::Actions => "actions",
            Category::Dividends => "dividends",
            Category::Splits => "splits",
            Category::CapitalGains => "capital_gains",
            Category::Shares => "shares",
            Category::IncomeStmt => "income_stmt",
            Category::QuarterlyIncomeStmt => "quarterly_income_stmt",
            Category::BalanceSheet => "balance_sheet",
            Category::QuarterlyBalanceSheet => "quarterly_balance_sheet",
            Category::Cashflow => "cashflow",
            Category::QuarterlyCashflow => "quarterly_cashflow",
            Category::MajorHolders => "major_holders",
            Category::InstitutionalHolders => "institutional_holders",
            Category::MutualfundHolders => "mutualfund_holders",
            Category::InsiderTransactions => "insider_transactions",
            Category::InsiderPurchases => "insider_purchases",
            Category::InsiderRosterHolders => "insider_roster_holders",
            Category::Sustainability => "sustainability",
            Category::Recommendations => "recommendations",
            Category::RecommendationsSummary => "recommendations_summary",
            Category::UpgradesDowngrades => "upgrades_downgrades",
            Category::EarningsDates => "earnings_dates",
            Category::Identifiers => "identifiers",
            Category::Options => "options",
            Category::News => "news",
        }
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Source of per-symbol market data and news
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Extract every category for `symbol` over `range`
    async fn extract(&self, symbol: &str, range: &DateRange) -> SymbolRecord;

    /// Recent news for `symbol`, newest first
    async fn news(&self, symbol: &str, count: usize) -> Result<Vec<NewsArticle>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_range_accepts_a_year() {
        let range = DateRange::new(date(2023, 1, 1), date(2024, 1, 1)).unwrap();
        assert_eq!(range.start(), date(2023, 1, 1));
        assert_eq!(range.end(), date(2024, 1, 1));

        assert!(DateRange::new(date(2024, 3, 1), date(2024, 3, 1)).is_ok());
    }

    #[test]
    fn test_range_rejects_reversed_or_long() {
        let err = DateRange::new(date(2024, 2, 1), date(2024, 1, 1)).unwrap_err();
        assert!(matches!(err, InsightsError::InvalidRange(_)));

        let err = DateRange::new(date(2023, 1, 1), date(2024, 1, 2)).unwrap_err();
        assert!(err.to_string().contains("366 days"));
    }

    #[test]
    fn test_resolve_defaults() {
        let today = date(2024, 6, 30);
        let range = DateRange::resolve(None, None, today).unwrap();
        assert_eq!(range.end(), today);
        assert_eq!(range.start(), date(2023, 7, 1));

        let range = DateRange::resolve(Some(date(2024, 6, 1)), None, today).unwrap();
        assert_eq!(range.start(), date(2024, 6, 1));

        assert!(DateRange::resolve(Some(date(2020, 1, 1)), None, today).is_err());
    }

    #[test]
    fn test_bounds_cover_end_date() {
        let range = DateRange::new(date(2024, 1, 1), date(2024, 1, 31)).unwrap();
        let (start, end) = range.bounds();
        assert_eq!(start.to_rfc3339(), "2024-01-01T00:00:00+00:00");
        assert_eq!(end.to_rfc3339(), "2024-02-01T00:00:00+00:00");
    }

    #[test]
    fn test_categories_unique() {
        let names: std::collections::HashSet<_> = Category::ALL.iter().map(|c| c.as_str()).collect();
        assert_eq!(names.len(), Category::ALL.len());
        assert_eq!(Category::ALL[0].to_string(), "info");
        assert_eq!(Category::ALL[27].to_string(), "news");
    }
}
