//! Conversions from Yahoo Finance payloads to datasets
//!
//! quoteSummary wraps numbers as `{"raw": 1.5, "fmt": "1.50"}`; cells keep
//! the raw value, and dates keep the formatted one.

use crate::api::yahoo::epoch_date;
use crate::api::{NewsArticle, PriceBar};
use crate::record::{Dataset, Table};
use serde_json::{Value, json};
use std::collections::{BTreeMap, HashSet};

/// quoteSummary modules requested in one call per symbol
pub const SUMMARY_MODULES: &[&str] = &[
    "assetProfile",
    "summaryDetail",
    "price",
    "defaultKeyStatistics",
    "financialData",
    "quoteType",
    "incomeStatementHistory",
    "incomeStatementHistoryQuarterly",
    "balanceSheetHistory",
    "balanceSheetHistoryQuarterly",
    "cashflowStatementHistory",
    "cashflowStatementHistoryQuarterly",
    "majorHoldersBreakdown",
    "institutionOwnership",
    "fundOwnership",
    "insiderTransactions",
    "netSharePurchaseActivity",
    "insiderHolders",
    "esgScores",
    "recommendationTrend",
    "upgradeDowngradeHistory",
    "earningsHistory",
    "calendarEvents",
];

const INFO_MODULES: &[&str] = &[
    "assetProfile",
    "summaryDetail",
    "price",
    "defaultKeyStatistics",
    "financialData",
];

const SHARE_KEYS: &[&str] = &[
    "sharesOutstanding",
    "floatShares",
    "impliedSharesOutstanding",
    "sharesShort",
    "sharesShortPriorMonth",
    "sharesPercentSharesOut",
];

const RECOMMENDATION_SUMMARY_KEYS: &[&str] = &[
    "recommendationKey",
    "recommendationMean",
    "numberOfAnalystOpinions",
    "currentPrice",
    "targetHighPrice",
    "targetLowPrice",
    "targetMeanPrice",
    "targetMedianPrice",
];

/// How one column is read from a list item
#[derive(Clone, Copy)]
pub enum Field {
    /// Raw value of `key`
    Raw(&'static str, &'static str),
    /// `key` rendered as a `YYYY-MM-DD` date
    Date(&'static str, &'static str),
}

impl Field {
    fn header(self) -> &'static str {
        match self {
            Field::Raw(header, _) | Field::Date(header, _) => header,
        }
    }

    fn read(self, item: &Value) -> Value {
        match self {
            Field::Raw(_, key) => item.get(key).map_or(Value::Null, raw_value),
            Field::Date(_, key) => item.get(key).map_or(Value::Null, date_value),
        }
    }
}

pub const INSTITUTIONAL_HOLDERS: &[Field] = &[
    Field::Date("Date Reported", "reportDate"),
    Field::Raw("Holder", "organization"),
    Field::Raw("pctHeld", "pctHeld"),
    Field::Raw("Shares", "position"),
    Field::Raw("Value", "value"),
    Field::Raw("pctChange", "pctChange"),
];

pub const INSIDER_TRANSACTIONS: &[Field] = &[
    Field::Date("Start Date", "startDate"),
    Field::Raw("Insider", "filerName"),
    Field::Raw("Position", "filerRelation"),
    Field::Raw("Transaction", "transactionText"),
    Field::Raw("Text", "moneyText"),
    Field::Raw("Shares", "shares"),
    Field::Raw("Value", "value"),
    Field::Raw("Ownership", "ownership"),
];

pub const INSIDER_ROSTER: &[Field] = &[
    Field::Raw("Name", "name"),
    Field::Raw("Position", "relation"),
    Field::Raw("URL", "url"),
    Field::Raw("Most Recent Transaction", "transactionDescription"),
    Field::Date("Latest Transaction Date", "latestTransDate"),
    Field::Raw("Shares Owned Directly", "positionDirect"),
    Field::Date("Position Direct Date", "positionDirectDate"),
];

pub const RECOMMENDATIONS: &[Field] = &[
    Field::Raw("period", "period"),
    Field::Raw("strongBuy", "strongBuy"),
    Field::Raw("buy", "buy"),
    Field::Raw("hold", "hold"),
    Field::Raw("sell", "sell"),
    Field::Raw("strongSell", "strongSell"),
];

pub const UPGRADES_DOWNGRADES: &[Field] = &[
    Field::Date("GradeDate", "epochGradeDate"),
    Field::Raw("Firm", "firm"),
    Field::Raw("ToGrade", "toGrade"),
    Field::Raw("FromGrade", "fromGrade"),
    Field::Raw("Action", "action"),
];

pub const EARNINGS_HISTORY: &[Field] = &[
    Field::Date("Earnings Date", "quarter"),
    Field::Raw("EPS Estimate", "epsEstimate"),
    Field::Raw("Reported EPS", "epsActual"),
    Field::Raw("Surprise(%)", "surprisePercent"),
];

/// Unwrap a quoteSummary number to its raw value
pub fn raw_value(value: &Value) -> Value {
    match value {
        Value::Object(map) if map.contains_key("raw") => map["raw"].clone(),
        Value::Object(map) if map.contains_key("fmt") => map["fmt"].clone(),
        Value::Object(map) if map.is_empty() => Value::Null,
        other => other.clone(),
    }
}

/// Render a quoteSummary date (`{raw, fmt}`, epoch seconds or string)
pub fn date_value(value: &Value) -> Value {
    match value {
        Value::Object(map) => match (map.get("fmt"), map.get("raw")) {
            (Some(Value::String(fmt)), _) => Value::String(fmt.clone()),
            (_, Some(raw)) => date_value(raw),
            _ => Value::Null,
        },
        Value::Number(number) => number
            .as_i64()
            .and_then(epoch_date)
            .map_or(Value::Null, Value::String),
        other => other.clone(),
    }
}

/// Flat key/value view of one object, optionally restricted to `keys`
pub fn key_value(object: Option<&Value>, keys: Option<&[&str]>) -> Option<Dataset> {
    let map = object?.as_object()?;
    let entries: Vec<(String, Value)> = match keys {
        Some(keys) => keys
            .iter()
            .filter_map(|key| map.get(*key).map(|v| ((*key).to_string(), raw_value(v))))
            .collect(),
        None => map
            .iter()
            .filter(|(key, _)| key.as_str() != "maxAge")
            .map(|(key, v)| (key.clone(), raw_value(v)))
            .collect(),
    };
    (!entries.is_empty()).then_some(Dataset::KeyValue(entries))
}

/// Company profile merged from several quoteSummary modules
pub fn info(summary: &Value) -> Option<Dataset> {
    let mut seen = HashSet::new();
    let mut entries = Vec::new();
    for module in INFO_MODULES {
        let Some(map) = summary.get(*module).and_then(Value::as_object) else {
            continue;
        };
        for (key, value) in map {
            if key != "maxAge" && seen.insert(key.clone()) {
                entries.push((key.clone(), raw_value(value)));
            }
        }
    }
    (!entries.is_empty()).then_some(Dataset::KeyValue(entries))
}

pub fn shares(summary: &Value) -> Option<Dataset> {
    key_value(summary.get("defaultKeyStatistics"), Some(SHARE_KEYS))
}

pub fn recommendations_summary(summary: &Value) -> Option<Dataset> {
    key_value(summary.get("financialData"), Some(RECOMMENDATION_SUMMARY_KEYS))
}

/// Financial statement with one row per reporting date
pub fn statement(summary: &Value, module: &str, list_key: &str) -> Option<Dataset> {
    let statements = summary.get(module)?.get(list_key)?.as_array()?;

    let mut columns: Vec<String> = Vec::new();
    for item in statements.iter().filter_map(Value::as_object) {
        for key in item.keys() {
            if key != "maxAge" && key != "endDate" && !columns.contains(key) {
                columns.push(key.clone());
            }
        }
    }

    let rows = statements
        .iter()
        .map(|item| {
            let mut row = vec![item.get("endDate").map_or(Value::Null, date_value)];
            row.extend(columns.iter().map(|c| item.get(c).map_or(Value::Null, raw_value)));
            row
        })
        .collect();

    let mut header = vec!["Date".to_string()];
    header.extend(columns);
    Some(Dataset::Table(Table::new(header, rows)))
}

/// Table built from a list inside a quoteSummary module
pub fn list_table(summary: &Value, module: &str, list_key: &str, fields: &[Field]) -> Option<Dataset> {
    let items = summary.get(module)?.get(list_key)?.as_array()?;
    Some(Dataset::Table(records_table(items, fields)))
}

fn records_table(items: &[Value], fields: &[Field]) -> Table {
    Table::new(
        fields.iter().map(|f| f.header().to_string()).collect(),
        items
            .iter()
            .map(|item| fields.iter().map(|f| f.read(item)).collect())
            .collect(),
    )
}

/// Reported earnings plus upcoming earnings dates
pub fn earnings_dates(summary: &Value) -> Option<Dataset> {
    let reported = summary
        .get("earningsHistory")
        .and_then(|m| m.get("history"))
        .and_then(Value::as_array);
    let upcoming = summary
        .get("calendarEvents")
        .and_then(|m| m.get("earnings"))
        .and_then(|m| m.get("earningsDate"))
        .and_then(Value::as_array);
    if reported.is_none() && upcoming.is_none() {
        return None;
    }

    let mut table = records_table(reported.map_or(&[][..], Vec::as_slice), EARNINGS_HISTORY);
    for date in upcoming.into_iter().flatten() {
        let mut row = vec![Value::Null; EARNINGS_HISTORY.len()];
        row[0] = date_value(date);
        table.rows.push(row);
    }
    Some(Dataset::Table(table))
}

pub fn history(bars: &[PriceBar]) -> Dataset {
    Dataset::Table(Table::new(
        ["Date", "Open", "High", "Low", "Close", "Adj Close", "Volume"]
            .iter()
            .map(ToString::to_string)
            .collect(),
        bars.iter()
            .map(|bar| {
                vec![
                    json!(bar.date),
                    json!(bar.open),
                    json!(bar.high),
                    json!(bar.low),
                    json!(bar.close),
                    json!(bar.adj_close),
                    json!(bar.volume),
                ]
            })
            .collect(),
    ))
}

pub fn history_metadata(chart: &Value) -> Option<Dataset> {
    key_value(chart.get("meta"), None)
}

/// Chart events of one kind, sorted by date
fn events<'a>(chart: &'a Value, kind: &str) -> Vec<&'a Value> {
    let mut items: Vec<&Value> = chart
        .get("events")
        .and_then(|e| e.get(kind))
        .and_then(Value::as_object)
        .map(|map| map.values().collect())
        .unwrap_or_default();
    items.sort_by_key(|event| event["date"].as_i64().unwrap_or_default());
    items
}

fn event_date(event: &Value) -> Value {
    date_value(&event["date"])
}

fn split_ratio(event: &Value) -> Option<f64> {
    let numerator = event["numerator"].as_f64()?;
    let denominator = event["denominator"].as_f64()?;
    (denominator != 0.0).then(|| numerator / denominator)
}

pub fn dividends(chart: &Value) -> Dataset {
    Dataset::Table(Table::new(
        vec!["Date".into(), "Dividends".into()],
        events(chart, "dividends")
            .into_iter()
            .map(|e| vec![event_date(e), e["amount"].clone()])
            .collect(),
    ))
}

pub fn splits(chart: &Value) -> Dataset {
    Dataset::Table(Table::new(
        vec!["Date".into(), "Stock Splits".into()],
        events(chart, "splits")
            .into_iter()
            .map(|e| vec![event_date(e), json!(split_ratio(e))])
            .collect(),
    ))
}

pub fn capital_gains(chart: &Value) -> Dataset {
    Dataset::Table(Table::new(
        vec!["Date".into(), "Capital Gains".into()],
        events(chart, "capitalGains")
            .into_iter()
            .map(|e| vec![event_date(e), e["amount"].clone()])
            .collect(),
    ))
}

/// Dividends and splits on one timeline, zero where nothing happened
pub fn actions(chart: &Value) -> Dataset {
    let mut timeline: BTreeMap<String, (f64, f64)> = BTreeMap::new();
    for event in events(chart, "dividends") {
        if let Value::String(date) = event_date(event) {
            timeline.entry(date).or_default().0 += event["amount"].as_f64().unwrap_or_default();
        }
    }
    for event in events(chart, "splits") {
        if let Value::String(date) = event_date(event) {
            timeline.entry(date).or_default().1 = split_ratio(event).unwrap_or_default();
        }
    }

    Dataset::Table(Table::new(
        vec!["Date".into(), "Dividends".into(), "Stock Splits".into()],
        timeline
            .into_iter()
            .map(|(date, (dividend, split))| vec![json!(date), json!(dividend), json!(split)])
            .collect(),
    ))
}

pub fn options(expirations: &[i64]) -> Dataset {
    Dataset::Sequence(
        expirations
            .iter()
            .filter_map(|secs| epoch_date(*secs))
            .map(Value::String)
            .collect(),
    )
}

pub fn news(articles: &[NewsArticle]) -> Dataset {
    Dataset::Table(Table::new(
        ["title", "publisher", "link", "published_at", "related_tickers"]
            .iter()
            .map(ToString::to_string)
            .collect(),
        articles
            .iter()
            .map(|a| {
                vec![
                    json!(a.title),
                    json!(a.publisher),
                    json!(a.link),
                    json!(a.published_at),
                    json!(a.related_tickers),
                ]
            })
            .collect(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary() -> Value {
        json!({
            "price": { "maxAge": 1, "symbol": "AAPL", "currency": "ignored", "regularMarketPrice": { "raw": 190.5, "fmt": "190.50" } },
            "assetProfile": { "sector": "Technology", "companyOfficers": [{ "name": "Tim Cook" }] },
            "summaryDetail": { "currency": "USD", "beta": { "raw": 1.25, "fmt": "1.25" } },
            "incomeStatementHistory": {
                "incomeStatementHistory": [
                    { "maxAge": 1, "endDate": { "raw": 1_727_654_400, "fmt": "2024-09-30" }, "totalRevenue": { "raw": 391_035, "fmt": "391B" }, "netIncome": { "raw": 93_736 } },
                    { "endDate": { "raw": 1_696_032_000, "fmt": "2023-09-30" }, "totalRevenue": { "raw": 383_285 }, "grossProfit": {} }
                ]
            },
            "institutionOwnership": {
                "ownershipList": [
                    { "reportDate": { "raw": 1_719_705_600, "fmt": "2024-06-30" }, "organization": "Vanguard", "pctHeld": { "raw": 0.0889 }, "position": { "raw": 1_000 }, "value": { "raw": 5 } }
                ]
            },
            "earningsHistory": {
                "history": [{ "quarter": { "raw": 1_719_705_600, "fmt": "2024-06-30" }, "epsEstimate": { "raw": 1.35 }, "epsActual": { "raw": 1.4 }, "surprisePercent": { "raw": 0.037 } }]
            },
            "calendarEvents": { "earnings": { "earningsDate": [{ "raw": 1_730_332_800, "fmt": "2024-10-31" }] } }
        })
    }

    fn chart() -> Value {
        json!({
            "meta": { "currency": "USD", "symbol": "AAPL", "currentTradingPeriod": { "regular": { "timezone": "EST" } } },
            "events": {
                "dividends": {
                    "1723204800": { "amount": 0.25, "date": 1_723_204_800 },
                    "1715347800": { "amount": 0.25, "date": 1_715_347_800 }
                },
                "splits": {
                    "1598880600": { "date": 1_598_880_600, "numerator": 4, "denominator": 1, "splitRatio": "4:1" }
                }
            }
        })
    }

    #[test]
    fn test_info_merges_modules_first_wins() {
        let Some(Dataset::KeyValue(entries)) = info(&summary()) else {
            panic!("expected key/value info");
        };
        let map: BTreeMap<_, _> = entries.into_iter().collect();

        assert_eq!(map["symbol"], json!("AAPL"));
        assert_eq!(map["regularMarketPrice"], json!(190.5));
        assert_eq!(map["beta"], json!(1.25));
        assert_eq!(map["currency"], json!("USD"));
        assert_eq!(map["companyOfficers"], json!([{ "name": "Tim Cook" }]));
        assert!(!map.contains_key("maxAge"));
    }

    #[test]
    fn test_statement_is_transposed() {
        let Some(Dataset::Table(table)) = statement(&summary(), "incomeStatementHistory", "incomeStatementHistory") else {
            panic!("expected statement table");
        };

        assert_eq!(table.columns.len(), 4);
        assert_eq!(table.columns[0], "Date");
        let column = |name: &str| table.columns.iter().position(|c| c == name).unwrap();

        assert_eq!(table.rows[0][0], json!("2024-09-30"));
        assert_eq!(table.rows[0][column("totalRevenue")], json!(391_035));
        assert_eq!(table.rows[0][column("grossProfit")], Value::Null);
        assert_eq!(table.rows[1][0], json!("2023-09-30"));
        assert_eq!(table.rows[1][column("netIncome")], Value::Null);
        assert_eq!(table.rows[1][column("totalRevenue")], json!(383_285));
        assert!(statement(&summary(), "balanceSheetHistory", "balanceSheetStatements").is_none());
    }

    #[test]
    fn test_list_table_fields() {
        let Some(Dataset::Table(table)) = list_table(&summary(), "institutionOwnership", "ownershipList", INSTITUTIONAL_HOLDERS) else {
            panic!("expected holders table");
        };
        assert_eq!(table.columns[0], "Date Reported");
        assert_eq!(
            table.rows[0],
            vec![json!("2024-06-30"), json!("Vanguard"), json!(0.0889), json!(1_000), json!(5), Value::Null]
        );
    }

    #[test]
    fn test_earnings_dates_include_upcoming() {
        let Some(Dataset::Table(table)) = earnings_dates(&summary()) else {
            panic!("expected earnings table");
        };
        assert_eq!(table.rows.len(), 2);
        assert_eq!(table.rows[0][2], json!(1.4));
        assert_eq!(table.rows[1][0], json!("2024-10-31"));
        assert_eq!(table.rows[1][1], Value::Null);

        assert!(earnings_dates(&json!({})).is_none());
    }

    #[test]
    fn test_chart_events() {
        let Dataset::Table(dividends) = dividends(&chart()) else {
            panic!("expected table");
        };
        assert_eq!(
            dividends.rows,
            vec![
                vec![json!("2024-05-10"), json!(0.25)],
                vec![json!("2024-08-09"), json!(0.25)],
            ]
        );

        let Dataset::Table(splits) = splits(&chart()) else {
            panic!("expected table");
        };
        assert_eq!(splits.columns, vec!["Date", "Stock Splits"]);
        assert_eq!(splits.rows, vec![vec![json!("2020-08-31"), json!(4.0)]]);

        let Dataset::Table(actions) = actions(&chart()) else {
            panic!("expected table");
        };
        assert_eq!(actions.rows.len(), 3);
        assert_eq!(actions.rows[0], vec![json!("2020-08-31"), json!(0.0), json!(4.0)]);

        let Dataset::Table(gains) = capital_gains(&chart()) else {
            panic!("expected table");
        };
        assert!(gains.rows.is_empty());
        assert_eq!(gains.columns.len(), 2);
    }

    #[test]
    fn test_history_metadata_keeps_nested_objects() {
        let Some(Dataset::KeyValue(entries)) = history_metadata(&chart()) else {
            panic!("expected key/value metadata");
        };
        let period = entries.iter().find(|(k, _)| k == "currentTradingPeriod").unwrap();
        assert!(period.1.is_object());
    }

    #[test]
    fn test_options_as_dates() {
        assert_eq!(
            options(&[1_737_072_000]),
            Dataset::Sequence(vec![json!("2025-01-17")])
        );
    }

    #[test]
    fn test_raw_and_date_values() {
        assert_eq!(raw_value(&json!({ "raw": 2, "fmt": "2" })), json!(2));
        assert_eq!(raw_value(&json!({ "fmt": "n/a" })), json!("n/a"));
        assert_eq!(raw_value(&json!({})), Value::Null);
        assert_eq!(raw_value(&json!("Buy")), json!("Buy"));

        assert_eq!(date_value(&json!(1_704_153_600)), json!("2024-01-02"));
        assert_eq!(date_value(&json!({ "raw": 1_704_153_600 })), json!("2024-01-02"));
        assert_eq!(date_value(&json!("2024-Q1")), json!("2024-Q1"));
    }
}
