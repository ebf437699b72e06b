//! Table schema summaries used as LLM context

use crate::error::Result;
use crate::store::StockDatabase;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Table name mapped to its comma-separated column names
pub type SchemaSummary = BTreeMap<String, String>;

/// The symbol part of a stored table name
pub fn table_symbol(table: &str) -> String {
    table.split('_').next().unwrap_or_default().to_lowercase()
}

/// Summaries of every stored table belonging to one of `symbols`
pub fn table_summaries_from_symbols(db: &StockDatabase, symbols: &[String]) -> Result<SchemaSummary> {
    let wanted: HashSet<String> = symbols.iter().map(|s| s.trim().to_lowercase()).collect();

    let mut summary = SchemaSummary::new();
    for table in db.list_tables()? {
        if wanted.contains(&table_symbol(&table)) {
            let columns = db.table_columns(&table)?;
            summary.insert(table, columns.join(", "));
        }
    }
    Ok(summary)
}

/// Map requested table names onto the names stored in the database
///
/// Matching ignores case, as SQLite does. Unknown names are dropped and a
/// table requested twice appears once, in first-request order.
pub fn resolve_table_names(db: &StockDatabase, names: &[String]) -> Result<Vec<String>> {
    let stored: HashMap<String, String> = db
        .list_tables()?
        .into_iter()
        .map(|table| (table.to_lowercase(), table))
        .collect();

    let mut resolved: Vec<String> = Vec::new();
    for name in names {
        if let Some(table) = stored
            .get(&name.trim().to_lowercase())
            .filter(|table| !resolved.contains(*table))
        {
            resolved.push(table.clone());
        }
    }
    Ok(resolved)
}

/// Summaries of the named tables
///
/// Names invented by the completion service drop out here; the rest are
/// keyed by their stored spelling.
pub fn table_summaries_from_names(db: &StockDatabase, names: &[String]) -> Result<SchemaSummary> {
    let mut summary = SchemaSummary::new();
    for table in resolve_table_names(db, names)? {
        let columns = db.table_columns(&table)?;
        summary.insert(table, columns.join(", "));
    }
    Ok(summary)
}

/// Render a summary as the JSON object placed in prompts
pub fn summary_json(summary: &SchemaSummary) -> Result<String> {
    Ok(serde_json::to_string(summary)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Dataset, SymbolRecord, Table};
    use serde_json::json;

    fn seeded() -> (tempfile::TempDir, StockDatabase) {
        let dir = tempfile::tempdir().unwrap();
        let db = StockDatabase::new(dir.path().join("stock.db"));

        let records = ["AAPL", "MSFT"]
            .iter()
            .map(|symbol| {
                let mut record = SymbolRecord::new(*symbol);
                record.push(
                    "history",
                    Dataset::Table(Table::new(
                        vec!["Date".into(), "Close".into()],
                        vec![vec![json!("2024-01-02"), json!(1.0)]],
                    )),
                );
                record.push("info", Dataset::KeyValue(vec![("sector".into(), json!("Tech"))]));
                record
            })
            .collect();
        db.store_records(records).unwrap();
        (dir, db)
    }

    #[test]
    fn test_from_symbols_filters_by_symbol() {
        let (_dir, db) = seeded();
        let summary = table_summaries_from_symbols(&db, &["aapl".to_string()]).unwrap();

        assert_eq!(summary.len(), 2);
        assert_eq!(summary["aapl_history"], "Date, Close");
        assert_eq!(summary["aapl_info"], "Key, Value");
        assert!(summary.keys().all(|t| table_symbol(t) == "aapl"));
    }

    #[test]
    fn test_from_symbols_no_match_is_empty() {
        let (_dir, db) = seeded();
        let summary = table_summaries_from_symbols(&db, &["TSLA".to_string()]).unwrap();
        assert!(summary.is_empty());
    }

    #[test]
    fn test_from_names_drops_unknown_tables() {
        let (_dir, db) = seeded();
        let names = vec![
            "msft_history".to_string(),
            "msft_dividends".to_string(),
            "tsla_history".to_string(),
        ];
        let summary = table_summaries_from_names(&db, &names).unwrap();

        assert_eq!(summary.keys().collect::<Vec<_>>(), vec!["msft_history"]);
    }

    #[test]
    fn test_from_names_ignores_case() {
        let (_dir, db) = seeded();
        let names = vec![
            "AAPL_history".to_string(),
            "aapl_History".to_string(),
            " Msft_Info ".to_string(),
        ];
        let summary = table_summaries_from_names(&db, &names).unwrap();

        assert_eq!(summary.keys().collect::<Vec<_>>(), vec!["aapl_history", "msft_info"]);
        assert_eq!(summary["aapl_history"], "Date, Close");
    }

    #[test]
    fn test_resolve_table_names_keeps_request_order() {
        let (_dir, db) = seeded();
        let names = vec!["MSFT_INFO".to_string(), "tsla_info".to_string(), "aapl_history".to_string()];

        assert_eq!(
            resolve_table_names(&db, &names).unwrap(),
            vec!["msft_info", "aapl_history"]
        );
    }

    #[test]
    fn test_summary_json() {
        let mut summary = SchemaSummary::new();
        summary.insert("aapl_history".into(), "Date, Close".into());
        assert_eq!(summary_json(&summary).unwrap(), r#"{"aapl_history":"Date, Close"}"#);
    }
}
