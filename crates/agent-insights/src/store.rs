//! SQLite stock database
//!
//! Each `(symbol, category)` pair becomes one table named
//! `{symbol}_{category}`. Writes replace whole tables; reads used for
//! LLM-generated SQL go through a read-only connection whose authorizer only
//! lets the statement see the tables selected for the request.

use crate::error::{InsightsError, Result};
use crate::record::{SymbolRecord, Table};
use rusqlite::hooks::{AuthAction, AuthContext, Authorization};
use rusqlite::types::Value as SqlValue;
use rusqlite::{Connection, OpenFlags, params_from_iter};
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Rows returned by a query, cells decoded back to JSON
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

/// Result of running one SQL statement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StatementOutcome {
    Rows(QueryRows),
    Error { message: String },
}

impl StatementOutcome {
    pub fn is_error(&self) -> bool {
        matches!(self, StatementOutcome::Error { .. })
    }
}

impl fmt::Display for StatementOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatementOutcome::Rows(rows) => {
                let rendered = serde_json::to_string(&rows.rows).map_err(|_| fmt::Error)?;
                f.write_str(&rendered)
            },
            StatementOutcome::Error { message } => write!(f, "Error: {message}"),
        }
    }
}

/// Handle to the SQLite file holding extracted market data
#[derive(Debug, Clone)]
pub struct StockDatabase {
    path: PathBuf,
}

/// A table ready to be written: validated, sanitized, converted to SQL values
struct PreparedTable {
    name: String,
    columns: Vec<(String, &'static str)>,
    rows: Vec<Vec<SqlValue>>,
}

impl StockDatabase {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn ensure_db_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }
        Ok(())
    }

    fn open(&self) -> Result<Connection> {
        self.ensure_db_dir()?;
        Ok(Connection::open(&self.path)?)
    }

    fn open_read_only(&self) -> Result<Connection> {
        Ok(Connection::open_with_flags(
            &self.path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?)
    }

    /// Write every dataset of every record as its own table
    ///
    /// All datasets are validated before the first write, so a shape error
    /// leaves the store untouched. Returns the stored table names per symbol
    /// in write order; datasets without columns are skipped.
    pub fn store_records(&self, records: Vec<SymbolRecord>) -> Result<BTreeMap<String, Vec<String>>> {
        let mut prepared = Vec::with_capacity(records.len());
        for record in records {
            let mut tables = Vec::new();
            for (category, dataset) in record.datasets {
                let table = dataset.into_table(&category);
                match prepare_table(&record.symbol, &category, table)? {
                    Some(table) => tables.push(table),
                    None => debug!(symbol = %record.symbol, category = %category, "Skipping empty dataset"),
                }
            }
            prepared.push((record.symbol, tables));
        }

        let mut conn = self.open()?;
        let mut stored: BTreeMap<String, Vec<String>> = BTreeMap::new();
        for (symbol, tables) in prepared {
            let names = stored.entry(symbol.clone()).or_default();
            for table in tables {
                write_table(&mut conn, &table)?;
                info!(symbol = %symbol, table = %table.name, rows = table.rows.len(), "Stored table");
                if !names.contains(&table.name) {
                    names.push(table.name);
                }
            }
        }
        Ok(stored)
    }

    /// Names of all user tables, sorted
    pub fn list_tables(&self) -> Result<Vec<String>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(
            "SELECT name FROM sqlite_master WHERE type = 'table' AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = stmt
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(names)
    }

    /// Column names of a table in declaration order; empty when it does not exist
    pub fn table_columns(&self, table: &str) -> Result<Vec<String>> {
        let conn = self.open()?;
        let mut stmt = conn.prepare(&format!("PRAGMA table_info({})", quote_ident(table)))?;
        let columns = stmt
            .query_map([], |row| row.get::<_, String>(1))?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }

    /// Load up to `limit` rows of a table
    pub fn read_table(&self, table: &str, limit: usize) -> Result<QueryRows> {
        let conn = self.open()?;
        let sql = format!("SELECT * FROM {} LIMIT ?1", quote_ident(table));
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        query_rows(&conn, &sql, &[SqlValue::Integer(limit)])
    }

    /// Run one statement against a read-only view limited to `allowed_tables`
    ///
    /// Failures are reported in the outcome rather than returned, so a batch
    /// of statements can keep going after one of them fails.
    pub fn execute_statement(&self, sql: &str, allowed_tables: &[String]) -> StatementOutcome {
        match self.run_restricted(sql, allowed_tables) {
            Ok(rows) => {
                info!(rows = rows.rows.len(), "Executed statement");
                StatementOutcome::Rows(rows)
            },
            Err(e) => {
                debug!(error = %e, "Statement failed");
                StatementOutcome::Error {
                    message: e.to_string(),
                }
            },
        }
    }

    fn run_restricted(&self, sql: &str, allowed_tables: &[String]) -> Result<QueryRows> {
        let conn = self.open_read_only()?;
        let allowed: HashSet<String> = allowed_tables.iter().map(|t| t.to_lowercase()).collect();
        conn.authorizer(Some(move |ctx: AuthContext<'_>| match ctx.action {
            AuthAction::Read { table_name, .. } => {
                if allowed.contains(&table_name.to_lowercase()) {
                    Authorization::Allow
                } else {
                    Authorization::Deny
                }
            },
            AuthAction::Pragma { .. } | AuthAction::Attach { .. } => Authorization::Deny,
            _ => Authorization::Allow,
        }));
        query_rows(&conn, sql, &[])
    }
}

/// Table name for a symbol's category
pub fn table_name(symbol: &str, category: &str) -> String {
    format!("{}_{}", symbol.trim().replace(' ', "_").to_lowercase(), category)
}

/// Make column names usable as SQL identifiers and unique within the table
pub fn sanitize_columns(columns: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    columns
        .iter()
        .enumerate()
        .map(|(index, column)| {
            let mut base = column.split_whitespace().collect::<Vec<_>>().join("_");
            if base.is_empty() {
                base = format!("column_{index}");
            }
            let mut name = base.clone();
            let mut suffix = 1;
            // SQLite compares column names case-insensitively
            while !seen.insert(name.to_lowercase()) {
                name = format!("{base}_{suffix}");
                suffix += 1;
            }
            name
        })
        .collect()
}

fn prepare_table(symbol: &str, category: &str, table: Table) -> Result<Option<PreparedTable>> {
    let width = table.columns.len();
    if let Some((index, row)) = table.rows.iter().enumerate().find(|(_, row)| row.len() != width) {
        return Err(InsightsError::UnsupportedDataType {
            symbol: symbol.to_string(),
            field: category.to_string(),
            detail: format!("row {index} has {} cells, expected {width}", row.len()),
        });
    }
    if width == 0 {
        return Ok(None);
    }

    let rows: Vec<Vec<SqlValue>> = table
        .rows
        .into_iter()
        .map(|row| row.into_iter().map(cell_to_sql).collect())
        .collect();
    let columns = sanitize_columns(&table.columns)
        .into_iter()
        .enumerate()
        .map(|(index, name)| (name, column_affinity(&rows, index)))
        .collect();

    Ok(Some(PreparedTable {
        name: table_name(symbol, category),
        columns,
        rows,
    }))
}

fn write_table(conn: &mut Connection, table: &PreparedTable) -> Result<()> {
    let ident = quote_ident(&table.name);
    let column_defs = table
        .columns
        .iter()
        .map(|(name, affinity)| format!("{} {affinity}", quote_ident(name)))
        .collect::<Vec<_>>()
        .join(", ");
    let placeholders = vec!["?"; table.columns.len()].join(", ");

    let tx = conn.transaction()?;
    tx.execute(&format!("DROP TABLE IF EXISTS {ident}"), [])?;
    tx.execute(&format!("CREATE TABLE {ident} ({column_defs})"), [])?;
    {
        let mut insert = tx.prepare(&format!("INSERT INTO {ident} VALUES ({placeholders})"))?;
        for row in &table.rows {
            insert.execute(params_from_iter(row.iter()))?;
        }
    }
    tx.commit()?;
    Ok(())
}

fn query_rows(conn: &Connection, sql: &str, params: &[SqlValue]) -> Result<QueryRows> {
    let mut stmt = conn.prepare(sql)?;
    let columns: Vec<String> = stmt.column_names().iter().map(ToString::to_string).collect();

    let mut rows = stmt.query(params_from_iter(params.iter()))?;
    let mut result = Vec::new();
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(columns.len());
        for index in 0..columns.len() {
            cells.push(json_value_from_sql(row.get::<usize, SqlValue>(index)?));
        }
        result.push(cells);
    }

    Ok(QueryRows {
        columns,
        rows: result,
    })
}

fn cell_to_sql(value: Value) -> SqlValue {
    match value {
        Value::Null => SqlValue::Null,
        Value::Bool(flag) => SqlValue::Integer(i64::from(flag)),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                SqlValue::Integer(int)
            } else if let Some(float) = number.as_f64() {
                SqlValue::Real(float)
            } else {
                SqlValue::Text(number.to_string())
            }
        },
        Value::String(text) => SqlValue::Text(text),
        nested @ (Value::Array(_) | Value::Object(_)) => SqlValue::Text(nested.to_string()),
    }
}

fn column_affinity(rows: &[Vec<SqlValue>], index: usize) -> &'static str {
    let mut affinity = None;
    for cell in rows.iter().filter_map(|row| row.get(index)) {
        affinity = match (affinity, cell) {
            (_, SqlValue::Null) => affinity,
            (None | Some("INTEGER"), SqlValue::Integer(_)) => Some("INTEGER"),
            (None | Some("INTEGER" | "REAL"), SqlValue::Real(_)) | (Some("REAL"), SqlValue::Integer(_)) => {
                Some("REAL")
            },
            _ => return "TEXT",
        };
    }
    affinity.unwrap_or("TEXT")
}

fn json_value_from_sql(value: SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(value) => Value::from(value),
        SqlValue::Real(value) => Value::from(value),
        SqlValue::Text(value) => Value::String(value),
        SqlValue::Blob(bytes) => Value::String(bytes.iter().map(|b| format!("{b:02x}")).collect()),
    }
}

fn quote_ident(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
