//! Extracted market data, one dataset per category

use serde::Serialize;
use serde_json::Value;

/// A rectangular table of JSON cells
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Table {
    /// Create a table from column names and rows
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// A table with no columns and no rows
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}

/// The shape a single extracted category arrives in
///
/// The extractor decides the shape, so the store never has to guess a
/// container type at write time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", content = "data", rename_all = "snake_case")]
pub enum Dataset {
    /// Tabular data, one row per observation
    Table(Table),
    /// Flat key/value blob such as a company profile
    KeyValue(Vec<(String, Value)>),
    /// List blob such as option expiration dates
    Sequence(Vec<Value>),
    /// Single scalar string
    Text(String),
}

impl Dataset {
    /// Placeholder for a category whose backing data was unavailable
    pub fn empty() -> Self {
        Dataset::Table(Table::empty())
    }

    /// Coerce into a table, naming single-column shapes after `category`
    pub fn into_table(self, category: &str) -> Table {
        match self {
            Dataset::Table(table) => table,
            Dataset::KeyValue(entries) => Table::new(
                vec!["Key".to_string(), "Value".to_string()],
                entries
                    .into_iter()
                    .map(|(key, value)| vec![Value::String(key), value])
                    .collect(),
            ),
            Dataset::Sequence(values) => Table::new(
                vec![category.to_string()],
                values.into_iter().map(|value| vec![value]).collect(),
            ),
            Dataset::Text(text) => {
                Table::new(vec![category.to_string()], vec![vec![Value::String(text)]])
            },
        }
    }
}

/// Everything extracted for one ticker symbol, in category order
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SymbolRecord {
    pub symbol: String,
    pub datasets: Vec<(String, Dataset)>,
}

impl SymbolRecord {
    pub fn new(symbol: impl Into<String>) -> Self {
        Self {
            symbol: symbol.into(),
            datasets: Vec::new(),
        }
    }

    /// Append a dataset under `category`
    pub fn push(&mut self, category: impl Into<String>, dataset: Dataset) {
        self.datasets.push((category.into(), dataset));
    }

    /// Look up a dataset by category
    pub fn get(&self, category: &str) -> Option<&Dataset> {
        self.datasets
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, dataset)| dataset)
    }
}
