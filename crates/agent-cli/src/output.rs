//! Terminal rendering of command results

use agent_insights::{QueryRows, SqlQueryResponse, StatementOutcome, TableAnswer};
use agent_tools::ToolDescriptor;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use serde_json::Value;
use std::collections::BTreeMap;

pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL).set_content_arrangement(ContentArrangement::Dynamic);
    table
}

pub fn rows_table(rows: &QueryRows) -> Table {
    let mut table = new_table();
    table.set_header(rows.columns.clone());
    for row in &rows.rows {
        table.add_row(row.iter().map(cell_text).collect::<Vec<_>>());
    }
    table
}

pub fn table_map_table(tables: &BTreeMap<String, Vec<String>>) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Symbol", "Tables"]);
    for (symbol, names) in tables {
        table.add_row(vec![symbol.clone(), names.join("\n")]);
    }
    table
}

pub fn tools_table(descriptors: &[ToolDescriptor]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Tool", "Description"]);
    for descriptor in descriptors {
        table.add_row(vec![descriptor.name.clone(), descriptor.description.clone()]);
    }
    table
}

pub fn print_sql_response(response: &SqlQueryResponse) {
    for (query, outcome) in response.queries.iter().zip(&response.results) {
        println!("{query}");
        match outcome {
            StatementOutcome::Rows(rows) => println!("{}", rows_table(rows)),
            StatementOutcome::Error { message } => println!("Error: {message}"),
        }
        println!();
    }
}

pub fn print_table_answers(answers: &BTreeMap<String, Vec<TableAnswer>>) {
    for (symbol, table_answers) in answers {
        if table_answers.is_empty() {
            println!("{symbol}: no relevant tables found\n");
        }
        for answer in table_answers {
            println!("[{symbol}] {}\n{}\n", answer.table, answer.answer);
        }
    }
}

pub fn print_sources(urls: &[String]) {
    if urls.is_empty() {
        return;
    }
    println!("\nSources:");
    for url in urls {
        println!("  {url}");
    }
}
