//! Command-line arguments

use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Configuration file read when `--config` is not given, if present
pub const DEFAULT_CONFIG_PATH: &str = "config.yaml";

#[derive(Debug, Parser)]
#[command(name = "fin-insights")]
#[command(about = "Financial insights from market data, news and documents", long_about = None)]
pub struct Cli {
    /// YAML configuration file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Fetch market data for symbols and store it in the stock database
    CreateDb {
        /// Ticker symbols, comma separated
        #[arg(short, long, value_delimiter = ',', required = true)]
        symbols: Vec<String>,
        /// First day of price history (YYYY-MM-DD), defaults to a year before the end
        #[arg(long)]
        start: Option<NaiveDate>,
        /// Last day of price history (YYYY-MM-DD), defaults to today
        #[arg(long)]
        end: Option<NaiveDate>,
    },
    /// Ask a question about stored symbols
    Query {
        /// Question to answer
        request: String,
        /// Ticker symbols whose tables may be used
        #[arg(short, long, value_delimiter = ',', required = true)]
        symbols: Vec<String>,
        /// text-to-SQL or dataframe-chat
        #[arg(short, long, default_value = "text-to-SQL")]
        method: String,
    },
    /// Answer a question from recent news about the companies it mentions
    News {
        /// Question to answer
        question: String,
    },
    /// Answer a question from a JSON file of documents
    Qa {
        /// Question to answer
        question: String,
        /// JSON list of {"page_content", "metadata"} objects
        #[arg(short, long)]
        documents: PathBuf,
    },
    /// List the available tools
    Tools,
    /// Invoke a tool with JSON arguments
    Invoke {
        /// Tool name
        name: String,
        /// Arguments as a JSON object
        #[arg(short, long, default_value = "{}")]
        args: String,
    },
}
