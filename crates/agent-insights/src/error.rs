//! Error types for the stock database pipeline

use agent_llm::LLMError;
use agent_prompt::PromptError;
use thiserror::Error;

/// Errors raised by extraction, storage and LLM query operations
#[derive(Debug, Error)]
pub enum InsightsError {
    /// Date range rejected before any network or store access
    #[error("Invalid date range: {0}")]
    InvalidRange(String),

    /// A dataset could not be turned into a relational table
    #[error("Unsupported data type in field '{field}' of {symbol}: {detail}")]
    UnsupportedDataType {
        symbol: String,
        field: String,
        detail: String,
    },

    /// The completion contained no fenced SQL block
    #[error("No SQL code found in LLM generation")]
    NoQueryFound,

    /// Structured output could not be decoded
    #[error("Failed to parse structured response: {0}")]
    ResponseParse(String),

    /// An argument had the wrong JSON shape
    #[error("TypeError: {0}")]
    TypeError(String),

    /// An argument had the right shape but an unacceptable value
    #[error("ValueError: {0}")]
    ValueError(String),

    /// SQLite error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Yahoo Finance API error
    #[error("Yahoo Finance error: {0}")]
    YahooFinance(String),

    /// Network or HTTP error
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Completion service error
    #[error("LLM error: {0}")]
    Llm(LLMError),

    /// Prompt rendering error
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Filesystem error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for insights operations
pub type Result<T> = std::result::Result<T, InsightsError>;

impl From<LLMError> for InsightsError {
    fn from(err: LLMError) -> Self {
        match err {
            LLMError::ResponseParse(detail) => InsightsError::ResponseParse(detail),
            other => InsightsError::Llm(other),
        }
    }
}

/// Convert InsightsError to agent_core::Error
impl From<InsightsError> for agent_core::Error {
    fn from(err: InsightsError) -> Self {
        agent_core::Error::ProcessingFailed(err.to_string())
    }
}
