//! Configuration for the stock database pipeline

use crate::error::{InsightsError, Result};
use agent_utils::AppConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Configuration for extraction, storage and LLM query operations
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightsConfig {
    /// Completion model name
    pub model: String,

    /// Maximum tokens per completion
    pub max_tokens: usize,

    /// Sampling temperature for completions
    pub temperature: f32,

    /// SQLite file holding the stock tables
    pub database_path: PathBuf,

    /// Rows of each table shown to the model in dataframe chat
    pub dataframe_row_limit: usize,

    /// News articles fetched per symbol
    pub news_count: usize,

    /// Request timeout for market data endpoints
    pub request_timeout: Duration,
}

impl Default for InsightsConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1024,
            temperature: 0.0,
            database_path: PathBuf::from("cache/sources/stock_database.db"),
            dataframe_row_limit: 50,
            news_count: 10,
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl InsightsConfig {
    /// Create a new configuration builder
    pub fn builder() -> InsightsConfigBuilder {
        InsightsConfigBuilder::default()
    }

    /// Take the relevant sections of the application config file
    pub fn from_app_config(app: &AppConfig) -> Result<Self> {
        Self::builder()
            .model(app.llm.model.clone())
            .max_tokens(app.llm.max_tokens)
            .temperature(app.llm.temperature)
            .database_path(app.database.path.clone())
            .dataframe_row_limit(app.database.dataframe_row_limit)
            .news_count(app.market_data.news_count)
            .request_timeout(Duration::from_secs(app.market_data.request_timeout_secs))
            .build()
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.model.trim().is_empty() {
            return Err(InsightsError::Config("model must not be empty".to_string()));
        }

        if self.max_tokens == 0 {
            return Err(InsightsError::Config(
                "max_tokens must be greater than 0".to_string(),
            ));
        }

        if self.dataframe_row_limit == 0 {
            return Err(InsightsError::Config(
                "dataframe_row_limit must be greater than 0".to_string(),
            ));
        }

        if self.request_timeout.is_zero() {
            return Err(InsightsError::Config(
                "request_timeout must be greater than 0".to_string(),
            ));
        }

        Ok(())
    }
}

/// Builder for InsightsConfig
#[derive(Debug, Default)]
pub struct InsightsConfigBuilder {
    model: Option<String>,
    max_tokens: Option<usize>,
    temperature: Option<f32>,
    database_path: Option<PathBuf>,
    dataframe_row_limit: Option<usize>,
    news_count: Option<usize>,
    request_timeout: Option<Duration>,
}

impl InsightsConfigBuilder {
    pub fn model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn max_tokens(mut self, max_tokens: usize) -> Self {
        self.max_tokens = Some(max_tokens);
        self
    }

    pub fn temperature(mut self, temperature: f32) -> Self {
        self.temperature = Some(temperature);
        self
    }

    /// Set the SQLite file location
    pub fn database_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.database_path = Some(path.into());
        self
    }

    pub fn dataframe_row_limit(mut self, limit: usize) -> Self {
        self.dataframe_row_limit = Some(limit);
        self
    }

    pub fn news_count(mut self, count: usize) -> Self {
        self.news_count = Some(count);
        self
    }

    /// Set request timeout
    pub fn request_timeout(mut self, duration: Duration) -> Self {
        self.request_timeout = Some(duration);
        self
    }

    /// Build the configuration
    pub fn build(self) -> Result<InsightsConfig> {
        let defaults = InsightsConfig::default();

        let config = InsightsConfig {
            model: self.model.unwrap_or(defaults.model),
            max_tokens: self.max_tokens.unwrap_or(defaults.max_tokens),
            temperature: self.temperature.unwrap_or(defaults.temperature),
            database_path: self.database_path.unwrap_or(defaults.database_path),
            dataframe_row_limit: self.dataframe_row_limit.unwrap_or(defaults.dataframe_row_limit),
            news_count: self.news_count.unwrap_or(defaults.news_count),
            request_timeout: self.request_timeout.unwrap_or(defaults.request_timeout),
        };

        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = InsightsConfig::default();
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.dataframe_row_limit, 50);
        assert_eq!(
            config.database_path,
            PathBuf::from("cache/sources/stock_database.db")
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_builder() {
        let config = InsightsConfig::builder()
            .database_path("/tmp/stocks.db")
            .news_count(3)
            .build()
            .unwrap();

        assert_eq!(config.database_path, PathBuf::from("/tmp/stocks.db"));
        assert_eq!(config.news_count, 3);
        assert_eq!(config.max_tokens, 1024);
    }

    #[test]
    fn test_validation() {
        let result = InsightsConfig::builder().dataframe_row_limit(0).build();
        assert!(matches!(result, Err(InsightsError::Config(_))));

        let result = InsightsConfig::builder().model("  ").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_from_app_config() {
        let app = AppConfig::from_yaml(
            "llm:\n  model: gpt-4o\ndatabase:\n  path: data/stocks.db\nmarket_data:\n  news_count: 5\n",
        )
        .unwrap();
        let config = InsightsConfig::from_app_config(&app).unwrap();

        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.database_path, PathBuf::from("data/stocks.db"));
        assert_eq!(config.news_count, 5);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
    }
}
