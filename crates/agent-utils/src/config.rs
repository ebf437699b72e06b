//! Application configuration loaded from a YAML file
//!
//! String values may reference environment variables with `${VAR}`; they are
//! resolved after parsing, so comments and keys are never touched.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::LazyLock;
use thiserror::Error;

static ENV_REFERENCE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\$\{([A-Za-z_][A-Za-z0-9_]*)\}").expect("valid env reference pattern")
});

/// Errors raised while loading configuration
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The file could not be read
    #[error("Failed to read config file '{path}': {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The YAML document is malformed or has the wrong shape
    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A `${VAR}` reference names a variable that is not set
    #[error("Environment variable not found: {0}")]
    EnvVarNotFound(String),

    /// A value is out of its accepted range
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration loading
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Root configuration document
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Text-completion service
    pub llm: LlmSettings,
    /// Relational store holding per-symbol tables
    pub database: DatabaseSettings,
    /// Market data provider access
    pub market_data: MarketDataSettings,
    /// Document retrieval
    pub rag: RagSettings,
}

/// Settings for the OpenAI-compatible completion endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmSettings {
    pub api_base: String,
    pub api_key: Option<String>,
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub timeout_secs: u64,
}

impl Default for LlmSettings {
    fn default() -> Self {
        Self {
            api_base: "https://api.openai.com/v1".to_string(),
            api_key: None,
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1024,
            temperature: 0.0,
            timeout_secs: 120,
        }
    }
}

/// Settings for the SQLite file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    pub path: PathBuf,
    /// Rows of a table shown to the completion service by dataframe chat
    pub dataframe_row_limit: usize,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            path: PathBuf::from("cache/sources/stock_database.db"),
            dataframe_row_limit: 50,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketDataSettings {
    pub request_timeout_secs: u64,
    /// Articles requested per symbol from the news search
    pub news_count: usize,
}

impl Default for MarketDataSettings {
    fn default() -> Self {
        Self {
            request_timeout_secs: 30,
            news_count: 10,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    pub embedding_model: EmbeddingSettings,
    pub retrieval: RetrievalSettings,
}

/// Embedding backend selection
///
/// `kind` is kept as free text: an unknown backend is rejected when the
/// model is loaded, not when the file is parsed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbeddingSettings {
    #[serde(rename = "type")]
    pub kind: String,
    pub batch_size: usize,
    pub model: String,
    /// Vector width of the local embedder
    pub dimensions: usize,
    /// Endpoint of the remote service; falls back to `llm.api_base`
    pub api_base: Option<String>,
    /// Key of the remote service; falls back to `llm.api_key`
    pub api_key: Option<String>,
}

impl Default for EmbeddingSettings {
    fn default() -> Self {
        Self {
            kind: "cpu".to_string(),
            batch_size: 16,
            model: "text-embedding-3-small".to_string(),
            dimensions: 384,
            api_base: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrievalSettings {
    pub k_retrieved_documents: usize,
}

impl Default for RetrievalSettings {
    fn default() -> Self {
        Self {
            k_retrieved_documents: 3,
        }
    }
}

impl AppConfig {
    /// Load configuration from a YAML file
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use agent_utils::AppConfig;
    /// let config = AppConfig::from_file("config.yaml")?;
    /// # Ok::<(), agent_utils::ConfigError>(())
    /// ```
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Parse configuration from YAML text, resolving `${VAR}` references
    pub fn from_yaml(content: &str) -> Result<Self> {
        let mut document: serde_yaml::Value = serde_yaml::from_str(content)?;
        if document.is_null() {
            document = serde_yaml::Value::Mapping(serde_yaml::Mapping::new());
        }
        resolve_env_values(&mut document)?;

        let config: Self = serde_yaml::from_value(document)?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.rag.retrieval.k_retrieved_documents == 0 {
            return Err(ConfigError::Invalid(
                "rag.retrieval.k_retrieved_documents must be a positive integer".to_string(),
            ));
        }
        if self.rag.embedding_model.batch_size == 0 {
            return Err(ConfigError::Invalid(
                "rag.embedding_model.batch_size must be greater than 0".to_string(),
            ));
        }
        if self.llm.max_tokens == 0 {
            return Err(ConfigError::Invalid(
                "llm.max_tokens must be greater than 0".to_string(),
            ));
        }
        if self.database.dataframe_row_limit == 0 {
            return Err(ConfigError::Invalid(
                "database.dataframe_row_limit must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }
}

fn resolve_env_values(value: &mut serde_yaml::Value) -> Result<()> {
    match value {
        serde_yaml::Value::String(s) => {
            *s = resolve_env_string(s)?;
        }
        serde_yaml::Value::Sequence(items) => {
            for item in items {
                resolve_env_values(item)?;
            }
        }
        serde_yaml::Value::Mapping(map) => {
            for (_, item) in map.iter_mut() {
                resolve_env_values(item)?;
            }
        }
        _ => {}
    }
    Ok(())
}

/// Replace every `${VAR}` in `s` with the value of the environment variable
pub fn resolve_env_string(s: &str) -> Result<String> {
    let mut result = s.to_string();
    for cap in ENV_REFERENCE.captures_iter(s) {
        let var_name = &cap[1];
        let value =
            std::env::var(var_name).map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;
        result = result.replace(&cap[0], &value);
    }
    Ok(result)
}
