//! Shared utilities for the financial insights workspace
//!
//! This crate provides logging setup and the YAML application configuration
//! consumed by the binaries.

pub mod config;
pub mod logging;

pub use config::{
    AppConfig, ConfigError, DatabaseSettings, EmbeddingSettings, LlmSettings, MarketDataSettings,
    RagSettings, RetrievalSettings,
};
pub use logging::{LogFormat, init_tracing, init_tracing_with};
