//! Error types shared by every tool-facing crate

use thiserror::Error;

/// Result type alias for agent-core
pub type Result<T> = std::result::Result<T, Error>;

/// Error surfaced to the orchestration layer that invokes tools
///
/// Domain crates keep their own error enums and convert into this type at
/// the tool boundary, so a caller only ever sees user-visible text.
#[derive(Error, Debug)]
pub enum Error {
    /// Generic error message
    #[error("{0}")]
    Generic(String),

    /// No tool is registered under the requested name
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    /// Tool arguments did not match the tool's input contract
    #[error("Invalid arguments for '{tool}': {detail}")]
    InvalidArguments { tool: String, detail: String },

    /// Tool processing failed
    #[error("Tool processing failed: {0}")]
    ProcessingFailed(String),
}

impl Error {
    /// Build an [`Error::InvalidArguments`] for the named tool
    pub fn invalid_arguments(tool: impl Into<String>, detail: impl ToString) -> Self {
        Self::InvalidArguments {
            tool: tool.into(),
            detail: detail.to_string(),
        }
    }
}
