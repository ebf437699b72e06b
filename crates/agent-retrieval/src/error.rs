//! Error types for the retrieval QA pipeline

use agent_llm::LLMError;
use agent_prompt::PromptError;
use thiserror::Error;

/// Errors that can occur while answering from documents
#[derive(Error, Debug)]
pub enum RetrievalError {
    /// An argument has the wrong type
    #[error("TypeError: {0}")]
    TypeError(String),

    /// An argument or setting has an unsupported value
    #[error("ValueError: {0}")]
    ValueError(String),

    /// The document index could not be built
    #[error("Could not instantiate the vector store: {0}")]
    VectorStore(String),

    /// The request could not be embedded
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Completion service error
    #[error("LLM error: {0}")]
    Llm(#[from] LLMError),

    /// Prompt rendering error
    #[error("Prompt error: {0}")]
    Prompt(#[from] PromptError),
}

/// Result type alias for retrieval operations
pub type Result<T> = std::result::Result<T, RetrievalError>;

impl From<RetrievalError> for agent_core::Error {
    fn from(err: RetrievalError) -> Self {
        agent_core::Error::ProcessingFailed(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            RetrievalError::TypeError("user_request must be a string".into()).to_string(),
            "TypeError: user_request must be a string"
        );
        assert_eq!(
            RetrievalError::VectorStore("no documents".into()).to_string(),
            "Could not instantiate the vector store: no documents"
        );
    }

    #[test]
    fn test_error_conversion() {
        let err: agent_core::Error = RetrievalError::Embedding("timeout".into()).into();
        assert!(matches!(err, agent_core::Error::ProcessingFailed(msg) if msg.contains("timeout")));
    }
}
