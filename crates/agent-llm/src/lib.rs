//! LLM provider abstraction layer
//!
//! This crate provides provider-agnostic abstractions for the text-completion
//! and embedding services used by the pipelines. It includes:
//!
//! - Message and completion request/response types
//! - [`LLMProvider`] and [`EmbeddingProvider`] traits
//! - Structured-output helpers for JSON replies
//! - An OpenAI-compatible implementation of both traits

pub mod completion;
pub mod error;
pub mod messages;
pub mod provider;
pub mod providers;
pub mod structured;

// Re-export main types
pub use completion::{CompletionRequest, CompletionResponse, StopReason, TokenUsage};
pub use error::{LLMError, Result};
pub use messages::{Message, Role};
pub use provider::{EmbeddingProvider, LLMProvider};
pub use structured::{StructuredOutput, format_instructions, parse_structured};
