//! Tool framework for exposing pipelines to an orchestration layer
//!
//! A [`Tool`] is an async handler with JSON input and output schemas; a
//! [`ToolRegistry`] maps names to tools and dispatches invocations.

pub mod registry;
pub mod tool;

pub use registry::ToolRegistry;
pub use tool::{Tool, ToolDescriptor};
