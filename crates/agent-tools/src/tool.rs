//! Tool trait definition

use async_trait::async_trait;
use agent_core::Result;
use serde::Serialize;
use serde_json::{Value, json};

/// Trait for tools an orchestration layer can invoke
///
/// Each tool publishes its name, a description, and JSON schemas for both
/// its input and its output. Input is validated by the tool itself when it
/// deserializes `params`.
#[async_trait]
pub trait Tool: Send + Sync {
    /// Execute the tool with given parameters
    ///
    /// # Arguments
    ///
    /// * `params` - Tool input as JSON value (should match input_schema)
    ///
    /// # Returns
    ///
    /// Tool output as JSON value (matches output_schema)
    async fn execute(&self, params: Value) -> Result<Value>;

    /// Get the tool's name
    ///
    /// Must be unique within a ToolRegistry
    fn name(&self) -> &str;

    /// Get the tool's description
    fn description(&self) -> &str;

    /// Get the tool's input schema (JSON Schema format)
    ///
    /// # Example
    ///
    /// ```
    /// use serde_json::json;
    ///
    /// let schema = json!({
    ///     "type": "object",
    ///     "properties": {
    ///         "symbol_list": { "type": "array", "items": { "type": "string" } }
    ///     },
    ///     "required": ["symbol_list"]
    /// });
    /// ```
    fn input_schema(&self) -> Value;

    /// Get the tool's output schema (JSON Schema format)
    fn output_schema(&self) -> Value {
        json!({ "type": "object" })
    }
}

/// Serializable description of a registered tool
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ToolDescriptor {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
    pub output_schema: Value,
}

impl ToolDescriptor {
    /// Describe a tool
    pub fn of(tool: &dyn Tool) -> Self {
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            input_schema: tool.input_schema(),
            output_schema: tool.output_schema(),
        }
    }
}
