//! Tool registry for managing available tools

use crate::{Tool, ToolDescriptor};
use agent_core::{Error, Result};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::{Arc, RwLock};
use tracing::{debug, instrument};

/// Registry mapping tool names to tools
///
/// Dispatch is explicit: callers name a tool and hand over JSON arguments,
/// and the registry routes them to that tool's handler.
#[derive(Default)]
pub struct ToolRegistry {
    tools: RwLock<BTreeMap<String, Arc<dyn Tool>>>,
}

impl ToolRegistry {
    /// Create a new tool registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool, replacing any tool with the same name
    pub fn register(&self, tool: Arc<dyn Tool>) {
        if let Ok(mut tools) = self.tools.write() {
            tools.insert(tool.name().to_string(), tool);
        }
    }

    /// Get a tool by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn Tool>> {
        self.tools.read().ok()?.get(name).cloned()
    }

    /// List all registered tools, ordered by name
    pub fn list_tools(&self) -> Vec<Arc<dyn Tool>> {
        self.tools
            .read()
            .map(|tools| tools.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Describe all registered tools, ordered by name
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.list_tools()
            .iter()
            .map(|tool| ToolDescriptor::of(tool.as_ref()))
            .collect()
    }

    /// Invoke a tool by name
    #[instrument(skip(self, params))]
    pub async fn invoke(&self, name: &str, params: Value) -> Result<Value> {
        let tool = self
            .get(name)
            .ok_or_else(|| Error::ToolNotFound(name.to_string()))?;
        debug!("Dispatching to tool");
        tool.execute(params).await
    }

    /// Get the number of registered tools
    pub fn len(&self) -> usize {
        self.tools.read().map(|tools| tools.len()).unwrap_or(0)
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
