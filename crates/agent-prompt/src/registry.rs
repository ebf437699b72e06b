//! Prompt template registry

use crate::{PromptError, PromptTemplate, Result};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};

/// A thread-safe registry for managing prompt templates
///
/// # Examples
///
/// ```
/// use agent_prompt::{JinjaTemplate, PromptRegistry};
/// use serde_json::json;
///
/// let registry = PromptRegistry::new();
/// registry.register(JinjaTemplate::new("greeting", "Hello, {{ name }}!").unwrap());
///
/// let text = registry.render("greeting", &json!({ "name": "World" })).unwrap();
/// assert_eq!(text, "Hello, World!");
/// ```
pub struct PromptRegistry {
    templates: RwLock<HashMap<String, Arc<dyn PromptTemplate>>>,
}

impl PromptRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            templates: RwLock::new(HashMap::new()),
        }
    }

    /// Register a template
    ///
    /// If a template with the same name already exists, it will be replaced.
    pub fn register<T: PromptTemplate + 'static>(&self, template: T) {
        if let Ok(mut templates) = self.templates.write() {
            templates.insert(template.name().to_string(), Arc::new(template));
        }
    }

    /// Get a template by name
    pub fn get(&self, name: &str) -> Option<Arc<dyn PromptTemplate>> {
        self.templates.read().ok()?.get(name).cloned()
    }

    /// Check if a template is registered
    pub fn contains(&self, name: &str) -> bool {
        self.templates
            .read()
            .map(|t| t.contains_key(name))
            .unwrap_or(false)
    }

    /// Render a registered template
    pub fn render(&self, name: &str, vars: &serde_json::Value) -> Result<String> {
        let template = self
            .get(name)
            .ok_or_else(|| PromptError::TemplateNotRegistered(name.to_string()))?;
        template.render(vars)
    }

    /// List all registered template names, sorted
    pub fn list(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .templates
            .read()
            .map(|t| t.keys().cloned().collect())
            .unwrap_or_default();
        names.sort();
        names
    }

    /// Get the number of registered templates
    pub fn len(&self) -> usize {
        self.templates.read().map(|t| t.len()).unwrap_or(0)
    }

    /// Check if the registry is empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for PromptRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for PromptRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PromptRegistry")
            .field("templates", &self.list())
            .finish()
    }
}
