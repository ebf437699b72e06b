//! MiniJinja-based template implementation
//!
//! Templates use standard Jinja2 syntax (`{{ variable }}`, filters,
//! `{% if %}`, `{% for %}`). Rendering is strict: referencing a variable
//! that was not supplied is an error rather than an empty string.

use crate::{PromptError, PromptTemplate, Result};
use minijinja::{Environment, UndefinedBehavior};

/// A prompt template backed by MiniJinja
///
/// # Examples
///
/// ```
/// use agent_prompt::{JinjaTemplate, PromptTemplate};
/// use serde_json::json;
///
/// let template = JinjaTemplate::new("greeting", "Hello, {{ name }}!").unwrap();
/// let text = template.render(&json!({ "name": "World" })).unwrap();
/// assert_eq!(text, "Hello, World!");
/// ```
pub struct JinjaTemplate {
    name: String,
    source: String,
}

impl JinjaTemplate {
    /// Create a template, failing if the source does not compile
    pub fn new(name: impl Into<String>, source: impl Into<String>) -> Result<Self> {
        let name = name.into();
        let source = source.into();

        let env = Environment::new();
        if let Err(e) = env.template_from_str(&source) {
            return Err(PromptError::TemplateParseFailed {
                name,
                detail: e.to_string(),
            });
        }

        Ok(Self { name, source })
    }

    fn environment() -> Environment<'static> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env
    }
}

impl PromptTemplate for JinjaTemplate {
    fn name(&self) -> &str {
        &self.name
    }

    fn source(&self) -> &str {
        &self.source
    }

    fn render(&self, vars: &serde_json::Value) -> Result<String> {
        let env = Self::environment();
        let value = minijinja::Value::from_serialize(vars);

        env.render_str(&self.source, value)
            .map_err(|e| PromptError::RenderError {
                name: self.name.clone(),
                detail: e.to_string(),
            })
    }
}

impl std::fmt::Debug for JinjaTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JinjaTemplate")
            .field("name", &self.name)
            .field("length", &self.source.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_simple_template() {
        let template = JinjaTemplate::new("test", "Hello, {{ name }}!").unwrap();
        let result = template.render(&json!({ "name": "World" })).unwrap();
        assert_eq!(result, "Hello, World!");
    }

    #[test]
    fn test_invalid_template_error() {
        let result = JinjaTemplate::new("test", "{{ unclosed");
        assert!(matches!(result, Err(PromptError::TemplateParseFailed { .. })));
    }

    #[test]
    fn test_missing_variable_is_error() {
        let template = JinjaTemplate::new("test", "Tables: {{ summaries }}").unwrap();
        let result = template.render(&json!({}));
        assert!(matches!(result, Err(PromptError::RenderError { name, .. }) if name == "test"));
    }

    #[test]
    fn test_quotes_not_escaped() {
        let template = JinjaTemplate::new("test", "{{ payload }}").unwrap();
        let result = template
            .render(&json!({ "payload": r#"{"aapl_info": "Key, Value"}"# }))
            .unwrap();
        assert_eq!(result, r#"{"aapl_info": "Key, Value"}"#);
    }

    #[test]
    fn test_loop() {
        let template = JinjaTemplate::new(
            "loop",
            "{% for item in items %}- {{ item }}\n{% endfor %}",
        )
        .unwrap();

        let result = template
            .render(&json!({ "items": ["one", "two"] }))
            .unwrap();
        assert_eq!(result, "- one\n- two\n");
    }

    #[test]
    fn test_conditional() {
        let template = JinjaTemplate::new(
            "conditional",
            "{% if context %}Use: {{ context }}{% else %}No context{% endif %}",
        )
        .unwrap();

        assert_eq!(template.render(&json!({ "context": "x" })).unwrap(), "Use: x");
        assert_eq!(template.render(&json!({ "context": "" })).unwrap(), "No context");
    }
}
