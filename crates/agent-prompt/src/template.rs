//! Core prompt template trait

use crate::Result;

/// Core trait for prompt templates
///
/// Variables are passed as `serde_json::Value` so the trait stays
/// dyn-compatible and templates can live behind `Arc<dyn PromptTemplate>`.
pub trait PromptTemplate: Send + Sync {
    /// Get the template name/identifier
    fn name(&self) -> &str;

    /// Raw template source (for debugging/inspection)
    fn source(&self) -> &str;

    /// Render the template with variables
    fn render(&self, vars: &serde_json::Value) -> Result<String>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    /// Template that ignores its variables
    struct StaticTemplate(&'static str);

    impl PromptTemplate for StaticTemplate {
        fn name(&self) -> &str {
            "static"
        }

        fn source(&self) -> &str {
            self.0
        }

        fn render(&self, _vars: &serde_json::Value) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn test_dyn_template() {
        let template: Box<dyn PromptTemplate> = Box::new(StaticTemplate("fixed"));
        assert_eq!(template.render(&json!({"x": 1})).unwrap(), "fixed");
        assert_eq!(template.source(), "fixed");
    }
}
