//! Prompt template management
//!
//! Pipelines keep their prompts as named MiniJinja templates in a
//! [`PromptRegistry`] and render them with JSON variables.
//!
//! # Quick Start
//!
//! ```
//! use agent_prompt::{JinjaTemplate, PromptRegistry};
//! use serde_json::json;
//!
//! let registry = PromptRegistry::new();
//! registry.register(JinjaTemplate::new("analyzer", "Analyze {{ symbol }}").unwrap());
//!
//! let prompt = registry.render("analyzer", &json!({ "symbol": "AAPL" })).unwrap();
//! assert_eq!(prompt, "Analyze AAPL");
//! ```

mod error;
mod jinja;
mod registry;
mod template;

pub use error::{PromptError, Result};
pub use jinja::JinjaTemplate;
pub use registry::PromptRegistry;
pub use template::PromptTemplate;
