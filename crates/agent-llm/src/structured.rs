//! Structured output over plain text completions
//!
//! A type implementing [`StructuredOutput`] publishes a JSON schema. The
//! schema is rendered into prompt instructions with [`format_instructions`],
//! and the reply is decoded back with [`parse_structured`].

use crate::{LLMError, Result};
use regex::Regex;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::LazyLock;

static JSON_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)\s*```").expect("valid fence pattern"));

/// A response shape the completion service is asked to produce
pub trait StructuredOutput: DeserializeOwned {
    /// JSON schema describing the expected object
    fn json_schema() -> Value;
}

/// Prompt text instructing the service to answer with an instance of `T`
pub fn format_instructions<T: StructuredOutput>() -> String {
    let schema = T::json_schema();
    let schema_text = serde_json::to_string(&schema).unwrap_or_else(|_| schema.to_string());
    format!(
        "The output should be formatted as a JSON instance that conforms to the JSON schema below.\n\
         Answer with the JSON object only, without commentary.\n\n\
         Here is the output schema:\n```\n{schema_text}\n```"
    )
}

/// Decode a completion into `T`
///
/// Accepts a bare JSON object, a fenced ```json block, or an object embedded
/// in surrounding prose. Anything else is a [`LLMError::ResponseParse`].
pub fn parse_structured<T: DeserializeOwned>(text: &str) -> Result<T> {
    let trimmed = text.trim();

    let mut candidates: Vec<&str> = vec![trimmed];
    if let Some(cap) = JSON_FENCE.captures(trimmed) {
        if let Some(block) = cap.get(1) {
            candidates.push(block.as_str());
        }
    }
    if let (Some(start), Some(end)) = (trimmed.find('{'), trimmed.rfind('}')) {
        if start < end {
            candidates.push(&trimmed[start..=end]);
        }
    }

    let mut last_error = None;
    for candidate in candidates {
        match serde_json::from_str::<T>(candidate) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(e),
        }
    }

    Err(LLMError::ResponseParse(match last_error {
        Some(e) => format!("{e}; response was: {trimmed}"),
        None => format!("empty response: {trimmed}"),
    }))
}
