//! Documents indexed by the retrieval pipeline

use crate::error::{Result, RetrievalError};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A piece of text with free-form metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl Document {
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object",
    }
}

/// Read documents from untyped JSON
///
/// The value must be a list of objects, each with a string `page_content`
/// and an optional `metadata` object.
pub fn documents_from_value(value: &Value) -> Result<Vec<Document>> {
    let items = value.as_array().ok_or_else(|| {
        RetrievalError::TypeError(format!("documents must be a list of documents. Got {}", kind(value)))
    })?;

    items
        .iter()
        .enumerate()
        .map(|(i, item)| {
            let object = item.as_object().ok_or_else(|| {
                RetrievalError::TypeError(format!("document {i} must be an object. Got {}", kind(item)))
            })?;
            let page_content = match object.get("page_content") {
                Some(Value::String(text)) => text.clone(),
                other => {
                    return Err(RetrievalError::TypeError(format!(
                        "document {i} must have a string page_content. Got {}",
                        other.map_or("nothing", kind)
                    )));
                },
            };
            let metadata = match object.get("metadata") {
                None | Some(Value::Null) => Map::new(),
                Some(Value::Object(map)) => map.clone(),
                Some(other) => {
                    return Err(RetrievalError::TypeError(format!(
                        "metadata of document {i} must be an object. Got {}",
                        kind(other)
                    )));
                },
            };
            Ok(Document { page_content, metadata })
        })
        .collect()
}
