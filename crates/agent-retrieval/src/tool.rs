//! Tool exposing retrieval QA to an orchestration layer

use crate::error::RetrievalError;
use crate::qa::RetrievalQa;
use agent_core::Result as AgentResult;
use agent_tools::Tool;
use async_trait::async_trait;
use serde_json::{Value, json};
use std::sync::Arc;

pub const RETRIEVE_DOCUMENTS_QA: &str = "retrieve_documents_qa";

/// Tool answering a request from documents passed in the call
pub struct DocumentQaTool {
    qa: Arc<RetrievalQa>,
}

impl DocumentQaTool {
    pub fn new(qa: Arc<RetrievalQa>) -> Self {
        Self { qa }
    }
}

#[async_trait]
impl Tool for DocumentQaTool {
    async fn execute(&self, params: Value) -> AgentResult<Value> {
        let user_request = params.get("user_request").cloned().unwrap_or_default();
        let documents = params.get("documents").cloned().unwrap_or_default();

        let response = self
            .qa
            .answer_value(&user_request, &documents)
            .await
            .map_err(|e| match e {
                RetrievalError::TypeError(_) | RetrievalError::ValueError(_) => {
                    agent_core::Error::invalid_arguments(RETRIEVE_DOCUMENTS_QA, e)
                },
                other => other.into(),
            })?;

        Ok(json!({ "answer": response.answer, "context": response.context }))
    }

    fn name(&self) -> &str {
        RETRIEVE_DOCUMENTS_QA
    }

    fn description(&self) -> &str {
        "Answer a request using only the most relevant of the supplied documents."
    }

    fn input_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "user_request": {
                    "type": "string",
                    "description": "Question to answer"
                },
                "documents": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "page_content": { "type": "string" },
                            "metadata": { "type": "object" }
                        },
                        "required": ["page_content"]
                    }
                }
            },
            "required": ["user_request", "documents"]
        })
    }

    fn output_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "answer": { "type": "string" },
                "context": { "type": "array", "items": { "type": "object" } }
            },
            "required": ["answer", "context"]
        })
    }
}
