//! Retrieval QA: index the documents, retrieve, stuff, complete

use crate::document::{Document, documents_from_value};
use crate::embedding::load_embedding_model;
use crate::error::{Result, RetrievalError};
use crate::vectorstore::InMemoryVectorStore;
use agent_llm::{CompletionRequest, EmbeddingProvider, LLMProvider, Message};
use agent_prompt::{JinjaTemplate, PromptRegistry};
use agent_utils::AppConfig;
use serde::Serialize;
use serde_json::{Value, json};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info, instrument};

/// Template name of the question answering prompt
pub const QA_PROMPT: &str = "retrieval.qa";

/// Separator between stuffed documents
const DOCUMENT_SEPARATOR: &str = "\n\n";

fn qa_prompt() -> agent_prompt::Result<JinjaTemplate> {
    JinjaTemplate::new(
        QA_PROMPT,
        r"You are a financial analyst. Answer the question using only the retrieved context below.
If the context does not contain the answer, say that you do not know.

Context:
{{ context }}

Question: {{ input }}

Answer:",
    )
}

/// Model and retrieval settings of the pipeline
#[derive(Debug, Clone, PartialEq)]
pub struct QaConfig {
    pub model: String,
    pub max_tokens: usize,
    pub temperature: f32,
    pub k_retrieved_documents: usize,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            model: "gpt-4o-mini".to_string(),
            max_tokens: 1024,
            temperature: 0.0,
            k_retrieved_documents: 3,
        }
    }
}

impl QaConfig {
    pub fn from_app_config(app: &AppConfig) -> Self {
        Self {
            model: app.llm.model.clone(),
            max_tokens: app.llm.max_tokens,
            temperature: app.llm.temperature,
            k_retrieved_documents: app.rag.retrieval.k_retrieved_documents,
        }
    }
}

/// Question, retrieved documents and the completion's answer
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QaResponse {
    pub input: String,
    pub context: Vec<Document>,
    pub answer: String,
}

/// Answers questions from documents supplied with each request
pub struct RetrievalQa {
    provider: Arc<dyn LLMProvider>,
    embedder: Arc<dyn EmbeddingProvider>,
    prompts: PromptRegistry,
    config: QaConfig,
}

impl RetrievalQa {
    pub fn new(
        provider: Arc<dyn LLMProvider>,
        embedder: Arc<dyn EmbeddingProvider>,
        config: QaConfig,
    ) -> Result<Self> {
        if config.k_retrieved_documents == 0 {
            return Err(RetrievalError::ValueError(
                "k_retrieved_documents must be a positive integer".to_string(),
            ));
        }

        let prompts = PromptRegistry::new();
        prompts.register(qa_prompt()?);

        Ok(Self {
            provider,
            embedder,
            prompts,
            config,
        })
    }

    /// Build the pipeline with the embedding backend named in `app`
    pub fn from_app_config(provider: Arc<dyn LLMProvider>, app: &AppConfig) -> Result<Self> {
        let embedder = load_embedding_model(&app.rag.embedding_model, &app.llm)?;
        Self::new(provider, embedder, QaConfig::from_app_config(app))
    }

    pub fn config(&self) -> &QaConfig {
        &self.config
    }

    /// Validate untyped arguments, then answer
    ///
    /// Nothing is embedded or sent before both arguments pass validation.
    pub async fn answer_value(&self, user_request: &Value, documents: &Value) -> Result<QaResponse> {
        let Some(user_request) = user_request.as_str() else {
            return Err(RetrievalError::TypeError("user_request must be a string".to_string()));
        };
        let documents = documents_from_value(documents)?;
        self.answer(user_request, documents).await
    }

    /// Answer `user_request` from the `k` documents closest to it
    #[instrument(skip(self, documents), fields(documents = documents.len(), k = self.config.k_retrieved_documents))]
    pub async fn answer(&self, user_request: &str, documents: Vec<Document>) -> Result<QaResponse> {
        let store = InMemoryVectorStore::from_documents(documents, self.embedder.as_ref()).await?;

        let query = self
            .embedder
            .embed(&[user_request.to_string()])
            .await
            .map_err(|e| RetrievalError::Embedding(e.to_string()))?
            .into_iter()
            .next()
            .ok_or_else(|| RetrievalError::Embedding("no vector returned for the request".to_string()))?;

        let context: Vec<Document> = store
            .similarity_search_by_vector(&query, self.config.k_retrieved_documents)
            .into_iter()
            .map(|(doc, score)| {
                debug!(score, chars = doc.page_content.len(), "Retrieved document");
                doc.clone()
            })
            .collect();

        let stuffed = context
            .iter()
            .map(|doc| doc.page_content.as_str())
            .collect::<Vec<_>>()
            .join(DOCUMENT_SEPARATOR);
        let prompt = self
            .prompts
            .render(QA_PROMPT, &json!({ "context": stuffed, "input": user_request }))?;

        let request = CompletionRequest::builder(self.config.model.clone())
            .add_message(Message::user(prompt))
            .max_tokens(self.config.max_tokens)
            .temperature(self.config.temperature)
            .build();

        let start = Instant::now();
        let response = self.provider.complete(request).await?;
        info!(
            provider = self.provider.name(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Retrieval QA completion finished"
        );

        Ok(QaResponse {
            input: user_request.to_string(),
            context,
            answer: response.text().to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::HashingEmbedder;
    use crate::test_support::{MockEmbedder, ScriptedProvider};

    fn filings() -> Vec<Document> {
        vec![
            Document::new("Apple iPhone revenue grew 6 percent in the fourth quarter.")
                .with_metadata("source", "aapl-10k"),
            Document::new("Crude oil inventories fell by two million barrels.")
                .with_metadata("source", "eia"),
            Document::new("Microsoft Azure cloud revenue rose 29 percent.").with_metadata("source", "msft-10q"),
        ]
    }

    fn pipeline(provider: Arc<ScriptedProvider>, k: usize) -> RetrievalQa {
        let config = QaConfig {
            k_retrieved_documents: k,
            ..QaConfig::default()
        };
        RetrievalQa::new(provider, Arc::new(HashingEmbedder::new(4096).unwrap()), config).unwrap()
    }

    #[tokio::test]
    async fn test_answer_stuffs_top_documents() {
        let provider = ScriptedProvider::new(vec!["iPhone revenue grew 6 percent."]);
        let qa = pipeline(provider.clone(), 1);

        let response = qa
            .answer("How much did iPhone revenue grow?", filings())
            .await
            .unwrap();

        assert_eq!(response.input, "How much did iPhone revenue grow?");
        assert_eq!(response.answer, "iPhone revenue grew 6 percent.");
        assert_eq!(response.context.len(), 1);
        assert_eq!(response.context[0].metadata["source"], "aapl-10k");

        let prompt = &provider.prompts()[0];
        assert!(prompt.contains("Apple iPhone revenue grew 6 percent"));
        assert!(!prompt.contains("Crude oil"));
        assert!(prompt.contains("Question: How much did iPhone revenue grow?"));
    }

    #[tokio::test]
    async fn test_context_is_capped_by_k() {
        let provider = ScriptedProvider::new(vec!["answer"]);
        let qa = pipeline(provider, 2);

        let response = qa.answer("revenue", filings()).await.unwrap();
        assert_eq!(response.context.len(), 2);
    }

    #[tokio::test]
    async fn test_answer_value_rejects_bad_types_before_calls() {
        let provider = ScriptedProvider::new(vec![]);
        let mut embedder = MockEmbedder::new();
        embedder.expect_embed().times(0);
        let qa = RetrievalQa::new(provider.clone(), Arc::new(embedder), QaConfig::default()).unwrap();

        let result = qa
            .answer_value(&json!(42), &json!([{ "page_content": "text" }]))
            .await;
        assert!(matches!(result, Err(RetrievalError::TypeError(_))));

        let result = qa.answer_value(&json!("question"), &json!({ "page_content": "text" })).await;
        assert!(matches!(result, Err(RetrievalError::TypeError(_))));

        let result = qa.answer_value(&json!("question"), &json!(["text"])).await;
        assert!(matches!(result, Err(RetrievalError::TypeError(_))));

        assert!(provider.prompts().is_empty());
    }

    #[tokio::test]
    async fn test_index_failure_is_vector_store_error() {
        let provider = ScriptedProvider::new(vec![]);
        let mut embedder = MockEmbedder::new();
        embedder
            .expect_embed()
            .returning(|_| Err(agent_llm::LLMError::RequestFailed("backend unreachable".into())));
        let qa = RetrievalQa::new(provider.clone(), Arc::new(embedder), QaConfig::default()).unwrap();

        let result = qa.answer("question", filings()).await;
        assert!(matches!(result, Err(RetrievalError::VectorStore(_))));
        assert!(provider.prompts().is_empty());
    }

    #[test]
    fn test_zero_k_rejected() {
        let config = QaConfig {
            k_retrieved_documents: 0,
            ..QaConfig::default()
        };
        let result = RetrievalQa::new(
            ScriptedProvider::new(vec![]),
            Arc::new(HashingEmbedder::new(8).unwrap()),
            config,
        );
        assert!(matches!(result, Err(RetrievalError::ValueError(_))));
    }

    #[test]
    fn test_from_app_config_unknown_backend() {
        let mut app = AppConfig::default();
        app.rag.embedding_model.kind = "gpu".to_string();

        let result = RetrievalQa::from_app_config(ScriptedProvider::new(vec![]), &app);
        assert!(matches!(result, Err(RetrievalError::ValueError(_))));
    }

    #[test]
    fn test_response_serializes() {
        let response = QaResponse {
            input: "q".into(),
            context: vec![Document::new("doc")],
            answer: "a".into(),
        };
        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "input": "q", "context": [{ "page_content": "doc", "metadata": {} }], "answer": "a" })
        );
    }
}
