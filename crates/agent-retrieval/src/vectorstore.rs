//! In-memory vector index rebuilt for every request

use crate::document::Document;
use crate::embedding::cosine_similarity;
use crate::error::{Result, RetrievalError};
use agent_llm::EmbeddingProvider;
use tracing::debug;

/// Documents paired with their embeddings
#[derive(Debug, Clone, Default)]
pub struct InMemoryVectorStore {
    entries: Vec<(Document, Vec<f32>)>,
}

impl InMemoryVectorStore {
    /// Embed `documents` and index them
    ///
    /// Any embedding failure, a vector count that differs from the document
    /// count or vectors of mixed widths fail with [`RetrievalError::VectorStore`].
    pub async fn from_documents(documents: Vec<Document>, embedder: &dyn EmbeddingProvider) -> Result<Self> {
        if documents.is_empty() {
            return Err(RetrievalError::VectorStore("no documents to index".to_string()));
        }

        let texts: Vec<String> = documents.iter().map(|d| d.page_content.clone()).collect();
        let vectors = embedder
            .embed(&texts)
            .await
            .map_err(|e| RetrievalError::VectorStore(e.to_string()))?;

        if vectors.len() != documents.len() {
            return Err(RetrievalError::VectorStore(format!(
                "embedding backend returned {} vectors for {} documents",
                vectors.len(),
                documents.len()
            )));
        }
        let width = vectors[0].len();
        if width == 0 || vectors.iter().any(|v| v.len() != width) {
            return Err(RetrievalError::VectorStore("embedding vectors have inconsistent widths".to_string()));
        }

        debug!(documents = documents.len(), width, "Indexed documents");
        Ok(Self {
            entries: documents.into_iter().zip(vectors).collect(),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The `k` documents most similar to `query`, best first
    ///
    /// Ties keep indexing order.
    pub fn similarity_search_by_vector(&self, query: &[f32], k: usize) -> Vec<(&Document, f32)> {
        let mut scored: Vec<(&Document, f32)> = self
            .entries
            .iter()
            .map(|(doc, vector)| (doc, cosine_similarity(query, vector)))
            .collect();
        scored.sort_by(|a, b| b.1.total_cmp(&a.1));
        scored.truncate(k);
        scored
    }
}
