//! Retrieval QA over documents supplied with each request
//!
//! Documents are embedded into an in-memory index that lives only for the
//! call, the closest `k` are concatenated into one prompt, and the
//! completion service answers from that context alone.
//!
//! The embedding backend is chosen from configuration: `cpu` for the local
//! [`HashingEmbedder`], `remote-service` for an OpenAI-compatible endpoint.

pub mod document;
pub mod embedding;
pub mod error;
pub mod qa;
pub mod tool;
pub mod vectorstore;

#[cfg(test)]
mod test_support;

pub use document::{Document, documents_from_value};
pub use embedding::{HashingEmbedder, cosine_similarity, load_embedding_model};
pub use error::{Result, RetrievalError};
pub use qa::{QaConfig, QaResponse, RetrievalQa};
pub use tool::DocumentQaTool;
pub use vectorstore::InMemoryVectorStore;
