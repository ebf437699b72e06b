//! Embedding backends
//!
//! `cpu` selects a local feature-hashing embedder that needs no network;
//! `remote-service` selects an OpenAI-compatible embeddings endpoint.
//!
//! The `cpu` backend is a lexical stand-in for a sentence-embedding model:
//! it scores word overlap, not meaning, so paraphrases that share no words
//! do not retrieve each other. Point `remote-service` at a real embedding
//! model when semantic recall matters.

use crate::error::{Result, RetrievalError};
use agent_llm::EmbeddingProvider;
use agent_llm::providers::{OpenAIConfig, OpenAIEmbeddings};
use agent_utils::config::{EmbeddingSettings, LlmSettings};
use async_trait::async_trait;
use regex::Regex;
use std::sync::{Arc, LazyLock};
use tracing::info;

/// Backend type for the local embedder
pub const CPU: &str = "cpu";
/// Backend type for the remote embedding service
pub const REMOTE_SERVICE: &str = "remote-service";

static TOKEN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\w+").expect("valid token pattern"));

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0000_0100_0000_01b3;

fn fnv1a(bytes: &[u8]) -> u64 {
    bytes
        .iter()
        .fold(FNV_OFFSET, |hash, byte| (hash ^ u64::from(*byte)).wrapping_mul(FNV_PRIME))
}

/// Local embedder hashing words and word bigrams into a fixed-width vector
///
/// Vectors are L2-normalized, so texts sharing vocabulary score high under
/// cosine similarity. Synonyms are unrelated features. Deterministic across
/// runs and platforms.
#[derive(Debug, Clone)]
pub struct HashingEmbedder {
    dimensions: usize,
}

impl HashingEmbedder {
    pub fn new(dimensions: usize) -> Result<Self> {
        if dimensions == 0 {
            return Err(RetrievalError::ValueError(
                "embedding dimensions must be greater than 0".to_string(),
            ));
        }
        Ok(Self { dimensions })
    }

    pub fn dimensions(&self) -> usize {
        self.dimensions
    }

    /// Embed one text
    pub fn embed_text(&self, text: &str) -> Vec<f32> {
        let tokens: Vec<String> = TOKEN
            .find_iter(text)
            .map(|m| m.as_str().to_lowercase())
            .collect();

        let mut vector = vec![0.0_f32; self.dimensions];
        let bigrams = tokens.windows(2).map(|pair| format!("{} {}", pair[0], pair[1]));
        for feature in tokens.iter().cloned().chain(bigrams) {
            let hash = fnv1a(feature.as_bytes());
            let index = (hash % self.dimensions as u64) as usize;
            // top bit picks the sign to spread collisions around zero
            let sign = if hash >> 63 == 0 { 1.0 } else { -1.0 };
            vector[index] += sign;
        }

        let norm = vector.iter().map(|v| v * v).sum::<f32>().sqrt();
        if norm > 0.0 {
            for v in &mut vector {
                *v /= norm;
            }
        }
        vector
    }
}

#[async_trait]
impl EmbeddingProvider for HashingEmbedder {
    async fn embed(&self, inputs: &[String]) -> agent_llm::Result<Vec<Vec<f32>>> {
        Ok(inputs.iter().map(|text| self.embed_text(text)).collect())
    }
}

/// Build the embedding backend named by `settings.kind`
///
/// The remote backend falls back to the completion service's base URL and key
/// when its own are not set.
pub fn load_embedding_model(
    settings: &EmbeddingSettings,
    llm: &LlmSettings,
) -> Result<Arc<dyn EmbeddingProvider>> {
    match settings.kind.as_str() {
        CPU => {
            info!(dimensions = settings.dimensions, "Using local hashing embedder");
            Ok(Arc::new(HashingEmbedder::new(settings.dimensions)?))
        },
        REMOTE_SERVICE => {
            let api_key = settings.api_key.clone().or_else(|| llm.api_key.clone()).unwrap_or_default();
            let api_base = settings.api_base.clone().unwrap_or_else(|| llm.api_base.clone());
            let config = OpenAIConfig::new(api_key)
                .with_api_base(api_base)
                .with_timeout(llm.timeout_secs);

            let embeddings = OpenAIEmbeddings::with_config(config, settings.model.clone())
                .map_err(|e| RetrievalError::Embedding(e.to_string()))?
                .with_batch_size(settings.batch_size);
            info!(model = %settings.model, batch_size = settings.batch_size, "Using remote embedding service");
            Ok(Arc::new(embeddings))
        },
        other => Err(RetrievalError::ValueError(format!(
            "embedding_model type can only be `{CPU}` or `{REMOTE_SERVICE}`. Got `{other}`"
        ))),
    }
}

/// Cosine similarity of two vectors, 0.0 when undefined
pub fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
