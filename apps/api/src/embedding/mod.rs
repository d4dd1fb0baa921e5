//! Semantic Scorer: embedding backends behind one trait, plus cosine similarity.
//!
//! The model is constructed exactly once at startup (`create_embedder`) and shared
//! read-only as `Arc<dyn Embedder>` inside `SemanticScorer`. Nothing reloads it per
//! request. Backends:
//! - `HttpEmbedder`: OpenAI-compatible `/v1/embeddings` endpoint (default; Ollama's
//!   `all-minilm` is all-MiniLM-L6-v2).
//! - `OnnxEmbedder`: local all-MiniLM-L6-v2 via ONNX Runtime, behind the `onnx` feature.

pub mod cache;
pub mod http;
pub mod onnx;
pub mod semantic;
#[cfg(test)]
pub mod testing;

use std::sync::Arc;

use async_trait::async_trait;
use ndarray::Array1;
use thiserror::Error;

use crate::config::{Config, EmbeddingBackendKind};

pub use cache::EmbeddingCache;
pub use http::HttpEmbedder;
#[cfg(feature = "onnx")]
pub use onnx::OnnxEmbedder;
pub use semantic::SemanticScorer;

#[derive(Debug, Error)]
pub enum EmbedError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Rate limited after {retries} retries")]
    RateLimited { retries: u32 },

    #[error("model returned an empty embedding")]
    EmptyOutput,

    #[cfg(any(test, feature = "onnx"))]
    #[error("model error: {0}")]
    Model(String),
}

/// Dense, fixed-dimension embedding. Never mutated after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct EmbeddingVector(Array1<f32>);

impl EmbeddingVector {
    pub fn new(values: Vec<f32>) -> Self {
        Self(Array1::from_vec(values))
    }

    pub fn dimension(&self) -> usize {
        self.0.len()
    }

    pub fn norm(&self) -> f32 {
        self.0.dot(&self.0).sqrt()
    }
}

impl From<Array1<f32>> for EmbeddingVector {
    fn from(values: Array1<f32>) -> Self {
        Self(values)
    }
}

/// Cosine similarity in `[-1, 1]`.
///
/// Returns 0.0 instead of NaN when either vector has a (near-)zero norm, and 0.0
/// when the dimensions disagree.
pub fn cosine_similarity(a: &EmbeddingVector, b: &EmbeddingVector) -> f32 {
    if a.dimension() != b.dimension() || a.dimension() == 0 {
        return 0.0;
    }
    let norm_a = a.norm();
    let norm_b = b.norm();
    if norm_a <= f32::EPSILON || norm_b <= f32::EPSILON {
        return 0.0;
    }
    let similarity = a.0.dot(&b.0) / (norm_a * norm_b);
    if similarity.is_finite() {
        similarity.clamp(-1.0, 1.0)
    } else {
        0.0
    }
}

/// A pretrained text-embedding model.
///
/// Implementations must tolerate concurrent callers, either because the runtime is
/// thread-safe or by serializing access internally.
#[async_trait]
pub trait Embedder: Send + Sync {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbedError>;

    /// Identifier reported in logs and the health endpoint.
    fn model_name(&self) -> &str;
}

/// Builds the configured embedding backend. Called once, from `main`.
pub fn create_embedder(config: &Config) -> anyhow::Result<Arc<dyn Embedder>> {
    match config.embedding_backend {
        EmbeddingBackendKind::Http => {
            let embedder = HttpEmbedder::new(
                config.embedding_api_url.clone(),
                config.embedding_model.clone(),
                config.embedding_api_key.clone(),
            )?;
            tracing::info!(
                "Using HTTP embedder (model={}, url={})",
                config.embedding_model,
                config.embedding_api_url
            );
            Ok(Arc::new(embedder))
        }
        EmbeddingBackendKind::Onnx => create_onnx_embedder(config),
    }
}

#[cfg(feature = "onnx")]
fn create_onnx_embedder(config: &Config) -> anyhow::Result<Arc<dyn Embedder>> {
    let model_dir = config
        .embedding_model_dir
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("EMBEDDING_MODEL_DIR is required for the onnx backend"))?;
    let embedder = OnnxEmbedder::load(model_dir)?;
    tracing::info!("Using ONNX embedder ({})", model_dir.display());
    Ok(Arc::new(embedder))
}

#[cfg(not(feature = "onnx"))]
fn create_onnx_embedder(config: &Config) -> anyhow::Result<Arc<dyn Embedder>> {
    anyhow::bail!(
        "EMBEDDING_BACKEND=onnx (model dir {:?}) requires building with `--features onnx`",
        config.embedding_model_dir
    )
}
