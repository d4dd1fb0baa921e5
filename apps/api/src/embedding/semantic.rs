use std::sync::Arc;

use tracing::debug;

use crate::embedding::{cosine_similarity, EmbedError, Embedder, EmbeddingCache, EmbeddingVector};

/// Explicitly constructed handle to the process-wide embedding model.
///
/// Built once in `main`, stored in `AppState`, cloned (cheaply) into pipeline tasks.
/// Blank text never reaches the model: it scores exactly 0.0.
#[derive(Clone)]
pub struct SemanticScorer {
    embedder: Arc<dyn Embedder>,
    cache: Option<Arc<EmbeddingCache>>,
}

impl SemanticScorer {
    pub fn new(embedder: Arc<dyn Embedder>) -> Self {
        Self {
            embedder,
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: EmbeddingCache) -> Self {
        self.cache = Some(Arc::new(cache));
        self
    }

    pub fn model_name(&self) -> &str {
        self.embedder.model_name()
    }

    /// Encodes `text`, or returns `None` for empty/whitespace-only input without
    /// invoking the model.
    pub async fn encode(&self, text: &str) -> Result<Option<EmbeddingVector>, EmbedError> {
        if text.trim().is_empty() {
            return Ok(None);
        }

        if let Some(cached) = self.cache.as_ref().and_then(|c| c.get(text)) {
            debug!("Embedding cache hit ({} chars)", text.len());
            return Ok(Some(cached));
        }

        let vector = self.embedder.embed(text).await?;
        if let Some(cache) = &self.cache {
            cache.put(text.to_string(), vector.clone());
        }
        Ok(Some(vector))
    }

    /// Cosine similarity of `text` against an already-encoded reference vector.
    pub async fn score_against(
        &self,
        text: &str,
        reference: &EmbeddingVector,
    ) -> Result<f64, EmbedError> {
        Ok(match self.encode(text).await? {
            Some(vector) => cosine_similarity(&vector, reference) as f64,
            None => 0.0,
        })
    }

    /// Cosine similarity between two texts; 0.0 if either is blank.
    #[cfg(test)]
    pub async fn similarity(&self, a: &str, b: &str) -> Result<f64, EmbedError> {
        if a.trim().is_empty() || b.trim().is_empty() {
            return Ok(0.0);
        }
        match self.encode(b).await? {
            Some(reference) => self.score_against(a, &reference).await,
            None => Ok(0.0),
        }
    }
}
