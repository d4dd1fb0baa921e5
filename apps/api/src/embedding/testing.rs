//! Deterministic in-process embedders for tests. No model, no network.

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use crate::embedding::{EmbedError, Embedder, EmbeddingVector};

const DIM: usize = 64;

/// Hashed bag-of-words embedder. Identical text always yields the identical vector,
/// and texts sharing words get positive cosine similarity.
#[derive(Default)]
pub struct HashingEmbedder {
    calls: AtomicUsize,
    /// Texts containing this marker fail with `EmbedError::Model`.
    fail_marker: Option<String>,
}

impl HashingEmbedder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_on(marker: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_marker: Some(marker.to_string()),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Embedder for HashingEmbedder {
    async fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbedError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(marker) = &self.fail_marker {
            if text.contains(marker.as_str()) {
                return Err(EmbedError::Model("simulated model failure".to_string()));
            }
        }

        let mut values = vec![0.0_f32; DIM];
        for word in text.split_whitespace() {
            let word: String = word
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_lowercase)
                .collect();
            if word.is_empty() {
                continue;
            }
            values[fnv1a(&word) as usize % DIM] += 1.0;
        }
        Ok(EmbeddingVector::new(values))
    }

    fn model_name(&self) -> &str {
        "hashing-test"
    }
}

fn fnv1a(s: &str) -> u64 {
    s.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, b| {
        (hash ^ b as u64).wrapping_mul(0x0100_0000_01b3)
    })
}
