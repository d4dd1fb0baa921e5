//! Local all-MiniLM-L6-v2 through ONNX Runtime. Requires the `onnx` feature.
//!
//! The session is not safe to drive from several threads at once, so every call goes
//! through one `parking_lot::Mutex`. Inference is CPU-bound and runs on the blocking pool.
//! Input is truncated to 256 word pieces, the model's `max_seq_length`.

#[cfg(any(test, feature = "onnx"))]
use ndarray::Array1;

/// Attention-masked mean of `[seq_len, dim]` token embeddings laid out row-major in `data`.
///
/// `None` when no token is unmasked or `data` holds fewer rows than the mask.
#[cfg(any(test, feature = "onnx"))]
fn mean_pool(data: &[f32], attention_mask: &[u32], dim: usize) -> Option<Array1<f32>> {
    if dim == 0 || data.len() < attention_mask.len() * dim {
        return None;
    }
    let mask_sum: f32 = attention_mask.iter().map(|&m| m as f32).sum();
    if mask_sum < 1e-9 {
        return None;
    }

    let mut pooled = Array1::<f32>::zeros(dim);
    for (i, &m) in attention_mask.iter().enumerate() {
        if m > 0 {
            let row = &data[i * dim..(i + 1) * dim];
            for (acc, &x) in pooled.iter_mut().zip(row) {
                *acc += x;
            }
        }
    }
    Some(pooled / mask_sum)
}

#[cfg(feature = "onnx")]
mod inner {
    use std::path::Path;
    use std::sync::Arc;

    use async_trait::async_trait;
    use ndarray::Array1;
    use ort::session::Session;
    use ort::value::Tensor;
    use parking_lot::Mutex;
    use tokenizers::{Tokenizer, TruncationParams};
    use tracing::info;

    use super::mean_pool;
    use crate::embedding::{EmbedError, Embedder, EmbeddingVector};

    const MAX_SEQ_LEN: usize = 256;
    const MODEL_NAME: &str = "all-MiniLM-L6-v2";

    pub struct OnnxEmbedder {
        session: Arc<Mutex<Session>>,
        tokenizer: Arc<Tokenizer>,
    }

    impl OnnxEmbedder {
        /// Loads `model.onnx` and `tokenizer.json` from `model_dir`.
        ///
        /// With `load-dynamic`, `ORT_DYLIB_PATH` must point at libonnxruntime.
        pub fn load(model_dir: &Path) -> Result<Self, EmbedError> {
            let model_path = model_dir.join("model.onnx");
            let tokenizer_path = model_dir.join("tokenizer.json");

            if !model_path.exists() {
                return Err(EmbedError::Model(format!(
                    "Model not found: {}",
                    model_path.display()
                )));
            }
            if !tokenizer_path.exists() {
                return Err(EmbedError::Model(format!(
                    "Tokenizer not found: {}",
                    tokenizer_path.display()
                )));
            }

            ort::init().commit();

            let session = Session::builder()
                .map_err(|e| EmbedError::Model(format!("Failed to create session builder: {e}")))?
                .with_intra_threads(2)
                .map_err(|e| EmbedError::Model(format!("Failed to set threads: {e}")))?
                .commit_from_file(&model_path)
                .map_err(|e| EmbedError::Model(format!("Failed to load ONNX model: {e}")))?;

            let mut tokenizer = Tokenizer::from_file(&tokenizer_path)
                .map_err(|e| EmbedError::Model(format!("Failed to load tokenizer: {e}")))?;
            tokenizer
                .with_truncation(Some(TruncationParams {
                    max_length: MAX_SEQ_LEN,
                    ..Default::default()
                }))
                .map_err(|e| EmbedError::Model(format!("Failed to set truncation: {e}")))?;

            info!("ONNX embedder loaded: model={}", model_path.display());

            Ok(Self {
                session: Arc::new(Mutex::new(session)),
                tokenizer: Arc::new(tokenizer),
            })
        }
    }

    /// Tokenize, run the session, and mean-pool token embeddings under the attention mask.
    fn infer(
        session: &Mutex<Session>,
        tokenizer: &Tokenizer,
        text: &str,
    ) -> Result<EmbeddingVector, EmbedError> {
        let encoding = tokenizer
            .encode(text, true)
            .map_err(|e| EmbedError::Model(format!("Tokenization failed: {e}")))?;

        let seq_len = encoding.get_ids().len().min(MAX_SEQ_LEN);
        let input_ids = &encoding.get_ids()[..seq_len];
        let attention_mask = &encoding.get_attention_mask()[..seq_len];

        let ids: Vec<i64> = input_ids.iter().map(|&id| id as i64).collect();
        let mask: Vec<i64> = attention_mask.iter().map(|&m| m as i64).collect();
        let type_ids: Vec<i64> = vec![0; seq_len];

        let tensor = |data: Vec<i64>| {
            Tensor::from_array(([1usize, seq_len], data))
                .map_err(|e| EmbedError::Model(format!("Failed to build input tensor: {e}")))
        };
        let inputs = ort::inputs![tensor(ids)?, tensor(mask)?, tensor(type_ids)?];

        let mut session = session.lock();
        let outputs = session
            .run(inputs)
            .map_err(|e| EmbedError::Model(format!("ONNX inference failed: {e}")))?;

        let (shape, data) = outputs[0]
            .try_extract_tensor::<f32>()
            .map_err(|e| EmbedError::Model(format!("Failed to extract output tensor: {e}")))?;
        let dims: Vec<i64> = shape.iter().copied().collect();

        let pooled = match dims.as_slice() {
            // [1, seq_len, dim] token embeddings
            [_, _, dim] => mean_pool(data, attention_mask, *dim as usize)
                .ok_or(EmbedError::EmptyOutput)?,
            // [1, dim] already pooled
            [_, dim] => Array1::from_vec(data[..*dim as usize].to_vec()),
            other => {
                return Err(EmbedError::Model(format!("Unexpected output shape: {other:?}")));
            }
        };

        Ok(EmbeddingVector::from(pooled))
    }

    #[async_trait]
    impl Embedder for OnnxEmbedder {
        async fn embed(&self, text: &str) -> Result<EmbeddingVector, EmbedError> {
            let session = Arc::clone(&self.session);
            let tokenizer = Arc::clone(&self.tokenizer);
            let text = text.to_string();

            tokio::task::spawn_blocking(move || infer(&session, &tokenizer, &text))
                .await
                .map_err(|e| EmbedError::Model(format!("spawn_blocking failed in inference: {e}")))?
        }

        fn model_name(&self) -> &str {
            MODEL_NAME
        }
    }
}

#[cfg(feature = "onnx")]
pub use inner::OnnxEmbedder;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mean_pool_ignores_masked_tokens() {
        // 3 tokens x 2 dims; the padding row must not contribute.
        let data = [1.0, 2.0, 3.0, 4.0, 100.0, 100.0];
        let pooled = mean_pool(&data, &[1, 1, 0], 2).unwrap();
        assert_eq!(pooled.to_vec(), vec![2.0, 3.0]);
    }

    #[test]
    fn test_mean_pool_single_token() {
        let pooled = mean_pool(&[0.5, -0.5, 9.0, 9.0], &[1, 0], 2).unwrap();
        assert_eq!(pooled.to_vec(), vec![0.5, -0.5]);
    }

    #[test]
    fn test_mean_pool_all_masked_is_none() {
        assert!(mean_pool(&[1.0, 2.0], &[0], 2).is_none());
        assert!(mean_pool(&[], &[], 2).is_none());
    }

    #[test]
    fn test_mean_pool_short_output_is_none() {
        assert!(mean_pool(&[1.0, 2.0], &[1, 1], 2).is_none());
        assert!(mean_pool(&[1.0, 2.0], &[1], 0).is_none());
    }
}
