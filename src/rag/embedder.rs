//! Embedding client abstraction.
//!
//! The engine consumes embeddings through the [`Embedder`] trait; any
//! provider (remote API, local ONNX runtime) plugs in behind it. With the
//! `local-embeddings` feature enabled, a fastembed-backed implementation is
//! available for fully offline use.

use async_trait::async_trait;

use crate::types::Result;

/// Turns text into fixed-dimension vectors.
#[async_trait]
pub trait Embedder: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Embed a batch of texts, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
}

#[cfg(feature = "local-embeddings")]
pub use local::FastEmbedder;

#[cfg(feature = "local-embeddings")]
mod local {
    use async_trait::async_trait;
    use fastembed::{EmbeddingModel, InitOptions, TextEmbedding};
    use parking_lot::Mutex;

    use crate::types::{EngineError, Result};

    use super::Embedder;

    /// Local embedding model via fastembed (BGE-small by default).
    pub struct FastEmbedder {
        // fastembed requires &mut for inference.
        model: Mutex<TextEmbedding>,
    }

    impl FastEmbedder {
        /// Load the default BGE-small model, downloading it on first use.
        pub fn new() -> Result<Self> {
            let model = TextEmbedding::try_new(
                InitOptions::new(EmbeddingModel::BGESmallENV15).with_show_download_progress(false),
            )
            .map_err(|e| EngineError::Embedding(e.to_string()))?;
            Ok(Self {
                model: Mutex::new(model),
            })
        }
    }

    #[async_trait]
    impl Embedder for FastEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            let mut vectors = self
                .model
                .lock()
                .embed(vec![text], None)
                .map_err(|e| EngineError::Embedding(e.to_string()))?;
            vectors
                .pop()
                .ok_or_else(|| EngineError::Embedding("model returned no vector".to_string()))
        }

        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
            if texts.is_empty() {
                return Ok(Vec::new());
            }
            self.model
                .lock()
                .embed(texts.to_vec(), None)
                .map_err(|e| EngineError::Embedding(e.to_string()))
        }
    }
}

#[cfg(test)]
mockall::mock! {
    pub Embed {}

    #[async_trait]
    impl Embedder for Embed {
        async fn embed(&self, text: &str) -> Result<Vec<f32>>;
        async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>>;
    }
}
