//! Process-local dense vector index.
//!
//! Brute-force cosine similarity over an in-memory map. Fine for corpora up
//! to a few hundred thousand chunks; larger deployments should put an ANN
//! store behind [`DenseIndex`] instead.

use std::collections::{BTreeMap, HashMap};

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::index::DenseIndex;
use crate::types::{EngineError, Hit, Result};

#[derive(Debug, Clone)]
struct StoredVector {
    vector: Vec<f32>,
    content: String,
    metadata: BTreeMap<String, String>,
}

/// In-memory cosine-similarity vector index.
#[derive(Debug, Default)]
pub struct MemoryDenseIndex {
    entries: RwLock<HashMap<String, StoredVector>>,
}

impl MemoryDenseIndex {
    /// Create an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored vectors.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// True when nothing has been stored.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove a chunk's vector.
    pub fn remove(&self, chunk_id: &str) {
        self.entries.write().remove(chunk_id);
    }
}

/// Cosine similarity between two equal-length vectors; 0.0 when either has
/// zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl DenseIndex for MemoryDenseIndex {
    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<Hit>> {
        let entries = self.entries.read();

        let mut hits: Vec<Hit> = entries
            .iter()
            .filter(|(_, stored)| stored.vector.len() == vector.len())
            .map(|(id, stored)| Hit {
                chunk_id: id.clone(),
                score: cosine_similarity(vector, &stored.vector),
                content: stored.content.clone(),
                metadata: stored.metadata.clone(),
            })
            .collect();

        hits.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.chunk_id.cmp(&b.chunk_id))
        });
        hits.truncate(k);
        Ok(hits)
    }

    async fn upsert(
        &self,
        chunk_id: &str,
        vector: Vec<f32>,
        content: &str,
        metadata: BTreeMap<String, String>,
    ) -> Result<()> {
        if vector.is_empty() {
            return Err(EngineError::Index(format!(
                "Refusing to store empty vector for chunk {}",
                chunk_id
            )));
        }
        self.entries.write().insert(
            chunk_id.to_string(),
            StoredVector {
                vector,
                content: content.to_string(),
                metadata,
            },
        );
        Ok(())
    }
}
