//! Index backend traits.

use std::collections::BTreeMap;

use async_trait::async_trait;

use crate::types::{Hit, Result};

/// Vector similarity store over child-chunk embeddings.
///
/// Scores returned by `search` are backend-native (cosine similarity for the
/// in-crate implementation) and must not be compared with scores from other
/// backends; rank fusion handles the merge.
#[async_trait]
pub trait DenseIndex: Send + Sync {
    /// Return up to `k` nearest chunks for the query vector, best first.
    async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<Hit>>;

    /// Insert or replace a chunk's vector and payload.
    async fn upsert(
        &self,
        chunk_id: &str,
        vector: Vec<f32>,
        content: &str,
        metadata: BTreeMap<String, String>,
    ) -> Result<()>;
}

/// Inverted-index store over child-chunk text.
#[async_trait]
pub trait LexicalIndex: Send + Sync {
    /// Return up to `k` keyword matches for the query text, best first.
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Hit>>;

    /// Insert or replace a chunk's text and payload.
    async fn index(
        &self,
        chunk_id: &str,
        content: &str,
        metadata: BTreeMap<String, String>,
    ) -> Result<()>;
}

#[cfg(test)]
mockall::mock! {
    pub Dense {}

    #[async_trait]
    impl DenseIndex for Dense {
        async fn search(&self, vector: &[f32], k: usize) -> Result<Vec<Hit>>;
        async fn upsert(
            &self,
            chunk_id: &str,
            vector: Vec<f32>,
            content: &str,
            metadata: BTreeMap<String, String>,
        ) -> Result<()>;
    }
}

#[cfg(test)]
mockall::mock! {
    pub Lexical {}

    #[async_trait]
    impl LexicalIndex for Lexical {
        async fn search(&self, query: &str, k: usize) -> Result<Vec<Hit>>;
        async fn index(
            &self,
            chunk_id: &str,
            content: &str,
            metadata: BTreeMap<String, String>,
        ) -> Result<()>;
    }
}
