//! Process-local BM25 lexical index.
//!
//! An inverted index with BM25 scoring (k1/b parameters), suitable for
//! embedded deployments and tests. Supports JSON persistence via `save()`
//! and `load()` so the index survives restarts without re-ingesting.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;

use async_trait::async_trait;
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::index::LexicalIndex;
use crate::types::{EngineError, Hit, Result};

/// Stored payload for one indexed chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct IndexedChunk {
    tokens: Vec<String>,
    content: String,
    metadata: BTreeMap<String, String>,
}

/// Serializable index state, guarded by a lock in [`Bm25Index`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Bm25State {
    /// Chunk id -> tokenized content and payload.
    chunks: HashMap<String, IndexedChunk>,
    /// Term -> chunk ids containing the term.
    postings: HashMap<String, HashSet<String>>,
    /// Term -> number of chunks containing it.
    document_frequencies: HashMap<String, usize>,
    /// Average tokenized chunk length.
    avg_chunk_length: f32,
}

impl Bm25State {
    fn recompute_avg_length(&mut self) {
        if self.chunks.is_empty() {
            self.avg_chunk_length = 0.0;
        } else {
            let total: usize = self.chunks.values().map(|c| c.tokens.len()).sum();
            self.avg_chunk_length = total as f32 / self.chunks.len() as f32;
        }
    }

    fn remove(&mut self, chunk_id: &str) {
        if let Some(chunk) = self.chunks.remove(chunk_id) {
            let unique: HashSet<_> = chunk.tokens.into_iter().collect();
            for term in unique {
                if let Some(df) = self.document_frequencies.get_mut(&term) {
                    *df = df.saturating_sub(1);
                    if *df == 0 {
                        self.document_frequencies.remove(&term);
                    }
                }
                if let Some(ids) = self.postings.get_mut(&term) {
                    ids.remove(chunk_id);
                    if ids.is_empty() {
                        self.postings.remove(&term);
                    }
                }
            }
            self.recompute_avg_length();
        }
    }
}

/// BM25 lexical index.
#[derive(Debug)]
pub struct Bm25Index {
    state: RwLock<Bm25State>,
    /// Term-frequency saturation parameter.
    k1: f32,
    /// Length-normalization parameter.
    b: f32,
}

impl Default for Bm25Index {
    fn default() -> Self {
        Self::new()
    }
}

impl Bm25Index {
    /// Create an empty index with standard parameters (k1 = 1.2, b = 0.75).
    pub fn new() -> Self {
        Self::with_params(1.2, 0.75)
    }

    /// Create an empty index with custom BM25 parameters.
    pub fn with_params(k1: f32, b: f32) -> Self {
        Self {
            state: RwLock::new(Bm25State::default()),
            k1,
            b,
        }
    }

    /// Tokenize text into lowercase alphanumeric terms, dropping single chars.
    fn tokenize(text: &str) -> Vec<String> {
        text.to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| s.len() > 1)
            .map(String::from)
            .collect()
    }

    fn idf(state: &Bm25State, term: &str) -> f32 {
        let df = state.document_frequencies.get(term).copied().unwrap_or(0) as f32;
        let n = state.chunks.len() as f32;
        if df == 0.0 || n == 0.0 {
            return 0.0;
        }
        ((n - df + 0.5) / (df + 0.5) + 1.0).ln()
    }

    fn score_chunk(&self, state: &Bm25State, chunk: &IndexedChunk, query_terms: &[String]) -> f32 {
        let chunk_len = chunk.tokens.len() as f32;
        let mut term_freq: HashMap<&str, usize> = HashMap::new();
        for token in &chunk.tokens {
            *term_freq.entry(token.as_str()).or_insert(0) += 1;
        }

        let mut score = 0.0;
        for term in query_terms {
            let tf = term_freq.get(term.as_str()).copied().unwrap_or(0) as f32;
            let idf = Self::idf(state, term);
            let numerator = tf * (self.k1 + 1.0);
            let denominator =
                tf + self.k1 * (1.0 - self.b + self.b * chunk_len / state.avg_chunk_length);
            score += idf * numerator / denominator;
        }
        score
    }

    /// Number of indexed chunks.
    pub fn len(&self) -> usize {
        self.state.read().chunks.len()
    }

    /// True when nothing has been indexed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Remove a chunk from the index.
    pub fn remove(&self, chunk_id: &str) {
        self.state.write().remove(chunk_id);
    }

    /// Drop all indexed content.
    pub fn clear(&self) {
        *self.state.write() = Bm25State::default();
    }

    /// Save the index state as JSON.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let json = serde_json::to_string(&*self.state.read())
            .map_err(|e| EngineError::Index(format!("Failed to serialize BM25 index: {}", e)))?;
        std::fs::write(path, json)
            .map_err(|e| EngineError::Index(format!("Failed to write BM25 index file: {}", e)))?;
        Ok(())
    }

    /// Load an index saved with [`Bm25Index::save`], with default parameters.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .map_err(|e| EngineError::Index(format!("Failed to read BM25 index file: {}", e)))?;
        let state: Bm25State = serde_json::from_str(&json)
            .map_err(|e| EngineError::Index(format!("Failed to deserialize BM25 index: {}", e)))?;
        let index = Self::new();
        *index.state.write() = state;
        Ok(index)
    }
}

#[async_trait]
impl LexicalIndex for Bm25Index {
    async fn search(&self, query: &str, k: usize) -> Result<Vec<Hit>> {
        let query_terms = Self::tokenize(query);
        if query_terms.is_empty() {
            return Ok(Vec::new());
        }

        let state = self.state.read();

        // Candidate set: chunks containing at least one query term.
        let mut candidates: HashSet<&String> = HashSet::new();
        for term in &query_terms {
            if let Some(ids) = state.postings.get(term) {
                candidates.extend(ids.iter());
            }
        }

        let mut hits: Vec<Hit> = candidates
            .into_iter()
            .filter_map(|id| {
                let chunk = state.chunks.get(id)?;
                let score = self.score_chunk(&state, chunk, &query_terms);
                (score > 0.0).then(|| Hit {
                    chunk_id: id.clone(),
                    score,
                    content: chunk.content.clone(),
                    metadata: chunk.metadata.clone(),
                })
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

    async fn index(
        &self,
        chunk_id: &str,
        content: &str,
        metadata: BTreeMap<String, String>,
    ) -> Result<()> {
        let tokens = Self::tokenize(content);
        let mut state = self.state.write();

        // Replace any previous version of this chunk.
        state.remove(chunk_id);

        let unique: HashSet<_> = tokens.iter().cloned().collect();
        for term in unique {
            *state.document_frequencies.entry(term.clone()).or_insert(0) += 1;
            state
                .postings
                .entry(term)
                .or_default()
                .insert(chunk_id.to_string());
        }

        state.chunks.insert(
            chunk_id.to_string(),
            IndexedChunk {
                tokens,
                content: content.to_string(),
                metadata,
            },
        );
        state.recompute_avg_length();
        Ok(())
    }
}
