//! Core types shared across the engine: the chunk data model, retrieval
//! hits, and the crate-wide error taxonomy.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

// ============= Chunk Data Model =============

/// Position of a chunk in the parent/child hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChunkLevel {
    /// A full logical section. Parents are never embedded or indexed; they
    /// exist to expand retrieved children into fuller context.
    Parent,
    /// A size-bounded slice of a parent. Children are what both indexes hold.
    Child,
}

/// A unit of indexed text produced by the chunker.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Stable identifier, unique across the corpus. Derived deterministically
    /// from content so re-ingesting identical documents is idempotent.
    pub id: String,
    /// Text payload.
    pub content: String,
    /// Parent or child.
    pub level: ChunkLevel,
    /// Lookup key of the owning parent; set only on child chunks.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parent_id: Option<String>,
    /// Ordered document-provenance fields (filename, header path, chunk index).
    pub metadata: BTreeMap<String, String>,
    /// Dense vector, present only after embedding. Always `None` on parents.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
}

impl Chunk {
    /// True for chunks that belong in the indexes.
    pub fn is_child(&self) -> bool {
        self.level == ChunkLevel::Child
    }
}

/// Id-indexed arena of chunks with parent back-references.
///
/// The parent/child relationship is a tree, but it is stored flat: children
/// point to parents by id, so there are no owned recursive structures and
/// serialization stays trivial. The main use is expanding a retrieved child
/// into its parent's fuller context.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChunkArena {
    chunks: std::collections::HashMap<String, Chunk>,
}

impl ChunkArena {
    /// Empty arena.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build an arena from a chunking pass.
    pub fn from_chunks(chunks: impl IntoIterator<Item = Chunk>) -> Self {
        Self {
            chunks: chunks.into_iter().map(|c| (c.id.clone(), c)).collect(),
        }
    }

    /// Insert or replace a chunk.
    pub fn insert(&mut self, chunk: Chunk) {
        self.chunks.insert(chunk.id.clone(), chunk);
    }

    /// Look up a chunk by id.
    pub fn get(&self, id: &str) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    /// The parent of a child chunk, if both are present.
    pub fn parent_of(&self, id: &str) -> Option<&Chunk> {
        let chunk = self.chunks.get(id)?;
        self.chunks.get(chunk.parent_id.as_deref()?)
    }

    /// The widest available context for a chunk: its parent's content when
    /// the parent is present, otherwise its own.
    pub fn expanded_content(&self, id: &str) -> Option<&str> {
        let chunk = self.chunks.get(id)?;
        match self.parent_of(id) {
            Some(parent) => Some(parent.content.as_str()),
            None => Some(chunk.content.as_str()),
        }
    }

    /// Number of stored chunks.
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// True when the arena holds nothing.
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

// ============= Retrieval Types =============

/// A single-backend retrieval result.
///
/// Scores are backend-native and not comparable across backends; fusion is
/// rank-based for exactly that reason. Hits are constructed per query and
/// discarded after fusion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Hit {
    /// Identifier of the matched chunk.
    pub chunk_id: String,
    /// Backend-native relevance score (higher is better).
    pub score: f32,
    /// Chunk text payload.
    pub content: String,
    /// Chunk provenance metadata.
    pub metadata: BTreeMap<String, String>,
}

/// A hit enriched with a rank-fusion score, comparable across backends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FusedHit {
    /// Identifier of the matched chunk.
    pub chunk_id: String,
    /// Chunk text payload.
    pub content: String,
    /// Chunk provenance metadata.
    pub metadata: BTreeMap<String, String>,
    /// Accumulated reciprocal-rank score. Derived from rank positions only,
    /// never from raw backend scores.
    pub fusion_score: f32,
}

// ============= Error Types =============

/// Error taxonomy for the engine.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Embedding call failed.
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Both retrieval backends were unavailable for a query.
    #[error("Retrieval error: {0}")]
    Retrieval(String),

    /// An index rejected a read or write.
    #[error("Index error: {0}")]
    Index(String),

    /// Language-model call failed.
    #[error("LLM error: {0}")]
    Llm(String),

    /// Caller supplied an invalid argument.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Configuration could not be loaded or validated.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Anything that does not fit the categories above.
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, EngineError>;
