//! TOML-based configuration for the engine.
//!
//! All sections have serde defaults, so an empty file (or no file at all)
//! yields a fully usable configuration.
//!
//! ```toml
//! [chunking]
//! chunk_size = 512
//! chunk_overlap = 100
//!
//! [search]
//! rrf_k = 60.0
//! semantic_weight = 0.5
//! lexical_weight = 0.5
//!
//! [workflow]
//! max_iterations = 3
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::types::{EngineError, Result};

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SageConfig {
    /// Document chunking parameters.
    #[serde(default)]
    pub chunking: ChunkingConfig,

    /// Hybrid search and fusion parameters.
    #[serde(default)]
    pub search: SearchConfig,

    /// Workflow iteration and deadline parameters.
    #[serde(default)]
    pub workflow: WorkflowConfig,
}

impl SageConfig {
    /// Load configuration from a TOML file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path.as_ref()).map_err(|e| {
            EngineError::Config(format!(
                "Failed to read config file {}: {}",
                path.as_ref().display(),
                e
            ))
        })?;
        Self::from_toml_str(&raw)
    }

    /// Parse configuration from a TOML string.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let config: Self = toml::from_str(raw)
            .map_err(|e| EngineError::Config(format!("Failed to parse config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.chunking.chunk_overlap >= self.chunking.chunk_size {
            return Err(EngineError::Config(format!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunking.chunk_overlap, self.chunking.chunk_size
            )));
        }
        for (name, w) in [
            ("semantic_weight", self.search.semantic_weight),
            ("lexical_weight", self.search.lexical_weight),
        ] {
            if !(0.0..=1.0).contains(&w) {
                return Err(EngineError::Config(format!(
                    "{} must be between 0.0 and 1.0, got {}",
                    name, w
                )));
            }
        }
        if self.workflow.max_iterations == 0 {
            return Err(EngineError::Config(
                "max_iterations must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

// ============= Chunking Configuration =============

/// Document chunking parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Target child chunk size in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Overlap carried between consecutive child chunks, in characters.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Target parent section size in characters.
    #[serde(default = "default_parent_chunk_size")]
    pub parent_chunk_size: usize,

    /// Cosine-similarity floor for the semantic-boundary mode; consecutive
    /// sentences below it start a new chunk.
    #[serde(default = "default_semantic_similarity_threshold")]
    pub semantic_similarity_threshold: f32,
}

fn default_chunk_size() -> usize {
    512
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_parent_chunk_size() -> usize {
    2048
}

fn default_semantic_similarity_threshold() -> f32 {
    0.6
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            parent_chunk_size: default_parent_chunk_size(),
            semantic_similarity_threshold: default_semantic_similarity_threshold(),
        }
    }
}

// ============= Search Configuration =============

/// Hybrid search and rank-fusion parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchConfig {
    /// RRF damping constant. Larger values flatten the influence of top ranks.
    #[serde(default = "default_rrf_k")]
    pub rrf_k: f32,

    /// Weight applied to dense (semantic) rank contributions.
    #[serde(default = "default_semantic_weight")]
    pub semantic_weight: f32,

    /// Weight applied to lexical rank contributions.
    #[serde(default = "default_lexical_weight")]
    pub lexical_weight: f32,

    /// Default number of fused results returned per query.
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Whether to expand queries with LLM-generated synonyms before the
    /// lexical search.
    #[serde(default = "default_enable_query_expansion")]
    pub enable_query_expansion: bool,
}

fn default_rrf_k() -> f32 {
    60.0
}

fn default_semantic_weight() -> f32 {
    0.5
}

fn default_lexical_weight() -> f32 {
    0.5
}

fn default_top_k() -> usize {
    5
}

fn default_enable_query_expansion() -> bool {
    true
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            rrf_k: default_rrf_k(),
            semantic_weight: default_semantic_weight(),
            lexical_weight: default_lexical_weight(),
            top_k: default_top_k(),
            enable_query_expansion: default_enable_query_expansion(),
        }
    }
}

// ============= Workflow Configuration =============

/// Workflow iteration and deadline parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    /// Maximum number of retrieval/generation cycles before the run is forced
    /// to terminate with its best available draft.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: u32,

    /// Optional wall-clock budget for one run, in seconds. Expiry surfaces
    /// the best available state rather than an error.
    #[serde(default)]
    pub run_timeout_secs: Option<u64>,
}

fn default_max_iterations() -> u32 {
    3
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_max_iterations(),
            run_timeout_secs: None,
        }
    }
}
