//! # S.A.G.E - Self-correcting Agentic Grounded Engine
//!
//! A hybrid retrieval engine for grounded question answering over technical
//! document corpora. Dense (semantic) and sparse (lexical) retrieval run
//! side by side, their rankings are merged with weighted Reciprocal Rank
//! Fusion, and a self-correcting workflow grades relevance, groundedness,
//! and answer adequacy before returning a result.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use sage::{
//!     Bm25Index, HierarchicalChunker, HybridSearchEngine, MemoryDenseIndex,
//!     RagWorkflow, SageConfig,
//! };
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = SageConfig::from_path("sage.toml")?;
//!
//!     // Ingest: chunk a document and index the children in both backends.
//!     let chunker = HierarchicalChunker::new(config.chunking.clone());
//!     let chunks = chunker.chunk_markdown(&markdown, &base_metadata);
//!
//!     let engine = Arc::new(HybridSearchEngine::new(
//!         embedder,                        // Arc<dyn Embedder>
//!         Arc::new(MemoryDenseIndex::new()),
//!         Arc::new(Bm25Index::new()),
//!         config.search.clone(),
//!     ));
//!     engine.index_chunks(&chunks).await?;
//!
//!     // Answer questions through the self-correcting workflow.
//!     let workflow = RagWorkflow::new(engine, llm, config.workflow.clone());
//!     let answer = workflow.run("What is the blade tolerance?").await?;
//!     println!("{} ({:?})", answer.answer, answer.outcome);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! ingest:  markdown ──▶ HierarchicalChunker ──▶ child chunks ──▶ both indexes
//!
//! query:   question ──▶ QueryRouter ──▶ HybridSearchEngine ──▶ RrfFusion
//!                            │                (dense ∥ lexical)     │
//!                            ▼                                      ▼
//!                        WebSearch ◀── corrective loops ◀── grading agents
//! ```
//!
//! External collaborators (embedding providers, index stores, language
//! models, web search) are injected through the [`rag::Embedder`],
//! [`index::DenseIndex`], [`index::LexicalIndex`], [`llm::LlmClient`], and
//! [`tools::WebSearchProvider`] traits; process-local index implementations
//! ship in-crate.
//!
//! ## Feature Flags
//!
//! | Feature | Description |
//! |---------|-------------|
//! | `local-embeddings` | fastembed-based local ONNX embedding model |

#![warn(missing_docs)]

/// Grading agents: routing, relevance, groundedness, adequacy.
pub mod agents;
/// TOML configuration with serde defaults.
pub mod config;
/// Index backend traits and process-local implementations.
pub mod index;
/// Language-model client abstraction.
pub mod llm;
/// Chunking, embedding, hybrid search, and rank fusion.
pub mod rag;
/// External fallback tools (web search).
pub mod tools;
/// Core types and error taxonomy.
pub mod types;
/// The self-correcting orchestration state machine.
pub mod workflow;

// Re-export commonly used types
pub use agents::{AnswerGrader, Grade, HallucinationGrader, QueryRouter, RelevanceGrader, RouteDecision};
pub use config::{ChunkingConfig, SageConfig, SearchConfig, WorkflowConfig};
pub use index::{Bm25Index, DenseIndex, LexicalIndex, MemoryDenseIndex};
pub use llm::LlmClient;
pub use rag::{base_metadata, Embedder, HierarchicalChunker, HybridSearchEngine, QueryExpander, RrfFusion};
pub use tools::{DuckDuckGoSearch, WebSearchProvider};
pub use types::{Chunk, ChunkArena, ChunkLevel, EngineError, FusedHit, Hit, Result};
pub use workflow::{Outcome, RagAnswer, RagWorkflow, Stage, WorkflowState};
