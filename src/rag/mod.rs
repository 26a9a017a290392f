//! Retrieval pipeline: chunking, embedding, hybrid search, and rank fusion.
//!
//! Ingestion flow: [`chunker::HierarchicalChunker`] splits a document into
//! parent/child chunks, and [`search::HybridSearchEngine::index_chunks`]
//! embeds the children and writes them to both index backends. Query flow:
//! `search()` embeds the query, optionally widens the lexical leg via
//! [`expansion::QueryExpander`], queries both backends concurrently, and
//! merges the ranked lists with [`fusion::RrfFusion`].

pub mod chunker;
pub mod embedder;
pub mod expansion;
pub mod fusion;
pub mod search;

pub use chunker::{base_metadata, HierarchicalChunker};
pub use embedder::Embedder;
pub use expansion::QueryExpander;
pub use fusion::RrfFusion;
pub use search::HybridSearchEngine;
