//! Retrieval index backends.
//!
//! Two trait seams — [`DenseIndex`] for vector similarity and
//! [`LexicalIndex`] for inverted-index keyword search — plus process-local
//! implementations of each for tests and embedded deployments. External
//! stores (a vector database, a search cluster) integrate by implementing
//! the same traits.

mod bm25;
mod dense;
mod traits;

pub use bm25::Bm25Index;
pub use dense::MemoryDenseIndex;
pub use traits::{DenseIndex, LexicalIndex};

pub(crate) use dense::cosine_similarity;

#[cfg(test)]
pub(crate) use traits::{MockDense, MockLexical};
