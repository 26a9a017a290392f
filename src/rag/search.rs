//! Hybrid search over a dense and a lexical backend.
//!
//! One `search()` call embeds the query, optionally expands it, queries both
//! backends concurrently with over-fetch, and fuses the two ranked lists with
//! weighted RRF. Either backend failing degrades to the other backend alone;
//! only a total outage surfaces as an error.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::SearchConfig;
use crate::index::{DenseIndex, LexicalIndex};
use crate::rag::embedder::Embedder;
use crate::rag::expansion::QueryExpander;
use crate::rag::fusion::RrfFusion;
use crate::types::{Chunk, EngineError, FusedHit, Hit, Result};

/// Coordinates embedding, both index backends, optional query expansion, and
/// rank fusion into one search operation.
pub struct HybridSearchEngine {
    embedder: Arc<dyn Embedder>,
    dense: Arc<dyn DenseIndex>,
    lexical: Arc<dyn LexicalIndex>,
    expander: Option<QueryExpander>,
    fusion: RrfFusion,
    config: SearchConfig,
}

impl HybridSearchEngine {
    /// Create an engine over the given collaborators.
    pub fn new(
        embedder: Arc<dyn Embedder>,
        dense: Arc<dyn DenseIndex>,
        lexical: Arc<dyn LexicalIndex>,
        config: SearchConfig,
    ) -> Self {
        Self {
            embedder,
            dense,
            lexical,
            expander: None,
            fusion: RrfFusion::from_config(&config),
            config,
        }
    }

    /// Attach a query expander for the lexical leg.
    pub fn with_expander(mut self, expander: QueryExpander) -> Self {
        self.expander = Some(expander);
        self
    }

    /// Configured default result count.
    pub fn top_k(&self) -> usize {
        self.config.top_k
    }

    /// Search with the configured default limit.
    pub async fn search_default(&self, query: &str) -> Result<Vec<FusedHit>> {
        self.search(query, self.config.top_k).await
    }

    /// Hybrid search returning at most `limit` fused hits.
    pub async fn search(&self, query: &str, limit: usize) -> Result<Vec<FusedHit>> {
        if query.trim().is_empty() {
            return Err(EngineError::InvalidInput("empty query".to_string()));
        }
        if limit == 0 {
            return Ok(Vec::new());
        }

        // Over-fetch per backend so fusion has material to re-rank.
        let fetch = limit * 2;

        // Dense leg needs the query vector; an embedding failure downgrades
        // the search to lexical-only rather than failing it.
        let query_vector = match self.embedder.embed(query).await {
            Ok(v) => Some(v),
            Err(e) => {
                warn!(error = %e, "query embedding failed, dense leg disabled");
                None
            }
        };

        let lexical_query = self.lexical_query(query).await;

        let (dense_result, lexical_result) = tokio::join!(
            async {
                match &query_vector {
                    Some(vector) => self.dense.search(vector, fetch).await,
                    None => Err(EngineError::Embedding("no query vector".to_string())),
                }
            },
            self.lexical.search(&lexical_query, fetch),
        );

        let (semantic_hits, lexical_hits) = reconcile_backends(dense_result, lexical_result)?;

        let fused = self.fusion.fuse(&semantic_hits, &lexical_hits, limit);
        debug!(
            query,
            semantic = semantic_hits.len(),
            lexical = lexical_hits.len(),
            fused = fused.len(),
            "hybrid search complete"
        );
        Ok(fused)
    }

    /// Embed and index all child chunks into both backends. Parents are
    /// skipped: they are never embedded or indexed. Returns the number of
    /// chunks indexed.
    pub async fn index_chunks(&self, chunks: &[Chunk]) -> Result<usize> {
        let mut children: Vec<Chunk> = chunks.iter().filter(|c| c.is_child()).cloned().collect();
        if children.is_empty() {
            return Ok(0);
        }

        // Batch-embed whatever arrived without a vector.
        let missing: Vec<usize> = children
            .iter()
            .enumerate()
            .filter(|(_, c)| c.embedding.is_none())
            .map(|(i, _)| i)
            .collect();
        if !missing.is_empty() {
            let texts: Vec<String> = missing
                .iter()
                .map(|&i| children[i].content.clone())
                .collect();
            let vectors = self.embedder.embed_batch(&texts).await?;
            if vectors.len() != missing.len() {
                return Err(EngineError::Embedding(format!(
                    "embedder returned {} vectors for {} texts",
                    vectors.len(),
                    missing.len()
                )));
            }
            for (&i, vector) in missing.iter().zip(vectors) {
                children[i].embedding = Some(vector);
            }
        }

        let dense_leg = async {
            for chunk in &children {
                let vector = chunk.embedding.clone().ok_or_else(|| {
                    EngineError::Embedding(format!("chunk {} has no embedding", chunk.id))
                })?;
                self.dense
                    .upsert(&chunk.id, vector, &chunk.content, chunk.metadata.clone())
                    .await?;
            }
            Ok::<_, EngineError>(())
        };
        let lexical_leg = async {
            for chunk in &children {
                self.lexical
                    .index(&chunk.id, &chunk.content, chunk.metadata.clone())
                    .await?;
            }
            Ok::<_, EngineError>(())
        };
        futures::future::try_join(dense_leg, lexical_leg).await?;

        info!(indexed = children.len(), "indexed chunks in hybrid engine");
        Ok(children.len())
    }

    /// The text sent to the lexical backend: the original query, optionally
    /// widened with expansion terms.
    async fn lexical_query(&self, query: &str) -> String {
        if !self.config.enable_query_expansion {
            return query.to_string();
        }
        match &self.expander {
            Some(expander) => expander.expand(query).await.join(" "),
            None => query.to_string(),
        }
    }
}

/// Apply the partial-outage policy: one failed backend degrades to the other
/// one's results, both failing is a retrieval error.
fn reconcile_backends(
    dense: Result<Vec<Hit>>,
    lexical: Result<Vec<Hit>>,
) -> Result<(Vec<Hit>, Vec<Hit>)> {
    match (dense, lexical) {
        (Ok(d), Ok(l)) => Ok((d, l)),
        (Ok(d), Err(e)) => {
            warn!(error = %e, "lexical backend unavailable, using dense results only");
            Ok((d, Vec::new()))
        }
        (Err(e), Ok(l)) => {
            warn!(error = %e, "dense backend unavailable, using lexical results only");
            Ok((Vec::new(), l))
        }
        (Err(de), Err(le)) => Err(EngineError::Retrieval(format!(
            "both retrieval backends failed (dense: {}; lexical: {})",
            de, le
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::config::ChunkingConfig;
    use crate::index::{Bm25Index, MemoryDenseIndex, MockDense, MockLexical};
    use crate::rag::chunker::HierarchicalChunker;
    use crate::rag::embedder::MockEmbed;

    fn hit(id: &str) -> Hit {
        Hit {
            chunk_id: id.to_string(),
            score: 1.0,
            content: id.to_string(),
            metadata: BTreeMap::new(),
        }
    }

    fn stub_embedder() -> Arc<MockEmbed> {
        let mut embedder = MockEmbed::new();
        embedder.expect_embed().returning(|_| Ok(vec![1.0, 0.0]));
        embedder
            .expect_embed_batch()
            .returning(|texts| Ok(texts.iter().map(|_| vec![1.0, 0.0]).collect()));
        Arc::new(embedder)
    }

    #[tokio::test]
    async fn over_fetches_twice_the_limit_from_each_backend() {
        let mut dense = MockDense::new();
        dense
            .expect_search()
            .withf(|_, k| *k == 6)
            .returning(|_, _| Ok(vec![hit("a")]));
        let mut lexical = MockLexical::new();
        lexical
            .expect_search()
            .withf(|_, k| *k == 6)
            .returning(|_, _| Ok(vec![hit("b")]));

        let engine = HybridSearchEngine::new(
            stub_embedder(),
            Arc::new(dense),
            Arc::new(lexical),
            SearchConfig {
                enable_query_expansion: false,
                ..SearchConfig::default()
            },
        );

        let fused = engine.search("pump seals", 3).await.unwrap();
        assert_eq!(fused.len(), 2);
    }

    #[tokio::test]
    async fn dense_outage_degrades_to_lexical_only() {
        let mut dense = MockDense::new();
        dense
            .expect_search()
            .returning(|_, _| Err(EngineError::Index("connection refused".to_string())));
        let mut lexical = MockLexical::new();
        lexical
            .expect_search()
            .returning(|_, _| Ok(vec![hit("lex-1"), hit("lex-2")]));

        let engine = HybridSearchEngine::new(
            stub_embedder(),
            Arc::new(dense),
            Arc::new(lexical),
            SearchConfig {
                enable_query_expansion: false,
                ..SearchConfig::default()
            },
        );

        let fused = engine.search("bearing wear", 5).await.unwrap();
        assert_eq!(fused.len(), 2);
        assert_eq!(fused[0].chunk_id, "lex-1");
    }

    #[tokio::test]
    async fn lexical_outage_degrades_to_dense_only() {
        let mut dense = MockDense::new();
        dense.expect_search().returning(|_, _| Ok(vec![hit("d-1")]));
        let mut lexical = MockLexical::new();
        lexical
            .expect_search()
            .returning(|_, _| Err(EngineError::Index("timeout".to_string())));

        let engine = HybridSearchEngine::new(
            stub_embedder(),
            Arc::new(dense),
            Arc::new(lexical),
            SearchConfig {
                enable_query_expansion: false,
                ..SearchConfig::default()
            },
        );

        let fused = engine.search("bearing wear", 5).await.unwrap();
        assert_eq!(fused.len(), 1);
        assert_eq!(fused[0].chunk_id, "d-1");
    }

    #[tokio::test]
    async fn both_outages_surface_retrieval_error() {
        let mut dense = MockDense::new();
        dense
            .expect_search()
            .returning(|_, _| Err(EngineError::Index("down".to_string())));
        let mut lexical = MockLexical::new();
        lexical
            .expect_search()
            .returning(|_, _| Err(EngineError::Index("down".to_string())));

        let engine = HybridSearchEngine::new(
            stub_embedder(),
            Arc::new(dense),
            Arc::new(lexical),
            SearchConfig {
                enable_query_expansion: false,
                ..SearchConfig::default()
            },
        );

        let result = engine.search("anything", 5).await;
        assert!(matches!(result, Err(EngineError::Retrieval(_))));
    }

    #[tokio::test]
    async fn empty_query_is_rejected() {
        let engine = HybridSearchEngine::new(
            stub_embedder(),
            Arc::new(MockDense::new()),
            Arc::new(MockLexical::new()),
            SearchConfig::default(),
        );
        assert!(matches!(
            engine.search("   ", 5).await,
            Err(EngineError::InvalidInput(_))
        ));
    }

    #[tokio::test]
    async fn index_chunks_skips_parents_and_counts_children() {
        let chunker = HierarchicalChunker::new(ChunkingConfig::default());
        let mut metadata = BTreeMap::new();
        metadata.insert("filename".to_string(), "manual.md".to_string());
        let chunks = chunker.chunk_markdown(
            "# A\n\nAlpha section body.\n\n# B\n\nBeta section body.",
            &metadata,
        );

        let dense = Arc::new(MemoryDenseIndex::new());
        let lexical = Arc::new(Bm25Index::new());
        let engine = HybridSearchEngine::new(
            stub_embedder(),
            dense.clone(),
            lexical.clone(),
            SearchConfig {
                enable_query_expansion: false,
                ..SearchConfig::default()
            },
        );

        let indexed = engine.index_chunks(&chunks).await.unwrap();
        let children = chunks.iter().filter(|c| c.is_child()).count();
        assert_eq!(indexed, children);
        assert_eq!(dense.len(), children);
        assert_eq!(lexical.len(), children);
    }

    #[tokio::test]
    async fn end_to_end_search_over_memory_backends() {
        let chunker = HierarchicalChunker::new(ChunkingConfig::default());
        let mut metadata = BTreeMap::new();
        metadata.insert("filename".to_string(), "manual.md".to_string());
        let chunks = chunker.chunk_markdown(
            "# Pumps\n\nCentrifugal pump impellers require balancing.\n\n\
             # Valves\n\nGate valves seal with a wedge mechanism.",
            &metadata,
        );

        let engine = HybridSearchEngine::new(
            stub_embedder(),
            Arc::new(MemoryDenseIndex::new()),
            Arc::new(Bm25Index::new()),
            SearchConfig {
                enable_query_expansion: false,
                ..SearchConfig::default()
            },
        );
        engine.index_chunks(&chunks).await.unwrap();

        let fused = engine.search("impeller balancing", 3).await.unwrap();
        assert!(!fused.is_empty());
        assert!(fused[0].content.contains("impellers"));
    }
}
