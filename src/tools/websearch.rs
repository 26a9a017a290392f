//! Web search fallback.
//!
//! When grounded retrieval produces nothing usable, the workflow can fall
//! back to an external web search for context. The provider sits behind a
//! trait so deployments can swap in their own search API; the bundled
//! implementation uses DuckDuckGo via the daedra crate.

use async_trait::async_trait;

use crate::types::{EngineError, Result};

/// Fetches external-web context passages for a query.
#[async_trait]
pub trait WebSearchProvider: Send + Sync {
    /// Return up to `limit` context passages for the query.
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>>;
}

/// Web search powered by DuckDuckGo.
#[derive(Debug, Default)]
pub struct DuckDuckGoSearch;

impl DuckDuckGoSearch {
    /// Create the provider.
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl WebSearchProvider for DuckDuckGoSearch {
    async fn search(&self, query: &str, limit: usize) -> Result<Vec<String>> {
        let args = daedra::SearchArgs {
            query: query.to_string(),
            options: Some(daedra::SearchOptions {
                num_results: limit,
                ..Default::default()
            }),
        };

        match daedra::tools::search::perform_search(&args).await {
            Ok(response) => Ok(response
                .data
                .iter()
                .map(|r| format!("{}\n{}\nSource: {}", r.title, r.description, r.url))
                .collect()),
            Err(e) => Err(EngineError::Internal(format!("Web search failed: {}", e))),
        }
    }
}
