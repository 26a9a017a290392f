//! LLM-backed query expansion for the lexical search leg.
//!
//! Expansion is strictly best-effort: a disabled expander, a failed LLM call,
//! or unusable output all degrade to the original query. Expansion never
//! blocks or fails a search.

use std::sync::Arc;

use tracing::{debug, warn};

use crate::llm::LlmClient;

const EXPANSION_SYSTEM: &str = "You are a helpful assistant that generates synonyms and \
related technical terms for search queries. Generate 3-5 synonyms or related terms for \
the user's query. Return ONLY a comma-separated list of terms. Do not include the \
original query.";

/// Expands a query into related terms for keyword retrieval.
#[derive(Clone)]
pub struct QueryExpander {
    llm: Arc<dyn LlmClient>,
}

impl QueryExpander {
    /// Create an expander backed by the given model.
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Expand `query` into the original plus up to a handful of related
    /// terms, deduplicated in order. Infallible by design.
    pub async fn expand(&self, query: &str) -> Vec<String> {
        let raw = match self.llm.generate_with_system(EXPANSION_SYSTEM, query).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "query expansion failed, using original query");
                return vec![query.to_string()];
            }
        };

        let mut terms = vec![query.to_string()];
        for term in raw.split(',') {
            let term = term.trim();
            if term.is_empty() {
                continue;
            }
            if !terms.iter().any(|t| t.eq_ignore_ascii_case(term)) {
                terms.push(term.to_string());
            }
        }

        debug!(original = query, expanded = terms.len(), "expanded query");
        terms
    }
}
