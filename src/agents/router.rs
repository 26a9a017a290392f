//! Query routing.
//!
//! Classifies an incoming question into the retrieval strategy best suited to
//! answer it. Routing is infallible: an unreachable model or unparseable
//! output defaults to the vector store, so unclassified queries still attempt
//! grounded retrieval.

use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, warn};

use crate::agents::strip_code_fences;
use crate::llm::LlmClient;

const ROUTER_SYSTEM: &str = "You are an expert at routing a user question to a vectorstore, \
web search, or SQL database.\n\
The vectorstore contains technical reports, engineering specifications, and product manuals. \
Use the vectorstore for questions about specific technical details, parameters, or document \
content.\n\
Use web_search for questions about current events, general knowledge, or recent news.\n\
Use sql_db for questions requiring structured data analysis, counting, or aggregation of \
metadata.\n\
Respond with JSON: {\"datasource\": \"vectorstore\" | \"web_search\" | \"sql_db\"}";

/// Retrieval strategy chosen for a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    /// Answer from the indexed document corpus.
    Vectorstore,
    /// Answer from an external web search.
    WebSearch,
    /// Answer from structured data. Accepted from the model but reserved:
    /// no executor is wired, and the workflow falls back to the vector store.
    StructuredData,
}

/// Routes questions to a retrieval strategy via one structured LLM call.
pub struct QueryRouter {
    llm: Arc<dyn LlmClient>,
}

impl QueryRouter {
    /// Create a router backed by the given model.
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Classify a question. Never fails; defaults to
    /// [`RouteDecision::Vectorstore`].
    pub async fn route(&self, question: &str) -> RouteDecision {
        let raw = match self.llm.generate_with_system(ROUTER_SYSTEM, question).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(error = %e, "routing call failed, defaulting to vectorstore");
                return RouteDecision::Vectorstore;
            }
        };

        let decision = Self::parse_route(&raw).unwrap_or_else(|| {
            debug!(output = %raw, "could not parse routing output, defaulting to vectorstore");
            RouteDecision::Vectorstore
        });
        debug!(?decision, "routed question");
        decision
    }

    /// Parse a routing decision from model output.
    ///
    /// Tries the strict JSON form first, then scans free-form output for a
    /// datasource name.
    fn parse_route(raw: &str) -> Option<RouteDecision> {
        #[derive(Deserialize)]
        struct RouteQuery {
            datasource: String,
        }

        let cleaned = strip_code_fences(raw);

        if let Ok(parsed) = serde_json::from_str::<RouteQuery>(cleaned) {
            if let Some(decision) = Self::match_datasource(&parsed.datasource) {
                return Some(decision);
            }
        }

        let lowered = cleaned.to_lowercase();
        // Normalize separators so "web search" and "web_search" both match.
        let normalized = lowered.replace(['-', '_'], " ");
        if normalized.contains("web search") || normalized.contains("websearch") {
            return Some(RouteDecision::WebSearch);
        }
        if normalized.contains("vectorstore") || normalized.contains("vector store") {
            return Some(RouteDecision::Vectorstore);
        }
        if normalized.contains("sql db") || normalized.contains("sql") {
            return Some(RouteDecision::StructuredData);
        }

        None
    }

    fn match_datasource(raw: &str) -> Option<RouteDecision> {
        match raw.trim().to_lowercase().as_str() {
            "vectorstore" => Some(RouteDecision::Vectorstore),
            "web_search" => Some(RouteDecision::WebSearch),
            "sql_db" => Some(RouteDecision::StructuredData),
            _ => None,
        }
    }
}
