//! Per-passage relevance grading.

use std::sync::Arc;

use tracing::warn;

use crate::agents::Grade;
use crate::llm::LlmClient;

const RELEVANCE_SYSTEM: &str = "You are a grader assessing relevance of a retrieved document \
to a user question.\n\
If the document contains keyword(s) or semantic meaning related to the user question, grade \
it as relevant. It does not need to be a stringent test. The goal is to filter out erroneous \
retrievals.\n\
Respond with JSON: {\"binary_score\": \"yes\" | \"no\"}";

/// Judges whether one retrieved passage is relevant to the question.
pub struct RelevanceGrader {
    llm: Arc<dyn LlmClient>,
}

impl RelevanceGrader {
    /// Create a grader backed by the given model.
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Grade one passage against the question. A failed call yields
    /// [`Grade::Unknown`], which call sites treat as relevant.
    pub async fn grade(&self, question: &str, document: &str) -> Grade {
        let prompt = format!(
            "Retrieved document: \n\n {} \n\n User question: {}",
            document, question
        );
        match self.llm.generate_with_system(RELEVANCE_SYSTEM, &prompt).await {
            Ok(raw) => Grade::parse(&raw),
            Err(e) => {
                warn!(error = %e, "relevance grading failed, keeping document");
                Grade::Unknown
            }
        }
    }
}
