//! Groundedness grading of a draft answer against its context.

use std::sync::Arc;

use tracing::warn;

use crate::agents::Grade;
use crate::llm::LlmClient;

const HALLUCINATION_SYSTEM: &str = "You are a grader assessing whether an LLM generation is \
grounded in / supported by a set of retrieved facts.\n\
Give a binary score: 'yes' means that the answer is grounded in / supported by the set of \
facts.\n\
Respond with JSON: {\"binary_score\": \"yes\" | \"no\"}";

/// Checks whether a draft answer is supported by the supplied passages.
pub struct HallucinationGrader {
    llm: Arc<dyn LlmClient>,
}

impl HallucinationGrader {
    /// Create a grader backed by the given model.
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Grade a generation against its context passages. A failed call yields
    /// [`Grade::Unknown`], which call sites treat as grounded.
    pub async fn grade(&self, documents: &[String], generation: &str) -> Grade {
        let facts = documents.join("\n\n");
        let prompt = format!(
            "Set of facts: \n\n {} \n\n LLM generation: {}",
            facts, generation
        );
        match self
            .llm
            .generate_with_system(HALLUCINATION_SYSTEM, &prompt)
            .await
        {
            Ok(raw) => Grade::parse(&raw),
            Err(e) => {
                warn!(error = %e, "hallucination grading failed, accepting generation");
                Grade::Unknown
            }
        }
    }
}
