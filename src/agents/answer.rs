//! Answer-adequacy grading.

use std::sync::Arc;

use tracing::warn;

use crate::agents::Grade;
use crate::llm::LlmClient;

const ANSWER_SYSTEM: &str = "You are a grader assessing whether an answer addresses / \
resolves a question.\n\
Give a binary score: 'yes' means that the answer resolves the question.\n\
Respond with JSON: {\"binary_score\": \"yes\" | \"no\"}";

/// Checks whether a draft answer actually resolves the question.
pub struct AnswerGrader {
    llm: Arc<dyn LlmClient>,
}

impl AnswerGrader {
    /// Create a grader backed by the given model.
    pub fn new(llm: Arc<dyn LlmClient>) -> Self {
        Self { llm }
    }

    /// Grade a generation against the question. A failed call yields
    /// [`Grade::Unknown`], which call sites treat as adequate.
    pub async fn grade(&self, question: &str, generation: &str) -> Grade {
        let prompt = format!(
            "User question: \n\n {} \n\n LLM generation: {}",
            question, generation
        );
        match self.llm.generate_with_system(ANSWER_SYSTEM, &prompt).await {
            Ok(raw) => Grade::parse(&raw),
            Err(e) => {
                warn!(error = %e, "answer grading failed, accepting generation");
                Grade::Unknown
            }
        }
    }
}
