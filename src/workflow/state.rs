//! Workflow run state and output types.

use serde::{Deserialize, Serialize};

/// Mutable record threaded through one workflow run.
///
/// Owned exclusively by the run that created it; dropped at termination.
#[derive(Debug, Clone)]
pub struct WorkflowState {
    /// The user's question. Immutable once set.
    pub question: String,
    /// Current working context; replaced by each retrieval/filter step.
    pub documents: Vec<String>,
    /// Latest draft answer; overwritten across self-correction iterations.
    pub generation: String,
    /// Set when document grading left nothing usable.
    pub needs_web_search: bool,
    /// Number of entries into retrieval or generation so far.
    pub iterations: u32,
}

impl WorkflowState {
    /// Fresh state for an incoming question.
    pub fn new(question: impl Into<String>) -> Self {
        Self {
            question: question.into(),
            documents: Vec::new(),
            generation: String::new(),
            needs_web_search: false,
            iterations: 0,
        }
    }
}

/// How a workflow run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Outcome {
    /// The draft passed both the groundedness and adequacy checks.
    Validated,
    /// The iteration cap or run deadline was reached; the answer is the best
    /// available draft, returned without full validation.
    Exhausted,
}

/// Final result of a workflow run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagAnswer {
    /// The generated answer (possibly empty on an exhausted run that never
    /// reached generation).
    pub answer: String,
    /// The context passages the answer was conditioned on.
    pub documents: Vec<String>,
    /// Validated or exhausted.
    pub outcome: Outcome,
    /// Retrieval/generation cycles consumed.
    pub iterations: u32,
}
