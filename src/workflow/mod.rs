//! Self-correcting orchestration of retrieval, grading, and generation.

pub mod engine;
pub mod state;

pub use engine::{RagWorkflow, Stage};
pub use state::{Outcome, RagAnswer, WorkflowState};
