//! The self-correcting orchestration state machine.
//!
//! The workflow is an explicit finite-state machine over [`Stage`], not a set
//! of recursive calls: the iteration cap and the cancellation points are
//! structural, so termination is checkable without reasoning about grader
//! behavior. One run owns one [`WorkflowState`]; independent runs share only
//! the injected clients.
//!
//! ```text
//!            Route ──────────────────────────┐
//!              │                             ▼
//!              ▼                         WebSearch
//!          Retrieve ◀── TransformQuery       │
//!              │               ▲             │
//!              ▼               │             │
//!        GradeDocuments ───────┤(empty)      │
//!              │(kept docs)    │             │
//!              ▼               │             │
//!           Generate ◀─────────┼─────────────┘
//!              │       (not grounded)
//!              ▼               │
//!       GradeGeneration ───────┘
//!              │(grounded+adequate: Done; inadequate: TransformQuery)
//! ```

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::agents::{
    AnswerGrader, HallucinationGrader, QueryRouter, RelevanceGrader, RouteDecision,
};
use crate::config::WorkflowConfig;
use crate::llm::LlmClient;
use crate::rag::HybridSearchEngine;
use crate::tools::WebSearchProvider;
use crate::types::Result;
use crate::workflow::state::{Outcome, RagAnswer, WorkflowState};

/// States of the orchestration machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Classify the question into a retrieval strategy.
    Route,
    /// Query the hybrid search engine.
    Retrieve,
    /// Filter retrieved passages by relevance.
    GradeDocuments,
    /// Rewrite the question for better retrieval (currently identity).
    TransformQuery,
    /// Fetch external-web fallback context.
    WebSearch,
    /// Draft an answer from the current context.
    Generate,
    /// Validate the draft for groundedness and adequacy.
    GradeGeneration,
    /// Terminal state.
    Done(Outcome),
}

/// Orchestrates retrieval, grading, generation, and corrective loops for one
/// question at a time.
pub struct RagWorkflow {
    search: Arc<HybridSearchEngine>,
    router: QueryRouter,
    relevance: RelevanceGrader,
    hallucination: HallucinationGrader,
    answer: AnswerGrader,
    generator: Arc<dyn LlmClient>,
    web_search: Option<Arc<dyn WebSearchProvider>>,
    config: WorkflowConfig,
}

impl RagWorkflow {
    /// Build a workflow over a search engine and one model client shared by
    /// the router, the graders, and the generator.
    pub fn new(
        search: Arc<HybridSearchEngine>,
        llm: Arc<dyn LlmClient>,
        config: WorkflowConfig,
    ) -> Self {
        Self {
            search,
            router: QueryRouter::new(llm.clone()),
            relevance: RelevanceGrader::new(llm.clone()),
            hallucination: HallucinationGrader::new(llm.clone()),
            answer: AnswerGrader::new(llm.clone()),
            generator: llm,
            web_search: None,
            config,
        }
    }

    /// Attach a web-search fallback provider.
    pub fn with_web_search(mut self, provider: Arc<dyn WebSearchProvider>) -> Self {
        self.web_search = Some(provider);
        self
    }

    /// Answer one question.
    ///
    /// Always terminates: the iteration cap bounds the corrective loops and
    /// the optional run deadline bounds wall-clock time. Only an unrecoverable
    /// retrieval or generation failure produces an error; cap and deadline
    /// expiry return the best available draft as [`Outcome::Exhausted`].
    pub async fn run(&self, question: &str) -> Result<RagAnswer> {
        let run_id = Uuid::new_v4();
        let deadline = self
            .config
            .run_timeout_secs
            .map(|secs| Instant::now() + Duration::from_secs(secs));

        let mut state = WorkflowState::new(question);
        let mut stage = Stage::Route;

        info!(%run_id, question, "workflow run started");

        loop {
            if let Stage::Done(outcome) = stage {
                info!(%run_id, ?outcome, iterations = state.iterations, "workflow run finished");
                return Ok(RagAnswer {
                    answer: state.generation,
                    documents: state.documents,
                    outcome,
                    iterations: state.iterations,
                });
            }

            stage = match deadline {
                Some(deadline) => {
                    let remaining = deadline.saturating_duration_since(Instant::now());
                    if remaining.is_zero() {
                        warn!(%run_id, "run deadline reached, returning best available state");
                        Stage::Done(Outcome::Exhausted)
                    } else {
                        match tokio::time::timeout(remaining, self.step(stage, &mut state)).await {
                            Ok(next) => next?,
                            Err(_) => {
                                warn!(%run_id, ?stage, "stage timed out, returning best available state");
                                Stage::Done(Outcome::Exhausted)
                            }
                        }
                    }
                }
                None => self.step(stage, &mut state).await?,
            };
        }
    }

    /// Execute one stage and return the next.
    async fn step(&self, stage: Stage, state: &mut WorkflowState) -> Result<Stage> {
        debug!(?stage, iterations = state.iterations, "entering stage");
        match stage {
            Stage::Route => {
                let decision = self.router.route(&state.question).await;
                Ok(route_target(decision))
            }

            Stage::Retrieve => {
                if state.iterations >= self.config.max_iterations {
                    info!("iteration cap reached before retrieval");
                    return Ok(Stage::Done(Outcome::Exhausted));
                }
                state.iterations += 1;

                let hits = self.search.search_default(&state.question).await?;
                state.documents = hits.into_iter().map(|h| h.content).collect();
                Ok(Stage::GradeDocuments)
            }

            Stage::GradeDocuments => {
                // Grade every passage concurrently; results are matched back
                // to their passage by position, not arrival order.
                let grades = futures::future::join_all(
                    state
                        .documents
                        .iter()
                        .map(|doc| self.relevance.grade(&state.question, doc)),
                )
                .await;

                let filtered: Vec<String> = state
                    .documents
                    .iter()
                    .zip(&grades)
                    .filter(|(_, grade)| grade.permissive())
                    .map(|(doc, _)| doc.clone())
                    .collect();

                debug!(
                    retrieved = state.documents.len(),
                    kept = filtered.len(),
                    "graded documents"
                );
                state.needs_web_search = filtered.is_empty();
                state.documents = filtered;

                Ok(after_grade_documents(state))
            }

            Stage::TransformQuery => {
                // Identity rewrite for now, reserved for LLM-backed query
                // reformulation.
                debug!("query transform is a pass-through");
                Ok(Stage::Retrieve)
            }

            Stage::WebSearch => {
                match &self.web_search {
                    Some(provider) => {
                        match provider.search(&state.question, self.search.top_k()).await {
                            Ok(docs) => state.documents = docs,
                            Err(e) => {
                                warn!(error = %e, "web search failed, generating without fallback context");
                                state.documents.clear();
                            }
                        }
                    }
                    None => {
                        warn!("no web search provider configured");
                        state.documents.clear();
                    }
                }
                Ok(Stage::Generate)
            }

            Stage::Generate => {
                if state.iterations >= self.config.max_iterations {
                    info!("iteration cap reached before generation");
                    return Ok(Stage::Done(Outcome::Exhausted));
                }
                state.iterations += 1;

                let context = state.documents.join("\n\n");
                let prompt = format!(
                    "You are an assistant for question-answering tasks. Use the following \
                     pieces of retrieved context to answer the question. If you don't know \
                     the answer, just say that you don't know. Use three sentences maximum \
                     and keep the answer concise.\n\
                     Question: {} \n\
                     Context: {} \n\
                     Answer:",
                    state.question, context
                );
                state.generation = self.generator.generate(&prompt).await?;
                Ok(Stage::GradeGeneration)
            }

            Stage::GradeGeneration => {
                let grounded = self
                    .hallucination
                    .grade(&state.documents, &state.generation)
                    .await;
                if !grounded.permissive() {
                    info!("generation is not grounded, regenerating");
                    return Ok(Stage::Generate);
                }

                let adequate = self.answer.grade(&state.question, &state.generation).await;
                Ok(after_generation_grades(adequate.permissive()))
            }

            // Terminal stages never reach step(); run() returns first.
            Stage::Done(_) => Ok(stage),
        }
    }
}

/// Map a routing decision onto its entry stage. The structured-data route has
/// no executor and falls back to grounded retrieval.
fn route_target(decision: RouteDecision) -> Stage {
    match decision {
        RouteDecision::WebSearch => Stage::WebSearch,
        RouteDecision::Vectorstore => Stage::Retrieve,
        RouteDecision::StructuredData => {
            debug!("structured-data route is reserved, using vectorstore");
            Stage::Retrieve
        }
    }
}

/// Conditional edge out of document grading.
fn after_grade_documents(state: &WorkflowState) -> Stage {
    if state.needs_web_search {
        Stage::TransformQuery
    } else {
        Stage::Generate
    }
}

/// Conditional edge out of the adequacy check (groundedness already passed).
fn after_generation_grades(adequate: bool) -> Stage {
    if adequate {
        Stage::Done(Outcome::Validated)
    } else {
        Stage::TransformQuery
    }
}
