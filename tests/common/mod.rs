//! Stub collaborators shared across integration tests.
//!
//! These run the engine end-to-end without any external service: a
//! vocabulary-projection embedder, a scripted LLM keyed on the system prompt,
//! and always-failing index stubs for outage scenarios.

// Each integration test binary compiles this module and uses its own subset.
#![allow(dead_code)]

use std::collections::BTreeMap;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use sage::{Embedder, EngineError, Hit, LlmClient, Result, WebSearchProvider};
use sage::{DenseIndex, LexicalIndex};

/// Initialize test logging once; safe to call from every test.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

// ============================================================================
// Embedder
// ============================================================================

/// Deterministic embedder projecting text onto a fixed vocabulary: dimension
/// `i` counts occurrences of vocabulary word `i`. Texts sharing words get
/// high cosine similarity; disjoint texts get zero.
pub struct VocabEmbedder {
    vocab: Vec<String>,
}

impl VocabEmbedder {
    pub fn new(vocab: &[&str]) -> Self {
        Self {
            vocab: vocab.iter().map(|s| s.to_lowercase()).collect(),
        }
    }

    fn project(&self, text: &str) -> Vec<f32> {
        let lowered = text.to_lowercase();
        let tokens: Vec<&str> = lowered
            .split(|c: char| !c.is_alphanumeric())
            .filter(|s| !s.is_empty())
            .collect();
        self.vocab
            .iter()
            .map(|word| tokens.iter().filter(|t| *t == word).count() as f32)
            .collect()
    }
}

#[async_trait]
impl Embedder for VocabEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        Ok(self.project(text))
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Ok(texts.iter().map(|t| self.project(t)).collect())
    }
}

/// An embedder whose every call fails.
pub struct FailingEmbedder;

#[async_trait]
impl Embedder for FailingEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(EngineError::Embedding("embedder offline".to_string()))
    }

    async fn embed_batch(&self, _texts: &[String]) -> Result<Vec<Vec<f32>>> {
        Err(EngineError::Embedding("embedder offline".to_string()))
    }
}

// ============================================================================
// Index outage stubs
// ============================================================================

/// A dense index whose every call fails.
pub struct FailingDense;

#[async_trait]
impl DenseIndex for FailingDense {
    async fn search(&self, _vector: &[f32], _k: usize) -> Result<Vec<Hit>> {
        Err(EngineError::Index("dense backend down".to_string()))
    }

    async fn upsert(
        &self,
        _chunk_id: &str,
        _vector: Vec<f32>,
        _content: &str,
        _metadata: BTreeMap<String, String>,
    ) -> Result<()> {
        Err(EngineError::Index("dense backend down".to_string()))
    }
}

/// A lexical index whose every call fails.
pub struct FailingLexical;

#[async_trait]
impl LexicalIndex for FailingLexical {
    async fn search(&self, _query: &str, _k: usize) -> Result<Vec<Hit>> {
        Err(EngineError::Index("lexical backend down".to_string()))
    }

    async fn index(
        &self,
        _chunk_id: &str,
        _content: &str,
        _metadata: BTreeMap<String, String>,
    ) -> Result<()> {
        Err(EngineError::Index("lexical backend down".to_string()))
    }
}

/// A lexical index that hangs long enough to trip any run deadline.
pub struct SlowLexical;

#[async_trait]
impl LexicalIndex for SlowLexical {
    async fn search(&self, _query: &str, _k: usize) -> Result<Vec<Hit>> {
        tokio::time::sleep(std::time::Duration::from_secs(3600)).await;
        Ok(Vec::new())
    }

    async fn index(
        &self,
        _chunk_id: &str,
        _content: &str,
        _metadata: BTreeMap<String, String>,
    ) -> Result<()> {
        Ok(())
    }
}

// ============================================================================
// Scripted LLM
// ============================================================================

/// Scripted model client. Each grader is recognized by a stable marker in its
/// system prompt and pops from its own response queue; an exhausted queue
/// repeats the queue's final scripted value, defaulting to "yes".
pub struct ScriptedLlm {
    route: String,
    relevance: Mutex<VecDeque<String>>,
    hallucination: Mutex<VecDeque<String>>,
    answer: Mutex<VecDeque<String>>,
    generation: String,
    expansion: String,
    pub generate_calls: AtomicUsize,
    pub relevance_calls: AtomicUsize,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self {
            route: r#"{"datasource": "vectorstore"}"#.to_string(),
            relevance: Mutex::new(VecDeque::new()),
            hallucination: Mutex::new(VecDeque::new()),
            answer: Mutex::new(VecDeque::new()),
            generation: "The blade tolerance is 0.02 mm.".to_string(),
            expansion: String::new(),
            generate_calls: AtomicUsize::new(0),
            relevance_calls: AtomicUsize::new(0),
        }
    }

    pub fn with_route(mut self, datasource: &str) -> Self {
        self.route = format!(r#"{{"datasource": "{}"}}"#, datasource);
        self
    }

    pub fn with_relevance(self, scores: &[&str]) -> Self {
        *self.relevance.lock() = scores.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_hallucination(self, scores: &[&str]) -> Self {
        *self.hallucination.lock() = scores.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_answer(self, scores: &[&str]) -> Self {
        *self.answer.lock() = scores.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn with_generation(mut self, text: &str) -> Self {
        self.generation = text.to_string();
        self
    }

    pub fn with_expansion(mut self, terms: &str) -> Self {
        self.expansion = terms.to_string();
        self
    }

    pub fn into_arc(self) -> Arc<dyn LlmClient> {
        Arc::new(self)
    }

    fn pop(queue: &Mutex<VecDeque<String>>) -> String {
        let mut queue = queue.lock();
        if queue.len() > 1 {
            queue.pop_front().unwrap()
        } else {
            queue
                .front()
                .cloned()
                .unwrap_or_else(|| r#"{"binary_score": "yes"}"#.to_string())
        }
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    async fn generate(&self, _prompt: &str) -> Result<String> {
        self.generate_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.generation.clone())
    }

    async fn generate_with_system(&self, system: &str, _prompt: &str) -> Result<String> {
        if system.contains("routing a user question") {
            Ok(self.route.clone())
        } else if system.contains("assessing relevance") {
            self.relevance_calls.fetch_add(1, Ordering::SeqCst);
            Ok(Self::pop(&self.relevance))
        } else if system.contains("grounded in") {
            Ok(Self::pop(&self.hallucination))
        } else if system.contains("resolves a question") {
            Ok(Self::pop(&self.answer))
        } else {
            // Query expansion and anything else.
            Ok(self.expansion.clone())
        }
    }

    fn model_name(&self) -> &str {
        "scripted"
    }
}

// ============================================================================
// Web search stub
// ============================================================================

/// A web search provider returning fixed passages.
pub struct StubWebSearch {
    pub results: Vec<String>,
}

#[async_trait]
impl WebSearchProvider for StubWebSearch {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<String>> {
        Ok(self.results.clone())
    }
}

/// A web search provider whose every call fails.
pub struct FailingWebSearch;

#[async_trait]
impl WebSearchProvider for FailingWebSearch {
    async fn search(&self, _query: &str, _limit: usize) -> Result<Vec<String>> {
        Err(EngineError::Internal("search backend down".to_string()))
    }
}
