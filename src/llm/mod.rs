//! Language-model client abstraction.
//!
//! The engine never talks to a provider directly; callers inject an
//! implementation of [`LlmClient`] (OpenAI-compatible HTTP, a local runtime,
//! a test stub). Structured classification outputs are requested via prompt
//! and parsed by the grading agents, so the trait surface stays plain-text.

use async_trait::async_trait;

use crate::types::Result;

/// Generic language-model client trait for provider abstraction.
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Generate a completion from a single prompt.
    async fn generate(&self, prompt: &str) -> Result<String>;

    /// Generate a completion with a system prompt.
    async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;

    /// Model name/identifier, used in logs.
    fn model_name(&self) -> &str;
}

#[cfg(test)]
mockall::mock! {
    pub Llm {}

    #[async_trait]
    impl LlmClient for Llm {
        async fn generate(&self, prompt: &str) -> Result<String>;
        async fn generate_with_system(&self, system: &str, prompt: &str) -> Result<String>;
        fn model_name(&self) -> &str;
    }
}
