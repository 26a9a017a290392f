//! Grading agents.
//!
//! Each agent wraps one structured-output language-model call and returns a
//! constrained classification. All agents are stateless request/response
//! wrappers around an injected [`LlmClient`](crate::llm::LlmClient).
//!
//! Classifications are tagged types with an explicit failed/unparseable case
//! rather than errors: a grader that cannot produce a verdict must not take
//! down the workflow, so the unusable case maps to the permissive default at
//! each call site.

pub mod answer;
pub mod hallucination;
pub mod relevance;
pub mod router;

pub use answer::AnswerGrader;
pub use hallucination::HallucinationGrader;
pub use relevance::RelevanceGrader;
pub use router::{QueryRouter, RouteDecision};

use serde::Deserialize;

/// Outcome of a binary grading call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Grade {
    /// The model affirmed the property under test.
    Yes,
    /// The model denied it.
    No,
    /// The call failed or the output could not be parsed.
    Unknown,
}

impl Grade {
    /// Collapse to a boolean, treating `Unknown` as the permissive yes.
    /// Availability is favored over strictness when grading itself fails.
    pub fn permissive(self) -> bool {
        !matches!(self, Grade::No)
    }

    /// Parse a model response into a grade.
    ///
    /// Accepts the strict JSON form `{"binary_score": "yes"}` first, then
    /// falls back to scanning free-form output for a bare yes/no token.
    pub fn parse(raw: &str) -> Self {
        #[derive(Deserialize)]
        struct BinaryScore {
            binary_score: String,
        }

        let cleaned = strip_code_fences(raw);

        if let Ok(parsed) = serde_json::from_str::<BinaryScore>(cleaned) {
            return match parsed.binary_score.trim().to_lowercase().as_str() {
                "yes" => Grade::Yes,
                "no" => Grade::No,
                _ => Grade::Unknown,
            };
        }

        // Token scan: the first standalone yes/no decides.
        for word in cleaned
            .to_lowercase()
            .split(|c: char| !c.is_alphanumeric())
        {
            match word {
                "yes" => return Grade::Yes,
                "no" => return Grade::No,
                _ => {}
            }
        }

        Grade::Unknown
    }
}

/// Drop a surrounding markdown code fence, if any. Models regularly wrap
/// JSON answers in one despite instructions.
pub(crate) fn strip_code_fences(raw: &str) -> &str {
    let trimmed = raw.trim();
    let Some(rest) = trimmed.strip_prefix("```") else {
        return trimmed;
    };
    let rest = rest.strip_prefix("json").unwrap_or(rest);
    rest.strip_suffix("```").unwrap_or(rest).trim()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(r#"{"binary_score": "yes"}"#, Grade::Yes)]
    #[case(r#"{"binary_score": "no"}"#, Grade::No)]
    #[case(r#"{"binary_score": "YES"}"#, Grade::Yes)]
    #[case("```json\n{\"binary_score\": \"no\"}\n```", Grade::No)]
    #[case("yes", Grade::Yes)]
    #[case("  Yes, the document is relevant.", Grade::Yes)]
    #[case("No.", Grade::No)]
    #[case("The answer is no", Grade::No)]
    #[case("definitely maybe", Grade::Unknown)]
    #[case("", Grade::Unknown)]
    fn parses_model_output(#[case] raw: &str, #[case] expected: Grade) {
        assert_eq!(Grade::parse(raw), expected);
    }

    #[test]
    fn unknown_is_permissive() {
        assert!(Grade::Yes.permissive());
        assert!(Grade::Unknown.permissive());
        assert!(!Grade::No.permissive());
    }

    #[test]
    fn nonsense_binary_score_is_unknown() {
        assert_eq!(Grade::parse(r#"{"binary_score": "perhaps"}"#), Grade::Unknown);
    }
}
