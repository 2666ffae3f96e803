//! Language-model collaborator
//!
//! The crawl produces one block of site text; this module turns a question
//! plus that text into an [`Answer`] through a hosted model. The
//! [`ModelQuery`] trait is the seam the API depends on, so tests can swap in
//! a canned implementation.

mod gemini;
mod prompt;

pub use gemini::GeminiClient;
pub use prompt::{build_prompt, parse_response, truncate_context, FOLLOW_UP_MARKER};

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Maximum number of follow-up questions returned with an answer
pub const MAX_FOLLOW_UPS: usize = 3;

/// A model answer, as returned to API clients
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Answer {
    pub answer: String,
    pub follow_up_questions: Vec<String>,
}

/// Failures talking to the model
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("model API returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("model returned no text")]
    EmptyResponse,
}

/// Generates answers from site content
#[async_trait]
pub trait ModelQuery: Send + Sync {
    /// Answers `question` using only `context`
    ///
    /// Truncating `context` to the model's budget is the implementation's
    /// job, not the caller's.
    async fn generate_answer(
        &self,
        question: &str,
        context: &str,
        max_output_tokens: u32,
    ) -> Result<Answer, ModelError>;
}

/// Asks `model` and folds any failure into the answer text
///
/// A model failure is shown to the user as an answer, never as an API error.
pub async fn answer_or_error(
    model: &dyn ModelQuery,
    question: &str,
    context: &str,
    max_output_tokens: u32,
) -> Answer {
    match model
        .generate_answer(question, context, max_output_tokens)
        .await
    {
        Ok(answer) => answer,
        Err(e) => {
            tracing::error!("Error generating response: {}", e);
            Answer {
                answer: format!("Error generating response: {}", e),
                follow_up_questions: Vec::new(),
            }
        }
    }
}
