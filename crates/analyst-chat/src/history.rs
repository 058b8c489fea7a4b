//! History summarizer: folds a follow-up question and its preceding turns into
//! one self-contained question.

use std::sync::Arc;

use analyst_core::types::Turn;
use analyst_remote::CompletionService;

use crate::error::ChatError;
use crate::prompts;

/// Phrase the completion model tends to append to rewritten questions.
const BOILERPLATE: &str = "or supporting documentation";

/// Straight and typographic quote marks removed from rewrites.
const QUOTES: [char; 6] = ['\'', '"', '\u{2018}', '\u{2019}', '\u{201C}', '\u{201D}'];

pub struct HistorySummarizer {
    completion: Arc<dyn CompletionService>,
}

impl HistorySummarizer {
    pub fn new(completion: Arc<dyn CompletionService>) -> Self {
        Self { completion }
    }

    /// Rewrite `question` in the light of `history`.
    ///
    /// With history disabled or empty the question is returned unchanged and
    /// the completion endpoint is not called.
    pub async fn summarize(
        &self,
        model: &str,
        history: &[Turn],
        question: &str,
        use_history: bool,
    ) -> Result<String, ChatError> {
        if !use_history || history.is_empty() {
            return Ok(question.to_string());
        }

        let prompt = prompts::rewrite_prompt(history, question);
        tracing::debug!(model, prompt = %prompt, "Rewrite prompt");

        let raw = self.completion.complete(model, &prompt).await?;
        let rewritten = clean(&raw);
        if rewritten.is_empty() {
            return Err(ChatError::CompletionFailure(
                "completion returned an empty rewrite".to_string(),
            ));
        }

        tracing::debug!(question, rewritten = %rewritten, "Question rewritten");
        Ok(rewritten)
    }
}

fn clean(raw: &str) -> String {
    raw.replace(QUOTES, "")
        .replace(BOILERPLATE, "")
        .trim()
        .to_string()
}
