//! Content dispatcher: turns the analyst's typed content items into the
//! assistant's answer.

use serde::Serialize;

use analyst_core::types::{ContentItem, ExecutionResult};

use crate::error::ChatError;
use crate::narrator::SqlResultSummarizer;
use crate::view::ResultView;

/// Answer used when the analyst returned nothing usable.
pub const FALLBACK_RESPONSE: &str = "Please refine that question.";

/// An executed statement kept for inspection next to the chat.
#[derive(Debug, Clone, Serialize)]
pub struct SqlInspection {
    /// Only present when SQL display is enabled.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub statement: Option<String>,
    pub result: ExecutionResult,
    pub view: ResultView,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct DispatchOutcome {
    pub response_text: String,
    pub suggestions: Vec<String>,
    pub inspections: Vec<SqlInspection>,
}

impl DispatchOutcome {
    pub fn fallback() -> Self {
        Self {
            response_text: FALLBACK_RESPONSE.to_string(),
            ..Self::default()
        }
    }
}

/// A dispatch that stopped on a failing item.
///
/// `partial` keeps what the items before the failure produced, so offered
/// suggestions and earlier inspections survive.
#[derive(Debug)]
pub struct DispatchFailure {
    pub partial: DispatchOutcome,
    pub error: ChatError,
}

pub struct ContentDispatcher {
    narrator: SqlResultSummarizer,
    show_sql: bool,
}

impl ContentDispatcher {
    pub fn new(narrator: SqlResultSummarizer, show_sql: bool) -> Self {
        Self { narrator, show_sql }
    }

    /// Process `items` in order. The last item that sets text wins.
    ///
    /// A failing statement or narration stops processing of the remaining
    /// items and returns the outcome built so far alongside the error.
    pub async fn dispatch(
        &self,
        model: &str,
        question: &str,
        items: &[ContentItem],
    ) -> Result<DispatchOutcome, DispatchFailure> {
        if items.is_empty() {
            return Ok(DispatchOutcome::fallback());
        }

        let mut outcome = DispatchOutcome::default();
        for item in items {
            match item {
                ContentItem::Text { text } => {
                    outcome.response_text = text.clone();
                }
                ContentItem::Suggestions { suggestions } => {
                    outcome.response_text.clear();
                    outcome.suggestions = suggestions.clone();
                }
                ContentItem::Sql { statement } => {
                    tracing::debug!(statement = %statement, "Dispatching generated SQL");
                    let (result, narration) = match self
                        .narrator
                        .execute_and_narrate(model, question, statement)
                        .await
                    {
                        Ok(done) => done,
                        Err(error) => {
                            return Err(DispatchFailure {
                                partial: outcome,
                                error,
                            })
                        }
                    };
                    outcome.response_text = narration;
                    outcome.inspections.push(SqlInspection {
                        statement: self.show_sql.then(|| statement.clone()),
                        view: ResultView::for_result(&result),
                        result,
                    });
                }
            }
        }
        Ok(outcome)
    }
}
