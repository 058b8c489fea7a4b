//! Chat orchestrator: runs one action cycle against a session.
//!
//! A cycle resets the session first when asked to, then answers the submitted
//! question, then polls the pending suggestion once. Every processed question
//! appends exactly one user turn and one assistant turn.

use std::sync::Arc;

use analyst_core::config::ChatConfig;
use analyst_core::types::Turn;
use analyst_remote::{AnalystService, CompletionService, SqlExecutor};

use crate::dispatcher::{ContentDispatcher, DispatchOutcome, SqlInspection, FALLBACK_RESPONSE};
use crate::error::ChatError;
use crate::history::HistorySummarizer;
use crate::narrator::SqlResultSummarizer;
use crate::session::{Session, SessionConfig};

/// A user action handed to [`ChatOrchestrator::cycle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Ask(String),
    SelectSuggestion(usize),
    ClearHistory,
}

/// Result of processing one question.
#[derive(Debug)]
pub struct Exchange {
    /// The question as the user submitted it.
    pub question: String,
    /// Content of the appended assistant turn.
    pub answer: String,
    pub request_id: Option<String>,
    pub suggestions: Vec<String>,
    pub inspections: Vec<SqlInspection>,
    /// Failure that shaped the answer, if any.
    pub error: Option<ChatError>,
}

/// Central coordinator wiring the summarizer, the analyst and the dispatcher.
pub struct ChatOrchestrator {
    analyst: Arc<dyn AnalystService>,
    history: HistorySummarizer,
    dispatcher: ContentDispatcher,
    config: ChatConfig,
}

impl ChatOrchestrator {
    pub fn new(
        config: ChatConfig,
        analyst: Arc<dyn AnalystService>,
        completion: Arc<dyn CompletionService>,
        executor: Arc<dyn SqlExecutor>,
    ) -> Self {
        let narrator = SqlResultSummarizer::new(executor, completion.clone());
        Self {
            analyst,
            history: HistorySummarizer::new(completion),
            dispatcher: ContentDispatcher::new(narrator, config.show_sql),
            config,
        }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    /// A fresh session seeded with the configured greeting.
    pub fn new_session(&self) -> Session {
        Session::new(self.config.greeting.clone(), SessionConfig::from(&self.config))
    }

    /// Run one action cycle.
    ///
    /// Validation and selection errors are returned before the session is
    /// touched. Remote failures never fail the cycle; they are recorded on the
    /// returned exchange and in the assistant turn.
    pub async fn cycle(
        &self,
        session: &mut Session,
        action: Option<Action>,
    ) -> Result<Vec<Exchange>, ChatError> {
        let mut exchanges = Vec::new();

        match action {
            Some(Action::ClearHistory) => session.reset(),
            Some(Action::Ask(question)) => {
                self.validate(&question)?;
                exchanges.push(self.process(session, question).await);
            }
            Some(Action::SelectSuggestion(index)) => {
                let chosen = session.select_suggestion(index)?.to_string();
                tracing::info!(session_id = %session.id, index, suggestion = %chosen, "Suggestion selected");
            }
            None => {}
        }

        if let Some(suggestion) = session.take_active_suggestion() {
            exchanges.push(self.process(session, suggestion).await);
        }

        Ok(exchanges)
    }

    fn validate(&self, question: &str) -> Result<(), ChatError> {
        if question.trim().is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if question.chars().count() > self.config.max_message_length {
            return Err(ChatError::MessageTooLong(self.config.max_message_length));
        }
        Ok(())
    }

    async fn process(&self, session: &mut Session, question: String) -> Exchange {
        let history = session.history_window(session.config.history_window);
        session.append(Turn::user(question.clone()));

        let (answer, request_id, outcome, error) = self.answer(session, &history, &question).await;

        if let Some(ref err) = error {
            tracing::warn!(session_id = %session.id, error = %err, "Question answered with error");
        } else {
            tracing::info!(
                session_id = %session.id,
                request_id = request_id.as_deref().unwrap_or("-"),
                statements = outcome.inspections.len(),
                suggestions = outcome.suggestions.len(),
                "Question answered"
            );
        }

        session.offer_suggestions(outcome.suggestions.clone());
        session.append(Turn::assistant(answer.clone(), request_id.clone()));

        Exchange {
            question,
            answer,
            request_id,
            suggestions: outcome.suggestions,
            inspections: outcome.inspections,
            error,
        }
    }

    /// Summarize, ask the analyst and dispatch. Returns the assistant text,
    /// the analyst request id, the dispatch outcome and the failure, if any.
    async fn answer(
        &self,
        session: &Session,
        history: &[Turn],
        question: &str,
    ) -> (String, Option<String>, DispatchOutcome, Option<ChatError>) {
        let model = session.config.model_name.as_str();

        let sent = match self
            .history
            .summarize(model, history, question, session.config.use_history)
            .await
        {
            Ok(rewritten) => rewritten,
            Err(err) if self.config.fallback_to_raw_question => {
                tracing::warn!(error = %err, "Rewrite failed, sending the question as asked");
                question.to_string()
            }
            Err(err) => return (err.to_string(), None, DispatchOutcome::default(), Some(err)),
        };

        let reply = match self.analyst.send_message(&sent).await {
            Ok(reply) => reply,
            Err(err) => {
                let err = ChatError::from(err);
                let answer = match err {
                    ChatError::MalformedResponse(_) => FALLBACK_RESPONSE.to_string(),
                    ref other => other.to_string(),
                };
                return (answer, None, DispatchOutcome::default(), Some(err));
            }
        };

        match self.dispatcher.dispatch(model, &sent, &reply.content).await {
            Ok(outcome) => (outcome.response_text.clone(), reply.request_id, outcome, None),
            Err(failure) => (
                failure.error.to_string(),
                reply.request_id,
                failure.partial,
                Some(failure.error),
            ),
        }
    }
}
