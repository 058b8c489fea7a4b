//! Session state store.
//!
//! A [`Session`] owns the transcript of one conversation plus the pending
//! suggestion state. It is a plain value: whoever handles the current action
//! holds it exclusively, so no interior locking is needed.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use analyst_core::config::ChatConfig;
use analyst_core::types::{Role, Turn};

use crate::error::ChatError;

/// Per-session conversation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionConfig {
    pub model_name: String,
    pub use_history: bool,
    /// Number of complete (user, assistant) pairs used for question rewriting.
    pub history_window: usize,
}

impl From<&ChatConfig> for SessionConfig {
    fn from(config: &ChatConfig) -> Self {
        Self {
            model_name: config.model_name.clone(),
            use_history: config.use_history,
            history_window: config.history_window,
        }
    }
}

/// One conversation: ordered turns, offered suggestions and the one-shot
/// suggestion selected for the next cycle.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub id: Uuid,
    pub config: SessionConfig,
    greeting: String,
    turns: Vec<Turn>,
    suggestions: Vec<String>,
    active_suggestion: Option<String>,
    pub started_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
}

impl Session {
    /// Create a session seeded with the assistant greeting.
    pub fn new(greeting: impl Into<String>, config: SessionConfig) -> Self {
        let now = Utc::now();
        let greeting = greeting.into();
        Self {
            id: Uuid::new_v4(),
            config,
            turns: vec![Turn::assistant(greeting.clone(), None)],
            greeting,
            suggestions: Vec::new(),
            active_suggestion: None,
            started_at: now,
            last_active_at: now,
        }
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn greeting(&self) -> &str {
        &self.greeting
    }

    /// Append a turn to the transcript.
    pub fn append(&mut self, turn: Turn) {
        self.last_active_at = Utc::now();
        self.turns.push(turn);
    }

    /// Drop the transcript back to the greeting and forget all suggestions.
    pub fn reset(&mut self) {
        tracing::debug!(session_id = %self.id, turns = self.turns.len(), "Session reset");
        self.turns = vec![Turn::assistant(self.greeting.clone(), None)];
        self.suggestions.clear();
        self.active_suggestion = None;
        self.last_active_at = Utc::now();
    }

    /// The last `n` complete (user, assistant) pairs, oldest first.
    ///
    /// A trailing user turn that has not been answered yet is never part of
    /// the window, nor is the unpaired greeting.
    pub fn history_window(&self, n: usize) -> Vec<Turn> {
        if n == 0 {
            return Vec::new();
        }

        let mut pairs: Vec<(&Turn, &Turn)> = self
            .turns
            .windows(2)
            .filter(|w| w[0].role == Role::User && w[1].role == Role::Assistant)
            .map(|w| (&w[0], &w[1]))
            .collect();

        let skip = pairs.len().saturating_sub(n);
        pairs
            .drain(skip..)
            .flat_map(|(user, assistant)| [user.clone(), assistant.clone()])
            .collect()
    }

    /// Record the options of the latest suggestions item.
    pub fn offer_suggestions(&mut self, options: Vec<String>) {
        self.suggestions = options;
    }

    pub fn suggestions(&self) -> &[String] {
        &self.suggestions
    }

    /// Mark the indexed suggestion for resubmission on the next cycle.
    pub fn select_suggestion(&mut self, index: usize) -> Result<&str, ChatError> {
        let option = self
            .suggestions
            .get(index)
            .cloned()
            .ok_or(ChatError::SuggestionOutOfRange {
                index,
                available: self.suggestions.len(),
            })?;
        self.last_active_at = Utc::now();
        Ok(self.active_suggestion.insert(option).as_str())
    }

    pub fn active_suggestion(&self) -> Option<&str> {
        self.active_suggestion.as_deref()
    }

    /// Consume the pending suggestion. Returns it at most once.
    pub fn take_active_suggestion(&mut self) -> Option<String> {
        self.active_suggestion.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GREETING: &str = "What question do you need assistance answering?";

    fn make_session() -> Session {
        Session::new(GREETING, SessionConfig::from(&ChatConfig::default()))
    }

    fn exchange(session: &mut Session, question: &str, answer: &str) {
        session.append(Turn::user(question));
        session.append(Turn::assistant(answer, Some(format!("req-{}", question))));
    }

    // ---- Construction ----

    #[test]
    fn test_new_session_seeded_with_greeting() {
        let session = make_session();
        assert_eq!(session.turns().len(), 1);
        assert_eq!(session.turns()[0].role, Role::Assistant);
        assert_eq!(session.turns()[0].content, GREETING);
        assert!(session.turns()[0].request_id.is_none());
        assert!(session.suggestions().is_empty());
        assert!(session.active_suggestion().is_none());
    }

    #[test]
    fn test_config_from_chat_config() {
        let chat = ChatConfig {
            model_name: "mistral-large".to_string(),
            use_history: true,
            history_window: 4,
            ..ChatConfig::default()
        };
        let config = SessionConfig::from(&chat);
        assert_eq!(config.model_name, "mistral-large");
        assert!(config.use_history);
        assert_eq!(config.history_window, 4);
    }

    // ---- Append / reset ----

    #[test]
    fn test_append_preserves_order() {
        let mut session = make_session();
        exchange(&mut session, "q1", "a1");
        exchange(&mut session, "q2", "a2");
        let contents: Vec<&str> = session.turns().iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec![GREETING, "q1", "a1", "q2", "a2"]);
    }

    #[test]
    fn test_reset_then_appends_start_with_greeting() {
        let mut session = make_session();
        exchange(&mut session, "q1", "a1");
        session.offer_suggestions(vec!["A".to_string()]);
        session.select_suggestion(0).unwrap();

        session.reset();
        assert_eq!(session.turns().len(), 1);
        assert!(session.suggestions().is_empty());
        assert!(session.active_suggestion().is_none());

        for i in 0..5 {
            exchange(&mut session, &format!("q{}", i), "a");
        }
        assert_eq!(session.turns()[0].content, GREETING);
        assert_eq!(session.turns()[0].role, Role::Assistant);
        assert_eq!(session.turns().len(), 11);
    }

    #[test]
    fn test_reset_keeps_session_id() {
        let mut session = make_session();
        let id = session.id;
        session.reset();
        assert_eq!(session.id, id);
    }

    // ---- History window ----

    #[test]
    fn test_history_window_empty_session() {
        let session = make_session();
        assert!(session.history_window(2).is_empty());
    }

    #[test]
    fn test_history_window_returns_last_pairs() {
        let mut session = make_session();
        exchange(&mut session, "q1", "a1");
        exchange(&mut session, "q2", "a2");
        exchange(&mut session, "q3", "a3");

        let window = session.history_window(2);
        let contents: Vec<&str> = window.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["q2", "a2", "q3", "a3"]);
    }

    #[test]
    fn test_history_window_excludes_in_flight_turn() {
        let mut session = make_session();
        exchange(&mut session, "q1", "a1");
        session.append(Turn::user("q2 pending"));

        let window = session.history_window(5);
        let contents: Vec<&str> = window.iter().map(|t| t.content.as_str()).collect();
        assert_eq!(contents, vec!["q1", "a1"]);
    }

    #[test]
    fn test_history_window_zero() {
        let mut session = make_session();
        exchange(&mut session, "q1", "a1");
        assert!(session.history_window(0).is_empty());
    }

    #[test]
    fn test_history_window_larger_than_available() {
        let mut session = make_session();
        exchange(&mut session, "q1", "a1");
        assert_eq!(session.history_window(10).len(), 2);
    }

    // ---- Suggestions ----

    #[test]
    fn test_select_suggestion_sets_active() {
        let mut session = make_session();
        session.offer_suggestions(vec!["A".to_string(), "B".to_string()]);
        assert_eq!(session.select_suggestion(1).unwrap(), "B");
        assert_eq!(session.active_suggestion(), Some("B"));
    }

    #[test]
    fn test_select_suggestion_out_of_range() {
        let mut session = make_session();
        session.offer_suggestions(vec!["A".to_string()]);
        let err = session.select_suggestion(3).unwrap_err();
        assert!(matches!(
            err,
            ChatError::SuggestionOutOfRange {
                index: 3,
                available: 1
            }
        ));
        assert!(session.active_suggestion().is_none());
    }

    #[test]
    fn test_take_active_suggestion_is_one_shot() {
        let mut session = make_session();
        session.offer_suggestions(vec!["A".to_string()]);
        session.select_suggestion(0).unwrap();
        assert_eq!(session.take_active_suggestion().as_deref(), Some("A"));
        assert_eq!(session.take_active_suggestion(), None);
    }
}
