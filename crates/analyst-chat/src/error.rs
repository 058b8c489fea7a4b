//! Error types for the conversational core.

use analyst_core::error::AnalystError;

/// Errors from the chat engine.
///
/// The four remote failure kinds never escape an action cycle: the
/// orchestrator turns them into a visible assistant turn and reports them on
/// the resulting exchange.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("session not found: {0}")]
    SessionNotFound(uuid::Uuid),
    #[error("suggestion {index} does not exist ({available} offered)")]
    SuggestionOutOfRange { index: usize, available: usize },
    #[error("completion failed: {0}")]
    CompletionFailure(String),
    #[error("analyst request failed ({}): {body}", display_status(.status))]
    RemoteAnalystFailure { status: Option<u16>, body: String },
    #[error("SQL execution failed: {0}")]
    SqlExecutionFailure(String),
    #[error("malformed analyst response: {0}")]
    MalformedResponse(String),
    #[error("internal error: {0}")]
    Internal(String),
}

fn display_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "no response".to_string(),
    }
}

impl ChatError {
    /// Whether this error came from a remote collaborator (as opposed to
    /// input validation or session lookup).
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            ChatError::CompletionFailure(_)
                | ChatError::RemoteAnalystFailure { .. }
                | ChatError::SqlExecutionFailure(_)
                | ChatError::MalformedResponse(_)
        )
    }

    /// Stable snake_case name of the variant.
    pub fn kind(&self) -> &'static str {
        match self {
            ChatError::EmptyMessage => "empty_message",
            ChatError::MessageTooLong(_) => "message_too_long",
            ChatError::SessionNotFound(_) => "session_not_found",
            ChatError::SuggestionOutOfRange { .. } => "suggestion_out_of_range",
            ChatError::CompletionFailure(_) => "completion_failure",
            ChatError::RemoteAnalystFailure { .. } => "remote_analyst_failure",
            ChatError::SqlExecutionFailure(_) => "sql_execution_failure",
            ChatError::MalformedResponse(_) => "malformed_response",
            ChatError::Internal(_) => "internal",
        }
    }
}

impl From<AnalystError> for ChatError {
    fn from(err: AnalystError) -> Self {
        match err {
            AnalystError::Completion(msg) => ChatError::CompletionFailure(msg),
            AnalystError::RemoteAnalyst { status, body } => {
                ChatError::RemoteAnalystFailure { status, body }
            }
            AnalystError::SqlExecution(msg) => ChatError::SqlExecutionFailure(msg),
            AnalystError::MalformedResponse(msg) => ChatError::MalformedResponse(msg),
            other => ChatError::Internal(other.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    #[test]
    fn test_chat_error_display() {
        assert_eq!(ChatError::EmptyMessage.to_string(), "message cannot be empty");
        assert_eq!(
            ChatError::MessageTooLong(2000).to_string(),
            "message exceeds maximum length of 2000 characters"
        );
        assert_eq!(
            ChatError::SuggestionOutOfRange {
                index: 3,
                available: 2
            }
            .to_string(),
            "suggestion 3 does not exist (2 offered)"
        );
        assert_eq!(
            ChatError::SqlExecutionFailure("syntax error".to_string()).to_string(),
            "SQL execution failed: syntax error"
        );
    }

    #[test]
    fn test_remote_analyst_failure_display() {
        let err = ChatError::RemoteAnalystFailure {
            status: Some(500),
            body: r#"{"message":"internal error"}"#.to_string(),
        };
        assert_eq!(
            err.to_string(),
            r#"analyst request failed (500): {"message":"internal error"}"#
        );

        let err = ChatError::RemoteAnalystFailure {
            status: None,
            body: "timed out".to_string(),
        };
        assert_eq!(err.to_string(), "analyst request failed (no response): timed out");
    }

    #[test]
    fn test_session_not_found_preserves_uuid() {
        let id = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        assert_eq!(
            ChatError::SessionNotFound(id).to_string(),
            "session not found: 550e8400-e29b-41d4-a716-446655440000"
        );
    }

    #[test]
    fn test_from_analyst_error_maps_taxonomy() {
        let err: ChatError = AnalystError::RemoteAnalyst {
            status: Some(503),
            body: "busy".to_string(),
        }
        .into();
        match err {
            ChatError::RemoteAnalystFailure { status, body } => {
                assert_eq!(status, Some(503));
                assert_eq!(body, "busy");
            }
            other => panic!("unexpected {other:?}"),
        }

        let err: ChatError = AnalystError::Completion("down".to_string()).into();
        assert!(matches!(err, ChatError::CompletionFailure(_)));

        let err: ChatError = AnalystError::SqlExecution("denied".to_string()).into();
        assert!(matches!(err, ChatError::SqlExecutionFailure(_)));

        let err: ChatError = AnalystError::MalformedResponse("bad".to_string()).into();
        assert!(matches!(err, ChatError::MalformedResponse(_)));

        let err: ChatError = AnalystError::Config("x".to_string()).into();
        assert!(matches!(err, ChatError::Internal(_)));
    }

    #[test]
    fn test_is_remote() {
        assert!(ChatError::CompletionFailure(String::new()).is_remote());
        assert!(ChatError::MalformedResponse(String::new()).is_remote());
        assert!(!ChatError::EmptyMessage.is_remote());
        assert!(!ChatError::SessionNotFound(Uuid::nil()).is_remote());
    }

    #[test]
    fn test_kind_names() {
        assert_eq!(
            ChatError::RemoteAnalystFailure {
                status: None,
                body: String::new()
            }
            .kind(),
            "remote_analyst_failure"
        );
        assert_eq!(ChatError::EmptyMessage.kind(), "empty_message");
    }
}
