use thiserror::Error;

/// Top-level error type shared by every analyst crate.
///
/// The remote collaborators (analyst endpoint, completion endpoint, SQL
/// executor) report their failures through the dedicated variants so that
/// callers can decide between fallback and surfacing a visible error turn.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AnalystError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Completion failed: {0}")]
    Completion(String),

    /// The analyst endpoint answered with a non-success status, or the
    /// request could not be completed (`status` is `None` for transport
    /// failures such as a timeout).
    #[error("Analyst request failed ({}): {body}", display_status(.status))]
    RemoteAnalyst { status: Option<u16>, body: String },

    #[error("SQL execution failed: {0}")]
    SqlExecution(String),

    #[error("Malformed analyst response: {0}")]
    MalformedResponse(String),

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

fn display_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => format!("status {}", code),
        None => "no response".to_string(),
    }
}

impl From<toml::de::Error> for AnalystError {
    fn from(err: toml::de::Error) -> Self {
        AnalystError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for AnalystError {
    fn from(err: toml::ser::Error) -> Self {
        AnalystError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for AnalystError {
    fn from(err: serde_json::Error) -> Self {
        AnalystError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for analyst operations.
pub type Result<T> = std::result::Result<T, AnalystError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = AnalystError::Config("missing field".to_string());
        assert_eq!(err.to_string(), "Configuration error: missing field");
    }

    #[test]
    fn test_remote_analyst_display_with_status() {
        let err = AnalystError::RemoteAnalyst {
            status: Some(500),
            body: r#"{"message":"internal error"}"#.to_string(),
        };
        assert_eq!(
            err.to_string(),
            r#"Analyst request failed (status 500): {"message":"internal error"}"#
        );
    }

    #[test]
    fn test_remote_analyst_display_without_status() {
        let err = AnalystError::RemoteAnalyst {
            status: None,
            body: "operation timed out".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Analyst request failed (no response): operation timed out"
        );
    }

    #[test]
    fn test_error_display_all_variants() {
        let cases: Vec<(AnalystError, &str)> = vec![
            (
                AnalystError::Completion("empty response".to_string()),
                "Completion failed: empty response",
            ),
            (
                AnalystError::SqlExecution("invalid identifier".to_string()),
                "SQL execution failed: invalid identifier",
            ),
            (
                AnalystError::MalformedResponse("missing message".to_string()),
                "Malformed analyst response: missing message",
            ),
            (
                AnalystError::Api("bind failed".to_string()),
                "API error: bind failed",
            ),
            (
                AnalystError::Serialization("invalid json".to_string()),
                "Serialization error: invalid json",
            ),
        ];

        for (error, expected) in cases {
            assert_eq!(error.to_string(), expected);
        }
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: AnalystError = io_err.into();
        assert!(matches!(err, AnalystError::Io(_)));
        assert!(err.to_string().starts_with("I/O error:"));
        assert!(err.to_string().contains("file not found"));
    }

    #[test]
    fn test_error_from_toml_de() {
        let bad_toml = "invalid = [[[";
        let err: std::result::Result<toml::Value, _> = toml::from_str(bad_toml);
        let err: AnalystError = err.unwrap_err().into();
        assert!(matches!(err, AnalystError::Config(_)));
    }

    #[test]
    fn test_error_from_serde_json() {
        let err: std::result::Result<serde_json::Value, _> = serde_json::from_str("{ nope }");
        let err: AnalystError = err.unwrap_err().into();
        assert!(matches!(err, AnalystError::Serialization(_)));
    }

    #[test]
    fn test_result_type_with_question_mark() {
        fn inner() -> Result<String> {
            let io_result: std::result::Result<i32, std::io::Error> = Ok(42);
            let value = io_result?;
            Ok(value.to_string())
        }

        assert_eq!(inner().unwrap(), "42");
    }
}
