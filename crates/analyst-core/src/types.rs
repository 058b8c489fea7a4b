use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// =============================================================================
// Conversation
// =============================================================================

/// Author of a conversation turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message in the conversation transcript.
///
/// Turns are immutable once appended to a session. `request_id` is only
/// present on assistant turns answered through the analyst endpoint.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Turn {
    /// A user turn with the current timestamp.
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
            request_id: None,
            created_at: Utc::now(),
        }
    }

    /// An assistant turn with the current timestamp.
    pub fn assistant(content: impl Into<String>, request_id: Option<String>) -> Self {
        Self {
            role: Role::Assistant,
            content: content.into(),
            request_id,
            created_at: Utc::now(),
        }
    }
}

// =============================================================================
// Analyst responses
// =============================================================================

/// One unit of a parsed analyst response.
///
/// Decoded once at the API boundary from the `type` tag of each item in
/// `message.content`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentItem {
    Text { text: String },
    Suggestions { suggestions: Vec<String> },
    Sql { statement: String },
}

/// Normalized analyst reply: the request id plus the typed content items.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalystReply {
    pub request_id: Option<String>,
    pub content: Vec<ContentItem>,
}

// =============================================================================
// SQL results
// =============================================================================

/// Rows and column names produced by executing a SQL statement.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResult {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

impl ExecutionResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<serde_json::Value>>) -> Self {
        Self { columns, rows }
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// First cell of the first row as text, if any.
    pub fn first_text(&self) -> Option<&str> {
        self.rows
            .first()
            .and_then(|row| row.first())
            .and_then(|cell| cell.as_str())
    }

    /// Render as a pipe-delimited table with a header row.
    ///
    /// Strings are written without JSON quoting and nulls as `NULL`.
    pub fn to_table(&self) -> String {
        let mut lines = Vec::with_capacity(self.rows.len() + 1);
        lines.push(self.columns.join(" | "));
        for row in &self.rows {
            let cells: Vec<String> = row.iter().map(render_cell).collect();
            lines.push(cells.join(" | "));
        }
        lines.join("\n")
    }
}

fn render_cell(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::Null => "NULL".to_string(),
        serde_json::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
