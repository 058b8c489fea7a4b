//! Recording in-memory collaborators.
//!
//! Each mock answers from a canned script and records what it was asked, so
//! orchestration tests can assert on call counts without a network.

use std::collections::VecDeque;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;

use analyst_core::error::{AnalystError, Result};
use analyst_core::types::{AnalystReply, ExecutionResult};

use crate::service::{AnalystService, CompletionService, SqlExecutor};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Pops the next scripted answer; the last one repeats once the queue drains.
fn next_scripted<T: Clone>(queue: &Mutex<VecDeque<T>>) -> Option<T> {
    let mut queue = lock(queue);
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

// =============================================================================
// MockAnalyst
// =============================================================================

#[derive(Clone, Debug)]
enum AnalystScript {
    Reply(AnalystReply),
    Status(u16, String),
    Malformed(String),
}

/// Analyst endpoint double.
#[derive(Debug, Default)]
pub struct MockAnalyst {
    script: Mutex<VecDeque<AnalystScript>>,
    questions: Mutex<Vec<String>>,
}

impl MockAnalyst {
    /// Always answer with `reply`.
    pub fn replying(reply: AnalystReply) -> Self {
        Self::scripted(vec![reply])
    }

    /// Answer with each reply in turn, repeating the last.
    pub fn scripted(replies: Vec<AnalystReply>) -> Self {
        Self {
            script: Mutex::new(replies.into_iter().map(AnalystScript::Reply).collect()),
            questions: Mutex::new(Vec::new()),
        }
    }

    /// Fail every request with the given HTTP status and body.
    pub fn failing_with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::from([AnalystScript::Status(status, body.into())])),
            questions: Mutex::new(Vec::new()),
        }
    }

    /// Fail every request as an undecodable body.
    pub fn malformed(reason: impl Into<String>) -> Self {
        Self {
            script: Mutex::new(VecDeque::from([AnalystScript::Malformed(reason.into())])),
            questions: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        lock(&self.questions).len()
    }

    /// Questions received, in order.
    pub fn questions(&self) -> Vec<String> {
        lock(&self.questions).clone()
    }
}

#[async_trait]
impl AnalystService for MockAnalyst {
    async fn send_message(&self, question: &str) -> Result<AnalystReply> {
        lock(&self.questions).push(question.to_string());
        match next_scripted(&self.script) {
            Some(AnalystScript::Reply(reply)) => Ok(reply),
            Some(AnalystScript::Status(status, body)) => Err(AnalystError::RemoteAnalyst {
                status: Some(status),
                body,
            }),
            Some(AnalystScript::Malformed(reason)) => Err(AnalystError::MalformedResponse(reason)),
            None => Ok(AnalystReply::default()),
        }
    }
}

// =============================================================================
// MockCompletion
// =============================================================================

/// Completion endpoint double.
#[derive(Debug, Default)]
pub struct MockCompletion {
    replies: Mutex<VecDeque<String>>,
    failure: Option<String>,
    prompts: Mutex<Vec<(String, String)>>,
}

impl MockCompletion {
    /// Always complete with `reply`.
    pub fn replying(reply: impl Into<String>) -> Self {
        Self::scripted(vec![reply.into()])
    }

    /// Complete with each reply in turn, repeating the last.
    pub fn scripted(replies: Vec<String>) -> Self {
        Self {
            replies: Mutex::new(replies.into()),
            failure: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Fail every completion with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            replies: Mutex::new(VecDeque::new()),
            failure: Some(reason.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        lock(&self.prompts).len()
    }

    /// Prompts received, in order.
    pub fn prompts(&self) -> Vec<String> {
        lock(&self.prompts).iter().map(|(_, p)| p.clone()).collect()
    }

    /// Model names received, in order.
    pub fn models(&self) -> Vec<String> {
        lock(&self.prompts).iter().map(|(m, _)| m.clone()).collect()
    }
}

#[async_trait]
impl CompletionService for MockCompletion {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String> {
        lock(&self.prompts).push((model.to_string(), prompt.to_string()));
        if let Some(ref reason) = self.failure {
            return Err(AnalystError::Completion(reason.clone()));
        }
        Ok(next_scripted(&self.replies).unwrap_or_default())
    }
}

// =============================================================================
// MockSqlExecutor
// =============================================================================

/// SQL executor double.
#[derive(Debug, Default)]
pub struct MockSqlExecutor {
    result: ExecutionResult,
    failure: Option<String>,
    statements: Mutex<Vec<String>>,
}

impl MockSqlExecutor {
    /// Return `result` for every statement.
    pub fn returning(result: ExecutionResult) -> Self {
        Self {
            result,
            failure: None,
            statements: Mutex::new(Vec::new()),
        }
    }

    /// Fail every statement with `reason`.
    pub fn failing(reason: impl Into<String>) -> Self {
        Self {
            result: ExecutionResult::default(),
            failure: Some(reason.into()),
            statements: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        lock(&self.statements).len()
    }

    /// Statements received, in order.
    pub fn statements(&self) -> Vec<String> {
        lock(&self.statements).clone()
    }
}

#[async_trait]
impl SqlExecutor for MockSqlExecutor {
    async fn execute(&self, statement: &str) -> Result<ExecutionResult> {
        lock(&self.statements).push(statement.to_string());
        match self.failure {
            Some(ref reason) => Err(AnalystError::SqlExecution(reason.clone())),
            None => Ok(self.result.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyst_core::types::ContentItem;

    #[tokio::test]
    async fn test_mock_analyst_scripted_repeats_last() {
        let first = AnalystReply {
            request_id: Some("r1".to_string()),
            content: vec![],
        };
        let second = AnalystReply {
            request_id: Some("r2".to_string()),
            content: vec![ContentItem::Text {
                text: "hi".to_string(),
            }],
        };
        let mock = MockAnalyst::scripted(vec![first, second]);

        let a = mock.send_message("q1").await.unwrap();
        let b = mock.send_message("q2").await.unwrap();
        let c = mock.send_message("q3").await.unwrap();
        assert_eq!(a.request_id.as_deref(), Some("r1"));
        assert_eq!(b.request_id.as_deref(), Some("r2"));
        assert_eq!(c.request_id.as_deref(), Some("r2"));
        assert_eq!(mock.questions(), vec!["q1", "q2", "q3"]);
    }

    #[tokio::test]
    async fn test_mock_analyst_failing_status() {
        let mock = MockAnalyst::failing_with_status(500, "boom");
        let err = mock.send_message("q").await.unwrap_err();
        assert!(matches!(
            err,
            AnalystError::RemoteAnalyst {
                status: Some(500),
                ..
            }
        ));
        assert_eq!(mock.calls(), 1);
    }

    #[tokio::test]
    async fn test_mock_completion_records_model_and_prompt() {
        let mock = MockCompletion::replying("answer");
        let out = mock.complete("llama3.1-70b", "prompt text").await.unwrap();
        assert_eq!(out, "answer");
        assert_eq!(mock.models(), vec!["llama3.1-70b"]);
        assert_eq!(mock.prompts(), vec!["prompt text"]);
    }

    #[tokio::test]
    async fn test_mock_sql_failing() {
        let mock = MockSqlExecutor::failing("permission denied");
        let err = mock.execute("SELECT 1").await.unwrap_err();
        assert!(matches!(err, AnalystError::SqlExecution(_)));
        assert_eq!(mock.statements(), vec!["SELECT 1"]);
    }
}
