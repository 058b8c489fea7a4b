//! Remote collaborator traits.
//!
//! The chat core only talks to the outside world through these three seams,
//! which keeps it testable with the recording mocks in [`crate::mock`].

use async_trait::async_trait;

use analyst_core::error::Result;
use analyst_core::types::{AnalystReply, ExecutionResult};

/// Natural-language-to-SQL analyst endpoint.
#[async_trait]
pub trait AnalystService: Send + Sync {
    /// Send one question and return the normalized reply.
    ///
    /// Fails with `AnalystError::RemoteAnalyst` on a non-success status or a
    /// transport failure, and `AnalystError::MalformedResponse` when the body
    /// cannot be decoded.
    async fn send_message(&self, question: &str) -> Result<AnalystReply>;
}

/// Text-completion endpoint: `(model, prompt) -> text`.
#[async_trait]
pub trait CompletionService: Send + Sync {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String>;
}

/// Executes SQL against the warehouse.
#[async_trait]
pub trait SqlExecutor: Send + Sync {
    async fn execute(&self, statement: &str) -> Result<ExecutionResult>;
}
