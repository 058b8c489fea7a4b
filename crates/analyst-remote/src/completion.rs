//! Text completion through the warehouse `COMPLETE` function.

use std::sync::Arc;

use async_trait::async_trait;

use analyst_core::error::{AnalystError, Result};

use crate::service::CompletionService;
use crate::statements::SqlApiClient;

const COMPLETE_STATEMENT: &str = "SELECT SNOWFLAKE.CORTEX.COMPLETE(?, ?) AS RESPONSE";

/// Runs `COMPLETE(model, prompt)` as a bound statement and returns the single
/// `RESPONSE` cell.
#[derive(Clone, Debug)]
pub struct CortexCompletion {
    sql: Arc<SqlApiClient>,
}

impl CortexCompletion {
    pub fn new(sql: Arc<SqlApiClient>) -> Self {
        Self { sql }
    }
}

#[async_trait]
impl CompletionService for CortexCompletion {
    async fn complete(&self, model: &str, prompt: &str) -> Result<String> {
        tracing::debug!(model, prompt_chars = prompt.len(), "Requesting completion");
        let result = self
            .sql
            .execute_with_bindings(COMPLETE_STATEMENT, &[model, prompt])
            .await
            .map_err(|e| AnalystError::Completion(e.to_string()))?;

        match result.first_text() {
            Some(text) if !text.trim().is_empty() => Ok(text.to_string()),
            _ => Err(AnalystError::Completion(
                "completion returned no text".to_string(),
            )),
        }
    }
}
