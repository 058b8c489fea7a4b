//! SQL result summarizer: runs a generated statement and asks the completion
//! endpoint to narrate the rows.

use std::sync::Arc;

use analyst_core::types::ExecutionResult;
use analyst_remote::{CompletionService, SqlExecutor};

use crate::error::ChatError;
use crate::prompts;

pub struct SqlResultSummarizer {
    executor: Arc<dyn SqlExecutor>,
    completion: Arc<dyn CompletionService>,
}

impl SqlResultSummarizer {
    pub fn new(executor: Arc<dyn SqlExecutor>, completion: Arc<dyn CompletionService>) -> Self {
        Self {
            executor,
            completion,
        }
    }

    /// Narrate an already executed result set. The completion text is
    /// returned as is; empty results are narrated too.
    pub async fn narrate(
        &self,
        model: &str,
        question: &str,
        result: &ExecutionResult,
        statement: &str,
    ) -> Result<String, ChatError> {
        let prompt = prompts::narration_prompt(question, result, statement);
        tracing::debug!(model, prompt = %prompt, "Narration prompt");
        Ok(self.completion.complete(model, &prompt).await?)
    }

    /// Execute `statement` and narrate its result.
    pub async fn execute_and_narrate(
        &self,
        model: &str,
        question: &str,
        statement: &str,
    ) -> Result<(ExecutionResult, String), ChatError> {
        let result = self.executor.execute(statement).await?;
        tracing::info!(
            rows = result.rows.len(),
            columns = result.columns.len(),
            "Statement executed"
        );
        let narration = self.narrate(model, question, &result, statement).await?;
        Ok((result, narration))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use analyst_remote::{MockCompletion, MockSqlExecutor};
    use serde_json::json;

    fn one_row() -> ExecutionResult {
        ExecutionResult::new(vec!["N".to_string()], vec![vec![json!("1")]])
    }

    #[tokio::test]
    async fn test_execute_and_narrate_calls_each_collaborator_once() {
        let executor = Arc::new(MockSqlExecutor::returning(one_row()));
        let completion = Arc::new(MockCompletion::replying("- There is one row."));
        let narrator = SqlResultSummarizer::new(executor.clone(), completion.clone());

        let (result, text) = narrator
            .execute_and_narrate("m", "how many?", "SELECT 1 AS N")
            .await
            .unwrap();

        assert_eq!(text, "- There is one row.");
        assert_eq!(result, one_row());
        assert_eq!(executor.statements(), vec!["SELECT 1 AS N"]);
        assert_eq!(completion.calls(), 1);
        assert!(completion.prompts()[0].contains("SELECT 1 AS N"));
    }

    #[tokio::test]
    async fn test_empty_result_is_still_narrated() {
        let executor = Arc::new(MockSqlExecutor::returning(ExecutionResult::new(
            vec!["N".to_string()],
            vec![],
        )));
        let completion = Arc::new(MockCompletion::replying("No rows matched."));
        let narrator = SqlResultSummarizer::new(executor, completion.clone());

        let (result, text) = narrator
            .execute_and_narrate("m", "q", "SELECT N FROM T WHERE 1=0")
            .await
            .unwrap();
        assert!(result.is_empty());
        assert_eq!(text, "No rows matched.");
        assert_eq!(completion.calls(), 1);
    }

    #[tokio::test]
    async fn test_narration_text_is_not_trimmed() {
        let executor = Arc::new(MockSqlExecutor::returning(one_row()));
        let completion = Arc::new(MockCompletion::replying("  spaced \n"));
        let narrator = SqlResultSummarizer::new(executor, completion);

        let (_, text) = narrator.execute_and_narrate("m", "q", "SELECT 1").await.unwrap();
        assert_eq!(text, "  spaced \n");
    }

    #[tokio::test]
    async fn test_execution_failure_skips_completion() {
        let executor = Arc::new(MockSqlExecutor::failing("invalid identifier"));
        let completion = Arc::new(MockCompletion::replying("unused"));
        let narrator = SqlResultSummarizer::new(executor, completion.clone());

        let err = narrator
            .execute_and_narrate("m", "q", "SELECT BAD")
            .await
            .unwrap_err();
        assert!(matches!(err, ChatError::SqlExecutionFailure(_)));
        assert_eq!(completion.calls(), 0);
    }
}
