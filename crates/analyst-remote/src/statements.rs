//! SQL REST API client (`/api/v2/statements`).
//!
//! Submits a statement, polls while the warehouse reports it as still
//! running (HTTP 202), then collects every result partition.

use std::collections::BTreeMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use analyst_core::config::ConnectionConfig;
use analyst_core::error::{AnalystError, Result};
use analyst_core::types::ExecutionResult;

use crate::connection::Connection;
use crate::service::SqlExecutor;

const STATEMENTS_PATH: &str = "/api/v2/statements";

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Serialize)]
struct StatementRequest<'a> {
    statement: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    timeout: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    warehouse: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    database: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    schema: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'a str>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    bindings: BTreeMap<String, Binding<'a>>,
}

/// Positional bind variable; the SQL API numbers them from 1.
#[derive(Debug, Serialize)]
struct Binding<'a> {
    #[serde(rename = "type")]
    kind: &'static str,
    value: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StatementResponse {
    result_set_meta_data: Option<ResultSetMetaData>,
    #[serde(default)]
    data: Vec<Vec<Value>>,
    statement_handle: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResultSetMetaData {
    #[serde(default)]
    row_type: Vec<ColumnType>,
    #[serde(default)]
    partition_info: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ColumnType {
    name: String,
}

// =============================================================================
// SqlApiClient
// =============================================================================

/// Timeout sent with a statement. Zero leaves it out of the request.
fn request_timeout(secs: u64) -> Option<u64> {
    (secs > 0).then_some(secs)
}

/// Executes statements through the warehouse SQL REST API.
///
/// There is no client-side deadline on execution; long statements are polled
/// until the warehouse reports completion or failure.
#[derive(Clone, Debug)]
pub struct SqlApiClient {
    conn: Connection,
    warehouse: Option<String>,
    database: Option<String>,
    schema: Option<String>,
    role: Option<String>,
    statement_timeout_secs: u64,
    poll_interval: Duration,
}

impl SqlApiClient {
    pub fn new(conn: Connection, config: &ConnectionConfig) -> Self {
        Self {
            conn,
            warehouse: config.warehouse.clone(),
            database: config.database.clone(),
            schema: config.schema.clone(),
            role: config.role.clone(),
            statement_timeout_secs: config.statement_timeout_secs,
            poll_interval: Duration::from_millis(config.poll_interval_ms),
        }
    }

    /// Execute a statement with positional `?` bind values (all TEXT).
    pub async fn execute_with_bindings(
        &self,
        statement: &str,
        bindings: &[&str],
    ) -> Result<ExecutionResult> {
        let request = StatementRequest {
            statement,
            timeout: request_timeout(self.statement_timeout_secs),
            warehouse: self.warehouse.as_deref(),
            database: self.database.as_deref(),
            schema: self.schema.as_deref(),
            role: self.role.as_deref(),
            bindings: bindings
                .iter()
                .enumerate()
                .map(|(i, value)| {
                    (
                        (i + 1).to_string(),
                        Binding {
                            kind: "TEXT",
                            value: *value,
                        },
                    )
                })
                .collect(),
        };

        let (status, body) = self
            .send(
                self.conn
                    .request(Method::POST, STATEMENTS_PATH)
                    .json(&request),
            )
            .await?;
        let mut response = self.await_completion(status, &body).await?;

        let columns: Vec<String> = response
            .result_set_meta_data
            .as_ref()
            .map(|meta| meta.row_type.iter().map(|c| c.name.clone()).collect())
            .unwrap_or_default();
        let partitions = response
            .result_set_meta_data
            .as_ref()
            .map(|meta| meta.partition_info.len())
            .unwrap_or(0);

        let mut rows = std::mem::take(&mut response.data);
        if partitions > 1 {
            let handle = response.statement_handle.clone().ok_or_else(|| {
                AnalystError::SqlExecution("partitioned result without a statement handle".into())
            })?;
            for partition in 1..partitions {
                let path = format!("{}/{}?partition={}", STATEMENTS_PATH, handle, partition);
                let (status, body) = self.send(self.conn.request(Method::GET, &path)).await?;
                if status != 200 {
                    return Err(sql_failure(status, &body));
                }
                let page = decode(&body)?;
                rows.extend(page.data);
            }
        }

        tracing::debug!(
            columns = columns.len(),
            rows = rows.len(),
            partitions,
            "Statement completed"
        );
        Ok(ExecutionResult::new(columns, rows))
    }

    /// Poll a submitted statement until it stops returning 202.
    async fn await_completion(&self, mut status: u16, body: &str) -> Result<StatementResponse> {
        let mut body = body.to_string();
        loop {
            match status {
                200 => return decode(&body),
                202 => {
                    let pending = decode(&body)?;
                    let handle = pending.statement_handle.ok_or_else(|| {
                        AnalystError::SqlExecution(
                            "statement accepted without a statement handle".into(),
                        )
                    })?;
                    tracing::debug!(handle = %handle, "Statement still running, polling");
                    tokio::time::sleep(self.poll_interval).await;
                    let path = format!("{}/{}", STATEMENTS_PATH, handle);
                    let (next_status, next_body) =
                        self.send(self.conn.request(Method::GET, &path)).await?;
                    status = next_status;
                    body = next_body;
                }
                _ => return Err(sql_failure(status, &body)),
            }
        }
    }

    async fn send(&self, builder: reqwest::RequestBuilder) -> Result<(u16, String)> {
        let resp = builder
            .send()
            .await
            .map_err(|e| AnalystError::SqlExecution(e.to_string()))?;
        let status = resp.status().as_u16();
        let body = resp
            .text()
            .await
            .map_err(|e| AnalystError::SqlExecution(e.to_string()))?;
        Ok((status, body))
    }
}

#[async_trait]
impl SqlExecutor for SqlApiClient {
    async fn execute(&self, statement: &str) -> Result<ExecutionResult> {
        self.execute_with_bindings(statement, &[]).await
    }
}

fn decode(body: &str) -> Result<StatementResponse> {
    serde_json::from_str(body)
        .map_err(|e| AnalystError::SqlExecution(format!("unreadable statement response: {}", e)))
}

/// Error for a non-success status, preferring the API's own message.
fn sql_failure(status: u16, body: &str) -> AnalystError {
    let message = serde_json::from_str::<StatementResponse>(body)
        .ok()
        .and_then(|r| r.message)
        .unwrap_or_else(|| body.to_string());
    AnalystError::SqlExecution(format!("status {}: {}", status, message))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_serialization_skips_unset_fields() {
        let request = StatementRequest {
            statement: "SELECT 1",
            timeout: None,
            warehouse: Some("WH"),
            database: None,
            schema: None,
            role: None,
            bindings: BTreeMap::new(),
        };
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(value["statement"], "SELECT 1");
        assert_eq!(value["warehouse"], "WH");
        assert!(value.get("database").is_none());
        assert!(value.get("bindings").is_none());
        assert!(value.get("timeout").is_none());
    }

    #[test]
    fn test_timeout_only_sent_when_configured() {
        let config = ConnectionConfig::default();
        assert_eq!(request_timeout(config.statement_timeout_secs), None);
        assert_eq!(request_timeout(45), Some(45));
    }

    #[test]
    fn test_bindings_serialize_as_numbered_text() {
        let mut bindings = BTreeMap::new();
        bindings.insert(
            "1".to_string(),
            Binding {
                kind: "TEXT",
                value: "llama3.1-70b",
            },
        );
        let value = serde_json::to_value(&bindings).unwrap();
        assert_eq!(value["1"]["type"], "TEXT");
        assert_eq!(value["1"]["value"], "llama3.1-70b");
    }

    #[test]
    fn test_decode_statement_response() {
        let body = r#"{
            "resultSetMetaData": {
                "numRows": 2,
                "rowType": [{"name": "REGION", "type": "text"}, {"name": "SALES", "type": "fixed"}],
                "partitionInfo": [{"rowCount": 2}]
            },
            "data": [["EAST", "10"], ["WEST", null]],
            "statementHandle": "01b2-handle",
            "code": "090001",
            "message": "Statement executed successfully."
        }"#;
        let response = decode(body).unwrap();
        let meta = response.result_set_meta_data.unwrap();
        assert_eq!(meta.row_type.len(), 2);
        assert_eq!(meta.row_type[0].name, "REGION");
        assert_eq!(meta.partition_info.len(), 1);
        assert_eq!(response.data.len(), 2);
        assert!(response.data[1][1].is_null());
    }

    #[test]
    fn test_sql_failure_prefers_api_message() {
        let body = r#"{"code": "002003", "message": "Object 'NOPE' does not exist."}"#;
        let err = sql_failure(422, body);
        assert_eq!(
            err.to_string(),
            "SQL execution failed: status 422: Object 'NOPE' does not exist."
        );

        let err = sql_failure(502, "bad gateway");
        assert_eq!(err.to_string(), "SQL execution failed: status 502: bad gateway");
    }
}
