//! Cortex Analyst REST client.
//!
//! Sends a single-message conversation with the configured semantic model and
//! normalizes the reply into [`AnalystReply`].

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde_json::{json, Value};

use analyst_core::config::AnalystEndpointConfig;
use analyst_core::error::{AnalystError, Result};
use analyst_core::types::{AnalystReply, ContentItem};

use crate::connection::Connection;
use crate::service::AnalystService;

const REQUEST_ID_HEADER: &str = "X-Snowflake-Request-Id";

/// Client for `POST /api/v2/cortex/analyst/message`.
#[derive(Clone, Debug)]
pub struct CortexAnalystClient {
    conn: Connection,
    endpoint: String,
    semantic_model_file: String,
    timeout: Duration,
}

impl CortexAnalystClient {
    pub fn new(conn: Connection, config: &AnalystEndpointConfig) -> Self {
        Self {
            conn,
            endpoint: config.endpoint.clone(),
            semantic_model_file: config.semantic_model_file.clone(),
            timeout: Duration::from_millis(config.timeout_ms),
        }
    }

    /// Request envelope for one question.
    pub fn request_body(&self, question: &str) -> Value {
        json!({
            "messages": [{
                "role": "user",
                "content": [{"type": "text", "text": question}],
            }],
            "semantic_model_file": self.semantic_model_file,
        })
    }
}

#[async_trait]
impl AnalystService for CortexAnalystClient {
    async fn send_message(&self, question: &str) -> Result<AnalystReply> {
        tracing::debug!(endpoint = %self.endpoint, "Sending analyst request");

        let resp = self
            .conn
            .request(Method::POST, &self.endpoint)
            .json(&self.request_body(question))
            .timeout(self.timeout)
            .send()
            .await
            .map_err(transport_failure)?;

        let status = resp.status().as_u16();
        let header_request_id = resp
            .headers()
            .get(REQUEST_ID_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = resp.text().await.map_err(transport_failure)?;

        if status >= 400 {
            tracing::warn!(status, "Analyst request failed");
            return Err(AnalystError::RemoteAnalyst {
                status: Some(status),
                body,
            });
        }

        parse_reply(&body, header_request_id)
    }
}

fn transport_failure(err: reqwest::Error) -> AnalystError {
    let body = if err.is_timeout() {
        format!("request timed out: {}", err)
    } else {
        err.to_string()
    };
    AnalystError::RemoteAnalyst { status: None, body }
}

/// Decode an analyst response body.
///
/// Items are decoded one at a time; an item whose `type` is not text,
/// suggestions or sql is skipped. The body's `request_id` wins over the one
/// taken from the response header.
pub fn parse_reply(body: &str, header_request_id: Option<String>) -> Result<AnalystReply> {
    let value: Value = serde_json::from_str(body)
        .map_err(|e| AnalystError::MalformedResponse(format!("body is not JSON: {}", e)))?;

    let items = value
        .pointer("/message/content")
        .and_then(Value::as_array)
        .ok_or_else(|| {
            AnalystError::MalformedResponse("missing message.content array".to_string())
        })?;

    let mut content = Vec::with_capacity(items.len());
    for item in items {
        match serde_json::from_value::<ContentItem>(item.clone()) {
            Ok(decoded) => content.push(decoded),
            Err(e) => {
                let kind = item.get("type").and_then(Value::as_str).unwrap_or("<none>");
                tracing::warn!(kind, error = %e, "Skipping undecodable analyst content item");
            }
        }
    }

    let request_id = value
        .get("request_id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or(header_request_id);

    Ok(AnalystReply {
        request_id,
        content,
    })
}
