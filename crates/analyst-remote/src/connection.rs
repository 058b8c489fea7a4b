//! Authenticated HTTP connection to the warehouse account.

use reqwest::{Method, RequestBuilder};

use analyst_core::config::ConnectionConfig;
use analyst_core::error::{AnalystError, Result};

const USER_AGENT: &str = concat!("analyst-chat/", env!("CARGO_PKG_VERSION"));

/// Shared `reqwest` client plus the account URL and credentials.
///
/// Cheap to clone; every REST client in this crate holds one.
#[derive(Clone, Debug)]
pub struct Connection {
    http: reqwest::Client,
    base_url: String,
    token: String,
    token_type: String,
}

impl Connection {
    pub fn new(
        base_url: impl Into<String>,
        token: impl Into<String>,
        token_type: impl Into<String>,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AnalystError::Config(format!("failed to build HTTP client: {}", e)))?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: token.into(),
            token_type: token_type.into(),
        })
    }

    pub fn from_config(config: &ConnectionConfig) -> Result<Self> {
        Self::new(
            config.account_url.clone(),
            config.token.clone(),
            config.token_type.clone(),
        )
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for a REST path (`/api/v2/...`).
    pub fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Start a request with the JSON and authorization headers applied.
    pub fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let mut builder = self
            .http
            .request(method, self.url(path))
            .header("Accept", "application/json");
        if !self.token.is_empty() {
            builder = builder
                .bearer_auth(&self.token)
                .header("X-Snowflake-Authorization-Token-Type", &self.token_type);
        }
        builder
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joins_paths() {
        let conn = Connection::new("https://acme.example.com/", "t", "OAUTH").unwrap();
        assert_eq!(conn.base_url(), "https://acme.example.com");
        assert_eq!(
            conn.url("/api/v2/statements"),
            "https://acme.example.com/api/v2/statements"
        );
        assert_eq!(
            conn.url("api/v2/statements"),
            "https://acme.example.com/api/v2/statements"
        );
    }

    #[test]
    fn test_from_config() {
        let config = ConnectionConfig {
            account_url: "https://acme.example.com".to_string(),
            token: "secret".to_string(),
            ..ConnectionConfig::default()
        };
        let conn = Connection::from_config(&config).unwrap();
        assert_eq!(conn.token_type, "KEYPAIR_JWT");
    }
}
