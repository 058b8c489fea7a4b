use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{AnalystError, Result};

/// Top-level configuration for the analyst chat service.
///
/// Loaded from `~/.analyst/config.toml` by default. Every section falls back
/// to its defaults when absent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnalystConfig {
    #[serde(default)]
    pub general: GeneralConfig,
    #[serde(default)]
    pub connection: ConnectionConfig,
    #[serde(default)]
    pub analyst: AnalystEndpointConfig,
    #[serde(default)]
    pub chat: ChatConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

impl AnalystConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: AnalystConfig = toml::from_str(&content)?;
        info!("Configuration loaded from {}", path.display());
        Ok(config)
    }

    /// Load configuration, falling back to defaults if the file is missing
    /// or invalid.
    pub fn load_or_default(path: &Path) -> Self {
        match Self::load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(
                    "Failed to load config from {}: {}. Using defaults.",
                    path.display(),
                    e
                );
                Self::default()
            }
        }
    }

    /// Save the configuration to a TOML file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content =
            toml::to_string_pretty(self).map_err(|e| AnalystError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        info!("Configuration saved to {}", path.display());
        Ok(())
    }

    /// Check the values the remote clients cannot work without.
    pub fn validate(&self) -> Result<()> {
        if self.connection.account_url.trim().is_empty() {
            return Err(AnalystError::Config(
                "connection.account_url must be set".to_string(),
            ));
        }
        if self.analyst.semantic_model_file.trim().is_empty() {
            return Err(AnalystError::Config(
                "analyst.semantic_model_file must be set".to_string(),
            ));
        }
        if self.analyst.timeout_ms == 0 {
            return Err(AnalystError::Config(
                "analyst.timeout_ms must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log level: trace, debug, info, warn, error.
    pub log_level: String,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}

/// Warehouse account connection used by every REST call.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ConnectionConfig {
    /// Account base URL, e.g. `https://myorg-myaccount.snowflakecomputing.com`.
    pub account_url: String,
    /// Bearer token. `SNOWFLAKE_TOKEN` overrides it at startup.
    pub token: String,
    /// `KEYPAIR_JWT`, `OAUTH` or `PROGRAMMATIC_ACCESS_TOKEN`.
    pub token_type: String,
    pub warehouse: Option<String>,
    pub database: Option<String>,
    pub schema: Option<String>,
    pub role: Option<String>,
    /// Optional server-side statement timeout in seconds. Off by default:
    /// 0 leaves the timeout out of the request, so statements run under the
    /// account's own limit and the client sets none.
    pub statement_timeout_secs: u64,
    /// Interval between polls of a statement that is still running.
    pub poll_interval_ms: u64,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            account_url: String::new(),
            token: String::new(),
            token_type: "KEYPAIR_JWT".to_string(),
            warehouse: None,
            database: None,
            schema: None,
            role: None,
            statement_timeout_secs: 0,
            poll_interval_ms: 500,
        }
    }
}

/// Analyst endpoint settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalystEndpointConfig {
    /// REST path of the analyst message endpoint.
    pub endpoint: String,
    /// Staged semantic model, e.g. `@DB.SCHEMA.STAGE/model.yml`.
    pub semantic_model_file: String,
    /// Request timeout in milliseconds.
    pub timeout_ms: u64,
}

impl Default for AnalystEndpointConfig {
    fn default() -> Self {
        Self {
            endpoint: "/api/v2/cortex/analyst/message".to_string(),
            semantic_model_file: String::new(),
            timeout_ms: 50_000,
        }
    }
}

/// Conversation behaviour.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Completion model used for question rewriting and result narration.
    pub model_name: String,
    /// Rewrite follow-up questions with prior turns before asking the analyst.
    pub use_history: bool,
    /// Number of complete (user, assistant) pairs fed to the rewrite.
    pub history_window: usize,
    /// Seeded assistant message of a fresh or reset session.
    pub greeting: String,
    /// Expose generated SQL statements to the view layer.
    pub show_sql: bool,
    /// Ask with the raw question when the history rewrite fails.
    pub fallback_to_raw_question: bool,
    /// Maximum question length in characters.
    pub max_message_length: usize,
    /// Idle minutes after which a session is evicted.
    pub session_timeout_minutes: u32,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            model_name: "llama3.1-70b".to_string(),
            use_history: false,
            history_window: 2,
            greeting: "What question do you need assistance answering?".to_string(),
            show_sql: true,
            fallback_to_raw_question: true,
            max_message_length: 2000,
            session_timeout_minutes: 30,
        }
    }
}

/// HTTP chat surface settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Bearer token required on protected routes. Generated when empty.
    pub api_token: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3040,
            api_token: String::new(),
        }
    }
}
