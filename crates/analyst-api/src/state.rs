//! Application state shared across all route handlers.

use std::sync::Arc;
use std::time::Instant;

use analyst_chat::{ChatOrchestrator, SessionRegistry};
use analyst_core::config::AnalystConfig;

/// Shared application state.
///
/// All fields are cheap to clone; sessions carry their own locks.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AnalystConfig>,
    pub orchestrator: Arc<ChatOrchestrator>,
    pub sessions: Arc<SessionRegistry>,
    /// Bearer token required on protected routes.
    pub api_token: String,
    pub start_time: Instant,
}

impl AppState {
    pub fn new(config: AnalystConfig, orchestrator: ChatOrchestrator) -> Self {
        let sessions = SessionRegistry::from_minutes(config.chat.session_timeout_minutes);
        Self {
            api_token: config.server.api_token.clone(),
            config: Arc::new(config),
            orchestrator: Arc::new(orchestrator),
            sessions: Arc::new(sessions),
            start_time: Instant::now(),
        }
    }
}
