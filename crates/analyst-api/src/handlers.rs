//! Route handler functions for the chat surface.
//!
//! Each handler resolves the session from the registry, locks it for the
//! length of one action cycle and returns JSON.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use analyst_chat::{Action, ChatError, Exchange, Session, SqlInspection};
use analyst_core::types::Turn;

use crate::error::ApiError;
use crate::state::AppState;

// =============================================================================
// Request types
// =============================================================================

/// Request body for POST /sessions/{id}/messages.
#[derive(Debug, Deserialize)]
pub struct MessageRequest {
    pub question: String,
}

// =============================================================================
// Response types
// =============================================================================

#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_secs: u64,
    pub active_sessions: usize,
}

#[derive(Debug, Serialize)]
pub struct SessionResponse {
    pub id: Uuid,
    pub started_at: DateTime<Utc>,
    pub last_active_at: DateTime<Utc>,
    pub turns: Vec<Turn>,
    pub suggestions: Vec<String>,
    pub active_suggestion: Option<String>,
}

impl From<&Session> for SessionResponse {
    fn from(session: &Session) -> Self {
        Self {
            id: session.id,
            started_at: session.started_at,
            last_active_at: session.last_active_at,
            turns: session.turns().to_vec(),
            suggestions: session.suggestions().to_vec(),
            active_suggestion: session.active_suggestion().map(str::to_string),
        }
    }
}

/// Failure reported inside an otherwise successful cycle.
#[derive(Debug, Serialize)]
pub struct ExchangeError {
    pub kind: String,
    pub message: String,
    /// HTTP status returned by the analyst endpoint, when there was one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
}

impl From<&ChatError> for ExchangeError {
    fn from(err: &ChatError) -> Self {
        let status = match err {
            ChatError::RemoteAnalystFailure { status, .. } => *status,
            _ => None,
        };
        Self {
            kind: err.kind().to_string(),
            message: err.to_string(),
            status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ExchangeResponse {
    pub question: String,
    pub answer: String,
    pub request_id: Option<String>,
    pub suggestions: Vec<String>,
    pub inspections: Vec<SqlInspection>,
    pub error: Option<ExchangeError>,
}

impl From<Exchange> for ExchangeResponse {
    fn from(exchange: Exchange) -> Self {
        Self {
            error: exchange.error.as_ref().map(ExchangeError::from),
            question: exchange.question,
            answer: exchange.answer,
            request_id: exchange.request_id,
            suggestions: exchange.suggestions,
            inspections: exchange.inspections,
        }
    }
}

/// Outcome of one action cycle plus the session it left behind.
#[derive(Debug, Serialize)]
pub struct CycleResponse {
    pub exchanges: Vec<ExchangeResponse>,
    pub session: SessionResponse,
}

// =============================================================================
// Handler functions
// =============================================================================

/// GET /health
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: state.start_time.elapsed().as_secs(),
        active_sessions: state.sessions.len(),
    })
}

/// POST /sessions - start a conversation seeded with the greeting.
pub async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionResponse>), ApiError> {
    let session = state.orchestrator.new_session();
    let body = SessionResponse::from(&session);
    state.sessions.insert(session)?;
    Ok((StatusCode::CREATED, Json(body)))
}

/// GET /sessions/{id}
pub async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<SessionResponse>, ApiError> {
    let shared = state.sessions.get(id)?;
    let session = shared.lock().await;
    Ok(Json(SessionResponse::from(&*session)))
}

/// DELETE /sessions/{id}
pub async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    state.sessions.remove(id)?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /sessions/{id}/messages
pub async fn post_message(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<MessageRequest>,
) -> Result<Json<CycleResponse>, ApiError> {
    run_cycle(&state, id, Action::Ask(req.question)).await
}

/// POST /sessions/{id}/suggestions/{index}
pub async fn select_suggestion(
    State(state): State<AppState>,
    Path((id, index)): Path<(Uuid, usize)>,
) -> Result<Json<CycleResponse>, ApiError> {
    run_cycle(&state, id, Action::SelectSuggestion(index)).await
}

/// POST /sessions/{id}/clear
pub async fn clear_session(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CycleResponse>, ApiError> {
    run_cycle(&state, id, Action::ClearHistory).await
}

async fn run_cycle(
    state: &AppState,
    id: Uuid,
    action: Action,
) -> Result<Json<CycleResponse>, ApiError> {
    let shared = state.sessions.get(id)?;
    let mut session = shared.lock().await;

    let exchanges = state.orchestrator.cycle(&mut session, Some(action)).await?;

    Ok(Json(CycleResponse {
        exchanges: exchanges.into_iter().map(ExchangeResponse::from).collect(),
        session: SessionResponse::from(&*session),
    }))
}
