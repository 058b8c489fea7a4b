//! HTTP chat surface over the analyst orchestrator.
//!
//! Sessions are created, questioned and cleared over JSON; every protected
//! route requires the configured bearer token.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod state;

pub use error::ApiError;
pub use routes::{create_router, start_server};
pub use state::AppState;
