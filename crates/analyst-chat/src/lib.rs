//! Conversational core of the analyst chat.
//!
//! Holds session state, rewrites follow-up questions, dispatches analyst
//! content items, narrates executed SQL and runs the per-action cycle.

pub mod dispatcher;
pub mod error;
pub mod history;
pub mod narrator;
pub mod orchestrator;
pub mod prompts;
pub mod registry;
pub mod session;
pub mod view;

pub use dispatcher::{
    ContentDispatcher, DispatchFailure, DispatchOutcome, SqlInspection, FALLBACK_RESPONSE,
};
pub use error::ChatError;
pub use history::HistorySummarizer;
pub use narrator::SqlResultSummarizer;
pub use orchestrator::{Action, ChatOrchestrator, Exchange};
pub use registry::{SessionRegistry, SharedSession};
pub use session::{Session, SessionConfig};
pub use view::{chart_series, ChartSeries, ResultTab, ResultView};
