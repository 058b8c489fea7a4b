//! Remote collaborators of the analyst chat.
//!
//! Defines the analyst, completion and SQL-executor seams and their REST
//! implementations against the warehouse account, plus recording mocks.

pub mod analyst;
pub mod completion;
pub mod connection;
pub mod mock;
pub mod service;
pub mod statements;

pub use analyst::CortexAnalystClient;
pub use completion::CortexCompletion;
pub use connection::Connection;
pub use mock::{MockAnalyst, MockCompletion, MockSqlExecutor};
pub use service::{AnalystService, CompletionService, SqlExecutor};
pub use statements::SqlApiClient;
