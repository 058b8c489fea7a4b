//! Analyst chat binary - composition root.
//!
//! 1. Parse CLI flags and load the TOML configuration
//! 2. Initialize tracing
//! 3. Build the warehouse clients and the chat orchestrator
//! 4. Run the HTTP API (`serve`) or the terminal chat (`chat`)

mod cli;
mod repl;

use std::sync::Arc;

use clap::Parser;

use analyst_api::auth::generate_token;
use analyst_api::routes;
use analyst_api::state::AppState;
use analyst_chat::ChatOrchestrator;
use analyst_core::config::AnalystConfig;
use analyst_core::error::AnalystError;
use analyst_remote::{Connection, CortexAnalystClient, CortexCompletion, SqlApiClient};

use cli::{CliArgs, Command};

/// Wire the REST clients into an orchestrator.
fn build_orchestrator(config: &AnalystConfig) -> Result<ChatOrchestrator, AnalystError> {
    let conn = Connection::from_config(&config.connection)?;
    let sql = Arc::new(SqlApiClient::new(conn.clone(), &config.connection));
    let completion = Arc::new(CortexCompletion::new(Arc::clone(&sql)));
    let analyst = Arc::new(CortexAnalystClient::new(conn, &config.analyst));

    tracing::info!(
        account = %config.connection.account_url,
        semantic_model = %config.analyst.semantic_model_file,
        model = %config.chat.model_name,
        use_history = config.chat.use_history,
        "Warehouse clients ready"
    );

    Ok(ChatOrchestrator::new(
        config.chat.clone(),
        analyst,
        completion,
        sql,
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = CliArgs::parse();

    let config_file = args.resolve_config_path();
    let mut config = AnalystConfig::load_or_default(&config_file);

    // Tracing. RUST_LOG wins over flag and config.
    let level = args.resolve_log_level(&config.general.log_level);
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(level)),
        )
        .init();

    tracing::info!("Starting analyst v{}", env!("CARGO_PKG_VERSION"));

    if args.command == Command::Init {
        if config_file.exists() {
            tracing::info!(path = %config_file.display(), "Configuration already exists");
        } else {
            AnalystConfig::default().save(&config_file)?;
        }
        return Ok(());
    }

    config.connection.token = args.resolve_token(&config.connection.token);
    config.server.port = args.resolve_port(config.server.port);
    config.validate()?;

    let orchestrator = build_orchestrator(&config)?;

    match args.command {
        Command::Serve => {
            if config.server.api_token.is_empty() {
                let token = generate_token();
                tracing::warn!("server.api_token not set, generated one for this run");
                println!("API token: {}", token);
                config.server.api_token = token;
            }
            let server = config.server.clone();
            let state = AppState::new(config, orchestrator);
            routes::start_server(&server, state).await?;
        }
        Command::Chat => repl::run(orchestrator).await?,
        Command::Init => {}
    }

    Ok(())
}
