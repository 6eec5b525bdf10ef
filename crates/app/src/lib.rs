//! Doctor AI application composition root
//!
//! Composes the domain router with the shared infrastructure routes.

use std::sync::Arc;
use std::time::Duration;

use axum::{extract::DefaultBodyLimit, Router};
use medchat_common::config::{Config, DEFAULT_LOG_FILTER};
use medchat_conversations::{
    CompletionGateway, ConversationManager, ConversationsRepositories, ConversationsState,
    SessionRegistry,
};
use medchat_llm::LlmService;
use sqlx::SqlitePool;
use tracing_subscriber::{filter::ParseError, EnvFilter};

/// Build the log filter from `RUST_LOG` directives
///
/// Unparseable directives fall back to the default filter; the parse error is
/// handed back so it can be logged once tracing is up.
pub fn log_filter(directives: &str) -> (EnvFilter, Option<ParseError>) {
    match EnvFilter::try_new(directives) {
        Ok(filter) => (filter, None),
        Err(e) => (EnvFilter::new(DEFAULT_LOG_FILTER), Some(e)),
    }
}

/// Create the main application router with all routes and middleware
///
/// Must be called inside a Tokio runtime: it starts the idle-session sweeper.
pub fn create_app(config: &Config, pool: SqlitePool, llm: Arc<dyn LlmService>) -> Router {
    let repos = ConversationsRepositories::new(pool);
    let manager = ConversationManager::new(repos.messages.clone(), CompletionGateway::new(llm));

    let sessions =
        SessionRegistry::with_idle_timeout(Duration::from_secs(config.session_idle_secs));
    sessions.spawn_sweeper();

    let conversations_state = ConversationsState {
        repos,
        sessions,
        manager,
    };

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .route(
            "/",
            axum::routing::get(|| async { "Doctor AI API v0.1.0" }),
        )
        .merge(medchat_conversations::routes().with_state(conversations_state))
        .layer(DefaultBodyLimit::max(config.max_upload_bytes))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
