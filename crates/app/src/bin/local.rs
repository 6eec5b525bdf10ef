// Doctor AI API - Local Server

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::signal;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{error, info, warn};

use medchat_common::{config::Config, connect, init_schema};
use medchat_llm::{LlmConfig, LlmServiceFactory};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Loaded before tracing starts: it carries the log filter
    let config = Config::from_env()?;

    let (filter, bad_filter) = medchat_app::log_filter(&config.rust_log);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .pretty()
        .init();

    if let Some(e) = bad_filter {
        warn!(rust_log = %config.rust_log, error = %e, "Invalid RUST_LOG, using default filter");
    }

    info!("Starting Doctor AI API server");

    // A missing provider key stops startup before any request is served
    let llm_config = LlmConfig::from_env().map_err(|e| {
        error!("Failed to load completion provider configuration: {}", e);
        anyhow::anyhow!("Completion provider configuration failed: {}", e)
    })?;

    info!(
        provider = ?llm_config.provider,
        model = %llm_config.default_model,
        "Configuration loaded successfully"
    );

    let pool = connect(&config.database_url).await.map_err(|e| {
        error!("Failed to open chat log: {}", e);
        anyhow::anyhow!("Database connection failed: {}", e)
    })?;

    init_schema(&pool).await.map_err(|e| {
        error!("Failed to prepare chat log schema: {}", e);
        anyhow::anyhow!("Schema initialization failed: {}", e)
    })?;

    info!("Chat log ready");

    let llm = Arc::from(LlmServiceFactory::create(llm_config));
    let app = medchat_app::create_app(&config, pool, llm);

    let app = app.layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(CorsLayer::permissive())
            .into_inner(),
    );

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));

    info!("Server starting on http://{}", addr);
    info!("Health check available at http://{}/health", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C signal, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received terminate signal, starting graceful shutdown");
        },
    }
}
