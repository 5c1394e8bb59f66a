use std::sync::Arc;

use acadmate_rag::core::config::{AppPaths, ConfigService, Settings};
use acadmate_rag::core::logging;
use acadmate_rag::server;
use acadmate_rag::state::error::InitializationError;
use acadmate_rag::state::AppState;
use anyhow::Context;
use axum::Router;
use serde_json::Value;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let paths = Arc::new(AppPaths::new());
    let config = ConfigService::new(paths);
    let raw_config = config
        .load_config()
        .map_err(|e| InitializationError::Config(e.into()))?;
    let settings = Settings::from_value(raw_config.clone())
        .map_err(|e| InitializationError::Config(e.into()))?;

    logging::init(&settings.logging);
    log_effective_config(&config, &raw_config);

    tracing::info!("Starting application...");
    let state = AppState::initialize(settings).await?;
    tracing::info!("Application started successfully");

    let bind_addr = format!(
        "{}:{}",
        state.settings.server.host, state.settings.server.port
    );
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind to {}", bind_addr))?;
    let addr = listener.local_addr()?;
    tracing::info!("Listening on {}", addr);

    let app: Router = server::router::router(state);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Shutting down application...");
    Ok(())
}

fn log_effective_config(config: &ConfigService, raw: &Value) {
    let redacted = config.redact_sensitive_values(raw);
    match serde_json::to_string(&redacted) {
        Ok(text) => tracing::info!("Effective configuration: {}", text),
        Err(e) => tracing::warn!("Failed to render configuration: {}", e),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl-C: {}", e);
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
