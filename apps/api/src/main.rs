mod audit;
mod config;
mod errors;
mod extract;
mod llm_client;
mod normalize;
mod prompt;
mod routes;
mod state;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::audit::pipeline::AuditSettings;
use crate::config::Config;
use crate::llm_client::{GeminiClient, ModelGateway};
use crate::routes::build_router;
use crate::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Configuration first: a missing credential stops startup here
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={},tower_http=info",
                env!("CARGO_PKG_NAME"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting estimate auditor v{}", env!("CARGO_PKG_VERSION"));
    info!("{config:?}");

    // Initialize model gateway
    let client = GeminiClient::new(
        config.gemini_api_key.clone(),
        config.gemini_api_base.clone(),
        config.gateway_timeout,
    )
    .context("failed to build model gateway client")?;

    let model = match &config.gemini_model {
        Some(pinned) => {
            info!("Using pinned model '{pinned}'");
            pinned.clone()
        }
        None => client.resolve_model(&config.model_preferences).await,
    };
    let gateway = client.with_model(model);
    info!("Model gateway initialized (model: {})", gateway.model());

    let state = AppState {
        gateway: Arc::new(gateway),
        settings: AuditSettings::from_config(&config),
    };

    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("Shutdown signal received");
}
