//! Policy QA - Main Application Entry Point
//!
//! Serves rule-based answers to insurance policy questions, with a
//! retrieval fallback for questions no rule covers.

use anyhow::Context;
use policy_qa_api::{AppState, ServerConfig};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,policy_qa=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ServerConfig::from_env().context("Invalid server configuration")?;
    tracing::info!("Loaded configuration: {:?}", config);

    let app_state = Arc::new(
        AppState::from_config(&config)
            .await
            .context("Failed to initialize answer pipeline")?,
    );

    if app_state.store.is_empty() {
        tracing::warn!("Rule store is empty, all questions will use the retrieval fallback");
    } else {
        tracing::info!("Serving {} rules", app_state.store.len());
    }

    let app = policy_qa_api::create_router(app_state);

    let addr = config.bind_address();
    tracing::info!("Starting Policy QA server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
