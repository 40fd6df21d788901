//! Policy QA API Server
//!
//! Answers questions about an insurance policy from extracted rules,
//! falling back to document retrieval when no rule applies.

pub mod auth;
pub mod config;
pub mod error;
pub mod extractor;
pub mod fallback;
pub mod handlers;
pub mod orchestrator;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, OrchestratorError};
pub use orchestrator::{AnswerSource, Orchestrator, QuestionOutcome};
pub use state::AppState;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

pub fn create_router(app_state: Arc<AppState>) -> Router {
    let authenticated = Router::new()
        .route("/hackrx/run", post(handlers::run_questions))
        .route("/api/rules", get(handlers::list_rules))
        .route("/api/rules/reload", post(handlers::reload_rules))
        .route_layer(middleware::from_fn_with_state(
            app_state.clone(),
            auth::require_bearer,
        ));

    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health_check))
        // Rules
        .route("/api/evaluate", post(handlers::evaluate_facts))
        .merge(authenticated)
        // Middleware
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(app_state)
}
