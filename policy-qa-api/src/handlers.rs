//! API request handlers

use axum::{extract::State, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use policy_qa_core::{AskRequest, AskResponse, FactRecord, MatchOutcome, Rule};
use policy_qa_matcher::evaluate;
use serde::Serialize;
use std::sync::Arc;
use tracing::Instrument;
use uuid::Uuid;

use crate::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub struct RulesResponse {
    pub source: String,
    pub loaded_at: DateTime<Utc>,
    pub rejected: usize,
    pub rules: Vec<Rule>,
}

#[derive(Debug, Serialize)]
pub struct ReloadResponse {
    pub loaded: usize,
    pub rejected: usize,
    pub loaded_at: DateTime<Utc>,
}

// ==================== Question Handlers ====================

/// Answer a batch of questions about a policy document
pub async fn run_questions(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> Result<Json<AskResponse>, ApiError> {
    if req.documents.trim().is_empty() {
        return Err(ApiError::BadRequest("'documents' must be a document URL".into()));
    }

    let batch_id = Uuid::new_v4();
    let span = tracing::info_span!("question_batch", %batch_id, questions = req.questions.len());

    let outcomes = state
        .orchestrator
        .answer_all(&req.documents, &req.questions)
        .instrument(span)
        .await;

    tracing::info!("Answered {} questions (batch {})", outcomes.len(), batch_id);

    Ok(Json(AskResponse {
        answers: outcomes.into_iter().map(|o| o.answer).collect(),
    }))
}

// ==================== Rule Handlers ====================

/// Evaluate a fact record against the current rules
pub async fn evaluate_facts(
    State(state): State<Arc<AppState>>,
    Json(facts): Json<FactRecord>,
) -> Result<Json<MatchOutcome>, ApiError> {
    let rules = state.store.snapshot();
    let outcome = evaluate(&facts, rules.rules())?;
    Ok(Json(outcome))
}

/// List the currently published rules
pub async fn list_rules(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let rules = state.store.snapshot();
    Json(RulesResponse {
        source: state.store.source_description(),
        loaded_at: rules.loaded_at(),
        rejected: rules.rejected(),
        rules: rules.rules().to_vec(),
    })
}

/// Re-read the rule source and publish the result
pub async fn reload_rules(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ReloadResponse>, ApiError> {
    let rules = state.store.reload().await?;

    tracing::info!(
        "Reloaded {} rules ({} rejected)",
        rules.len(),
        rules.rejected()
    );

    Ok(Json(ReloadResponse {
        loaded: rules.len(),
        rejected: rules.rejected(),
        loaded_at: rules.loaded_at(),
    }))
}

// ==================== Status Handlers ====================

pub async fn root() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Policy QA API is up and running."
    }))
}

/// Health check endpoint
pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "policy-qa",
        "rules": state.store.len()
    }))
}
