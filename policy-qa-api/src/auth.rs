//! Bearer token authentication

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use crate::{ApiError, AppState};

/// Reject requests whose `Authorization: Bearer <token>` does not carry the API key
pub async fn require_bearer(
    State(state): State<Arc<AppState>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let token = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(|rest| rest.split(' ').next().unwrap_or_default())
        .ok_or_else(|| ApiError::Unauthorized("Missing or invalid Authorization header".into()))?;

    let authorized = matches!(&state.api_key, Some(key) if key == token);
    if !authorized {
        return Err(ApiError::Unauthorized("Invalid API token".into()));
    }

    Ok(next.run(request).await)
}
