//! Health check endpoint.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use ledger::Ledger;
use serde::Serialize;

use super::AppState;
use crate::error::ApiError;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub ledger_height: i64,
}

/// GET /health — returns system health status and the ledger height.
pub async fn check(State(state): State<Arc<AppState>>) -> Result<Json<HealthResponse>, ApiError> {
    let height = state
        .engine
        .repository()
        .ledger()
        .height()
        .await
        .map_err(domain::DomainError::from)?;

    Ok(Json(HealthResponse {
        status: "ok",
        ledger_height: height.as_i64(),
    }))
}
