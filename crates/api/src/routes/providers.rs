//! Provider registration and lifecycle endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::EntityId;
use domain::{Provider, RegisterProvider, UpdateProviderRating};
use serde::Deserialize;
use serde_json::Value;

use super::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterProviderRequest {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub transport_mode: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
pub struct RatingRequest {
    pub rating: f64,
}

/// POST /providers — register a provider.
#[tracing::instrument(skip(state, req), fields(provider_id = %req.id))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterProviderRequest>,
) -> Result<(StatusCode, Json<Provider>), ApiError> {
    let cmd = RegisterProvider {
        id: req.id,
        name: req.name,
        email: req.email,
        phone: req.phone,
        transport_mode: req.transport_mode,
        attributes: req.attributes,
    };
    let provider = state.directory.register_provider(cmd).await?;
    Ok((StatusCode::CREATED, Json(provider)))
}

/// GET /providers/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Provider>, ApiError> {
    Ok(Json(state.directory.get_provider(&id.into()).await?))
}

/// POST /providers/{id}/deregister — soft-delete a provider.
#[tracing::instrument(skip(state))]
pub async fn deregister(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Provider>, ApiError> {
    Ok(Json(state.directory.deregister_provider(&id.into()).await?))
}

/// POST /providers/{id}/ratings — fold one rating into the average.
#[tracing::instrument(skip(state, req))]
pub async fn rate(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<RatingRequest>,
) -> Result<Json<Provider>, ApiError> {
    let provider = state
        .directory
        .update_provider_rating(UpdateProviderRating::new(id, req.rating))
        .await?;
    Ok(Json(provider))
}
