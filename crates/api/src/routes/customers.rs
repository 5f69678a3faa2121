//! Customer registration, lifecycle and booking history endpoints.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::EntityId;
use domain::{Booking, Customer, RegisterCustomer, UpdateCustomerVisibility};
use serde::Deserialize;
use serde_json::Value;

use super::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterCustomerRequest {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    pub visibility: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Value>,
}

#[derive(Deserialize)]
pub struct VisibilityRequest {
    pub visibility: String,
}

/// POST /customers — register a customer.
#[tracing::instrument(skip(state, req), fields(customer_id = %req.id))]
pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterCustomerRequest>,
) -> Result<(StatusCode, Json<Customer>), ApiError> {
    let cmd = RegisterCustomer {
        id: req.id,
        name: req.name,
        email: req.email,
        phone: req.phone,
        visibility: req.visibility,
        attributes: req.attributes,
    };
    let customer = state.directory.register_customer(cmd).await?;
    Ok((StatusCode::CREATED, Json(customer)))
}

/// GET /customers/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    Ok(Json(state.directory.get_customer(&id.into()).await?))
}

/// POST /customers/{id}/deregister — soft-delete a customer.
#[tracing::instrument(skip(state))]
pub async fn deregister(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Customer>, ApiError> {
    Ok(Json(state.directory.deregister_customer(&id.into()).await?))
}

/// PUT /customers/{id}/visibility
#[tracing::instrument(skip(state, req))]
pub async fn set_visibility(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<VisibilityRequest>,
) -> Result<Json<Customer>, ApiError> {
    let customer = state
        .directory
        .update_customer_visibility(UpdateCustomerVisibility::new(id, req.visibility))
        .await?;
    Ok(Json(customer))
}

/// GET /customers/{id}/bookings — every booking made by the customer.
#[tracing::instrument(skip(state))]
pub async fn bookings(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Booking>>, ApiError> {
    Ok(Json(state.bookings.customer_bookings(&id.into()).await?))
}
