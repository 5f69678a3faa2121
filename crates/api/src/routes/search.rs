//! Ticket search endpoints backed by the query layer.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use domain::{Money, Ticket};
use serde::Deserialize;

use super::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
pub struct RouteParams {
    pub origin: String,
    pub destination: String,

    /// Departure date prefix, e.g. `2026-10-27`.
    pub date: String,
}

#[derive(Deserialize)]
pub struct PriceParams {
    pub min: String,
    pub max: String,
}

#[derive(Deserialize)]
pub struct RatingParams {
    pub min: f64,
}

/// GET /tickets/search/route?origin=..&destination=..&date=..
#[tracing::instrument(skip(state, params))]
pub async fn by_route(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RouteParams>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    let tickets = state
        .tickets
        .by_route(&params.origin, &params.destination, &params.date)
        .await?;
    Ok(Json(tickets))
}

/// GET /tickets/search/provider/{id}
#[tracing::instrument(skip(state))]
pub async fn by_provider(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    Ok(Json(state.tickets.by_provider(&id.into()).await?))
}

/// GET /tickets/search/mode/{mode}
#[tracing::instrument(skip(state))]
pub async fn by_mode(
    State(state): State<Arc<AppState>>,
    Path(mode): Path<String>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    Ok(Json(state.tickets.by_transport_mode(&mode).await?))
}

/// GET /tickets/search/price?min=..&max=..
#[tracing::instrument(skip(state, params))]
pub async fn by_price(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PriceParams>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    let min: Money = params.min.parse()?;
    let max: Money = params.max.parse()?;
    Ok(Json(state.tickets.by_price_range(min, max).await?))
}

/// GET /tickets/search/rating?min=..
#[tracing::instrument(skip(state, params))]
pub async fn by_rating(
    State(state): State<Arc<AppState>>,
    Query(params): Query<RatingParams>,
) -> Result<Json<Vec<Ticket>>, ApiError> {
    Ok(Json(state.tickets.by_provider_rating(params.min).await?))
}
