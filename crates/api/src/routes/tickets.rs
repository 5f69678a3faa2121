//! Ticket publication, pricing and seat endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::EntityId;
use domain::{CreateTicket, Money, Seat, Ticket};
use serde::Deserialize;

use super::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateTicketRequest {
    pub id: EntityId,
    pub origin: String,
    pub destination: String,
    pub departure_time: String,
    pub arrival_time: String,

    /// Decimal amount such as `"129.99"`.
    pub base_price: String,
    pub total_seats: i64,
    pub provider_id: EntityId,
    pub transport_mode: String,
}

/// POST /tickets — publish a ticket for an active provider.
#[tracing::instrument(skip(state, req), fields(ticket_id = %req.id))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CreateTicketRequest>,
) -> Result<(StatusCode, Json<Ticket>), ApiError> {
    let base_price: Money = req.base_price.parse()?;
    let cmd = CreateTicket {
        id: req.id,
        origin: req.origin,
        destination: req.destination,
        departure_time: req.departure_time,
        arrival_time: req.arrival_time,
        base_price,
        total_seats: req.total_seats,
        provider_id: req.provider_id,
        transport_mode: req.transport_mode,
    };
    let ticket = state.engine.create_ticket(cmd).await?;
    Ok((StatusCode::CREATED, Json(ticket)))
}

/// GET /tickets — every stored ticket.
#[tracing::instrument(skip(state))]
pub async fn list(State(state): State<Arc<AppState>>) -> Result<Json<Vec<Ticket>>, ApiError> {
    Ok(Json(state.tickets.all_tickets().await?))
}

/// GET /tickets/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Ticket>, ApiError> {
    Ok(Json(state.engine.get_ticket(&id.into()).await?))
}

/// POST /tickets/{id}/price — re-quote the dynamic price.
#[tracing::instrument(skip(state))]
pub async fn reprice(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Ticket>, ApiError> {
    Ok(Json(state.engine.update_dynamic_price(&id.into()).await?))
}

/// GET /tickets/{id}/seats — the vacant seats of a ticket.
#[tracing::instrument(skip(state))]
pub async fn seats(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Vec<Seat>>, ApiError> {
    Ok(Json(state.tickets.available_seats(&id.into()).await?))
}
