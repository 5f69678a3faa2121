//! Booking, payment and cancellation endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use common::EntityId;
use domain::{BookTicket, Booking, CancelBooking, ConfirmPayment, Payment};
use serde::Deserialize;

use super::AppState;
use crate::error::ApiError;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookTicketRequest {
    pub booking_id: EntityId,
    pub ticket_id: EntityId,
    pub customer_id: EntityId,
    pub seat_numbers: Vec<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRequest {
    pub transaction_ref: String,
}

/// POST /bookings — reserve seats at the current dynamic price.
#[tracing::instrument(skip(state, req), fields(booking_id = %req.booking_id))]
pub async fn create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<BookTicketRequest>,
) -> Result<(StatusCode, Json<Booking>), ApiError> {
    let cmd = BookTicket {
        booking_id: req.booking_id,
        ticket_id: req.ticket_id,
        customer_id: req.customer_id,
        seat_numbers: req.seat_numbers,
    };
    let booking = state.engine.book_ticket(cmd).await?;
    Ok((StatusCode::CREATED, Json(booking)))
}

/// GET /bookings/{id}
#[tracing::instrument(skip(state))]
pub async fn get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, ApiError> {
    Ok(Json(state.engine.get_booking(&id.into()).await?))
}

/// POST /bookings/{id}/payment — confirm payment for a pending booking.
#[tracing::instrument(skip(state, req))]
pub async fn pay(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<PaymentRequest>,
) -> Result<(StatusCode, Json<Payment>), ApiError> {
    let payment = state
        .engine
        .confirm_payment(ConfirmPayment::new(id, req.transaction_ref))
        .await?;
    Ok((StatusCode::CREATED, Json(payment)))
}

/// POST /bookings/{id}/cancel — cancel and refund a booking.
#[tracing::instrument(skip(state))]
pub async fn cancel(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, ApiError> {
    Ok(Json(state.engine.cancel_booking(CancelBooking::new(id)).await?))
}

/// GET /payments/{id}
#[tracing::instrument(skip(state))]
pub async fn payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Payment>, ApiError> {
    Ok(Json(state.engine.get_payment(&id.into()).await?))
}
