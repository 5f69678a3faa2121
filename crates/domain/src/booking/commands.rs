//! Booking engine commands.

use common::EntityId;

use crate::value_objects::Money;

/// Command to publish a new ticket.
///
/// Timestamps and the transport mode arrive in wire form and are validated
/// by the engine.
#[derive(Debug, Clone)]
pub struct CreateTicket {
    pub id: EntityId,
    pub origin: String,
    pub destination: String,

    /// RFC 3339 departure timestamp.
    pub departure_time: String,

    /// RFC 3339 arrival timestamp.
    pub arrival_time: String,
    pub base_price: Money,
    pub total_seats: i64,
    pub provider_id: EntityId,
    pub transport_mode: String,
}

/// Command to book seats on a ticket.
#[derive(Debug, Clone)]
pub struct BookTicket {
    pub booking_id: EntityId,
    pub ticket_id: EntityId,
    pub customer_id: EntityId,

    /// Seat numbers as shown on the ticket (`"1"`, `"2"`, ...).
    pub seat_numbers: Vec<String>,
}

impl BookTicket {
    pub fn new(
        booking_id: impl Into<EntityId>,
        ticket_id: impl Into<EntityId>,
        customer_id: impl Into<EntityId>,
        seat_numbers: impl IntoIterator<Item = impl Into<String>>,
    ) -> Self {
        Self {
            booking_id: booking_id.into(),
            ticket_id: ticket_id.into(),
            customer_id: customer_id.into(),
            seat_numbers: seat_numbers.into_iter().map(Into::into).collect(),
        }
    }
}

/// Command to record payment for a pending booking.
#[derive(Debug, Clone)]
pub struct ConfirmPayment {
    pub booking_id: EntityId,

    /// Reference of the settling transaction; must not be empty.
    pub transaction_ref: String,
}

impl ConfirmPayment {
    pub fn new(booking_id: impl Into<EntityId>, transaction_ref: impl Into<String>) -> Self {
        Self {
            booking_id: booking_id.into(),
            transaction_ref: transaction_ref.into(),
        }
    }
}

/// Command to cancel a booking and release its seats.
#[derive(Debug, Clone)]
pub struct CancelBooking {
    pub booking_id: EntityId,
}

impl CancelBooking {
    pub fn new(booking_id: impl Into<EntityId>) -> Self {
        Self {
            booking_id: booking_id.into(),
        }
    }
}
