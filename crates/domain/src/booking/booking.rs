use chrono::{DateTime, Utc};
use common::{EntityId, EntityKind};
use ledger::TxRef;
use serde::{Deserialize, Serialize};

use crate::codec::Entity;
use crate::error::ValidationError;
use crate::value_objects::Money;

/// Share of the booked total refunded on cancellation, in percent.
pub const REFUND_PCT: i64 = 80;

/// The state of a booking in its lifecycle.
///
/// ```text
/// Pending ──► Confirmed
///    │            │
///    └────────────┴──► Cancelled
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum BookingStatus {
    /// Seats are held, payment outstanding.
    #[default]
    Pending,

    /// Payment recorded.
    Confirmed,

    /// Seats released (terminal state).
    Cancelled,
}

impl BookingStatus {
    pub fn can_confirm(&self) -> bool {
        matches!(self, BookingStatus::Pending)
    }

    pub fn can_cancel(&self) -> bool {
        !matches!(self, BookingStatus::Cancelled)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            BookingStatus::Pending => "Pending",
            BookingStatus::Confirmed => "Confirmed",
            BookingStatus::Cancelled => "Cancelled",
        }
    }
}

impl std::fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A customer's hold on one or more seats of a ticket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Booking {
    pub id: EntityId,
    pub ticket_id: EntityId,

    /// The customer who made the booking.
    pub user_id: EntityId,
    pub seat_ids: Vec<String>,
    pub number_of_seats: u32,

    /// Seat count × dynamic price at booking time. Once cancelled this
    /// holds the refund instead.
    pub total_price: Money,

    /// The booked total, never overwritten.
    #[serde(default)]
    pub original_total: Money,

    /// Set on cancellation.
    #[serde(default)]
    pub refund_amount: Option<Money>,
    pub status: BookingStatus,
    pub is_payment_confirmed: bool,

    /// Ledger reference of the invocation that confirmed payment.
    #[serde(default)]
    pub payment_tx_ref: Option<TxRef>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Booking {
    /// Creates a pending booking for the given seats at `unit_price` each.
    pub fn new(
        id: EntityId,
        ticket_id: EntityId,
        user_id: EntityId,
        seat_ids: Vec<String>,
        unit_price: Money,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        let number_of_seats = seat_ids.len() as u32;
        let total = unit_price.multiply(number_of_seats)?;
        Ok(Self {
            id,
            ticket_id,
            user_id,
            seat_ids,
            number_of_seats,
            total_price: total,
            original_total: total,
            refund_amount: None,
            status: BookingStatus::Pending,
            is_payment_confirmed: false,
            payment_tx_ref: None,
            created_at: now,
            updated_at: now,
        })
    }

    pub(crate) fn confirm(&mut self, tx_ref: TxRef, now: DateTime<Utc>) {
        self.status = BookingStatus::Confirmed;
        self.is_payment_confirmed = true;
        self.payment_tx_ref = Some(tx_ref);
        self.updated_at = now;
    }

    /// Cancels the booking and returns the refund.
    pub(crate) fn cancel(&mut self, now: DateTime<Utc>) -> Result<Money, ValidationError> {
        let refund = self.original_total.percent(REFUND_PCT)?;
        self.status = BookingStatus::Cancelled;
        self.total_price = refund;
        self.refund_amount = Some(refund);
        self.is_payment_confirmed = true;
        self.updated_at = now;
        Ok(refund)
    }
}

impl Entity for Booking {
    const KIND: EntityKind = EntityKind::Booking;

    fn id(&self) -> &EntityId {
        &self.id
    }
}
