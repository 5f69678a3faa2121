//! Domain error types.

use common::EntityKind;
use ledger::LedgerError;
use thiserror::Error;

use crate::booking::BookingStatus;
use crate::value_objects::Money;

/// Malformed, missing or out-of-range input. Always raised before any
/// ledger read or write.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: &'static str },

    #[error("invalid transport mode: {0} (expected air, land or water)")]
    InvalidTransportMode(String),

    #[error("invalid visibility: {0} (expected public or anonymous)")]
    InvalidVisibility(String),

    #[error("invalid {field} {value:?}: {reason}")]
    InvalidTimestamp {
        field: &'static str,
        value: String,
        reason: String,
    },

    #[error("departure time must be before arrival time")]
    DepartureNotBeforeArrival,

    #[error("price must be greater than 0 (got {0})")]
    NonPositivePrice(Money),

    #[error("total seats must be greater than 0 (got {0})")]
    NonPositiveSeats(i64),

    #[error("price must not exceed {max} (got {price})")]
    PriceTooHigh { price: Money, max: Money },

    #[error("total seats must not exceed {max} (got {requested})")]
    TooManySeats { requested: i64, max: u32 },

    #[error("invalid amount {value:?}: {reason}")]
    InvalidAmount { value: String, reason: &'static str },

    #[error("invalid rating: {0} (must be between 0 and 5)")]
    InvalidRating(f64),

    #[error("invalid price range: min={min}, max={max}")]
    InvalidPriceRange { min: Money, max: Money },

    #[error("at least one seat must be requested")]
    NoSeatsRequested,

    #[error("seat {0} requested more than once")]
    DuplicateSeat(String),
}

/// The operation is not valid for the current state of an entity.
/// The entity is left unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConflictError {
    #[error("ticket {ticket_id} is not available for booking")]
    TicketNotAvailable { ticket_id: String },

    #[error("provider {provider_id} is not active")]
    ProviderInactive { provider_id: String },

    #[error("customer {customer_id} is not active")]
    CustomerInactive { customer_id: String },

    #[error("seat {seat} of ticket {ticket_id} is not available")]
    SeatNotVacant { ticket_id: String, seat: String },

    #[error("booking {booking_id} is not in pending state (currently {status})")]
    BookingNotPending {
        booking_id: String,
        status: BookingStatus,
    },

    #[error("booking {booking_id} is already cancelled")]
    BookingAlreadyCancelled { booking_id: String },

    #[error("payment amount mismatch for booking {booking_id}: expected {expected}, booked {booked}")]
    PriceMismatch {
        booking_id: String,
        expected: Money,
        booked: Money,
    },
}

/// Structural (de)serialization failures of stored records.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("record kind mismatch: expected {expected}, found {found}")]
    KindMismatch { expected: EntityKind, found: String },

    #[error("entity did not serialize to a JSON object")]
    NotAnObject,

    #[error("malformed record: {0}")]
    Json(#[from] serde_json::Error),
}

/// Errors that can occur during domain operations.
#[derive(Debug, Error)]
pub enum DomainError {
    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("{entity} {id} does not exist")]
    NotFound { entity: &'static str, id: String },

    #[error("{entity} with ID {id} already exists")]
    AlreadyExists { entity: &'static str, id: String },

    #[error("Conflict: {0}")]
    Conflict(#[from] ConflictError),

    #[error("Codec error: {0}")]
    Codec(#[from] CodecError),

    #[error("Ledger error: {0}")]
    Ledger(#[from] LedgerError),
}

impl DomainError {
    pub(crate) fn not_found(kind: EntityKind, id: impl std::fmt::Display) -> Self {
        DomainError::NotFound {
            entity: kind.as_str(),
            id: id.to_string(),
        }
    }

    pub(crate) fn already_exists(kind: EntityKind, id: impl std::fmt::Display) -> Self {
        DomainError::AlreadyExists {
            entity: kind.as_str(),
            id: id.to_string(),
        }
    }
}

/// Result type for domain operations.
pub type Result<T> = std::result::Result<T, DomainError>;
