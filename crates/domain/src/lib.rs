//! Domain layer of the travel booking ledger.
//!
//! This crate provides:
//! - the entity codec and a repository with strict single reads and lenient bulk reads
//! - providers and customers ([`DirectoryService`])
//! - tickets with per-seat inventory and the dynamic pricing engine
//! - bookings and payments, orchestrated by the [`BookingEngine`]

pub mod booking;
pub mod clock;
pub mod codec;
pub mod directory;
pub mod error;
pub mod inventory;
pub mod repository;
pub mod value_objects;

pub use booking::{
    BookTicket, Booking, BookingEngine, BookingStatus, CancelBooking, ConfirmPayment,
    CreateTicket, Payment, PaymentStatus,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use codec::Entity;
pub use directory::{
    Customer, DirectoryService, Provider, RegisterCustomer, RegisterProvider,
    UpdateCustomerVisibility, UpdateProviderRating,
};
pub use error::{CodecError, ConflictError, DomainError, Result, ValidationError};
pub use inventory::{MAX_BASE_PRICE, MAX_SEATS, PriceFactors, Seat, SeatStatus, Ticket, TicketStatus};
pub use repository::{EntityStream, Repository, UnitOfWork};
pub use value_objects::{Money, TransportMode, Visibility};
