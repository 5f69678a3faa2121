//! Ticket inventory and pricing.

pub mod pricing;
mod ticket;

pub use pricing::PriceFactors;
pub use ticket::{MAX_BASE_PRICE, MAX_SEATS, Seat, SeatStatus, Ticket, TicketDraft, TicketStatus};
