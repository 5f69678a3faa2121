//! Query views.

pub mod bookings;
pub mod tickets;

pub use bookings::BookingQueries;
pub use tickets::TicketQueries;
