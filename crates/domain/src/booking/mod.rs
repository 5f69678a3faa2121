//! Bookings, payments and the engine that ties them to tickets and customers.

#[allow(clippy::module_inception)]
mod booking;
mod commands;
mod payment;
mod service;

pub use booking::{Booking, BookingStatus, REFUND_PCT};
pub use commands::{BookTicket, CancelBooking, ConfirmPayment, CreateTicket};
pub use payment::{Payment, PaymentStatus};
pub use service::BookingEngine;
