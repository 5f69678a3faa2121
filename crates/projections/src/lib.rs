//! Read-only queries over the travel ledger.
//!
//! This crate provides the query side of the system:
//! - [`TicketQueries`] for route, provider, mode, price and rating lookups
//! - [`BookingQueries`] for a customer's bookings
//!
//! Queries never write. Each one is answered from a single selector query
//! or range scan against the ledger, so they commute with each other and
//! with concurrent commits.

pub mod error;
pub mod views;

pub use error::{QueryError, Result};
pub use views::{BookingQueries, TicketQueries};
