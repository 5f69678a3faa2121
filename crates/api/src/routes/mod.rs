//! HTTP handlers and the state they share.

pub mod bookings;
pub mod customers;
pub mod health;
pub mod metrics;
pub mod providers;
pub mod search;
pub mod tickets;

use std::sync::Arc;

use domain::{BookingEngine, DirectoryService};
use ledger::{InMemoryLedger, Ledger};
use projections::{BookingQueries, TicketQueries};

/// The ledger handle shared by every service.
pub type SharedLedger = Arc<dyn Ledger>;

/// Shared application state accessible from all handlers.
pub struct AppState {
    pub directory: DirectoryService<SharedLedger>,
    pub engine: BookingEngine<SharedLedger>,
    pub tickets: TicketQueries<SharedLedger>,
    pub bookings: BookingQueries<SharedLedger>,
}

impl AppState {
    /// Builds every service on top of one ledger.
    pub fn new(ledger: SharedLedger) -> Self {
        Self {
            directory: DirectoryService::new(ledger.clone()),
            engine: BookingEngine::new(ledger.clone()),
            tickets: TicketQueries::new(ledger.clone()),
            bookings: BookingQueries::new(ledger),
        }
    }

    /// State backed by a fresh in-memory ledger.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(InMemoryLedger::new()))
    }
}
