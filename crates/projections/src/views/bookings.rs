//! Booking queries.

use common::EntityId;
use domain::{Booking, Repository};
use futures_util::TryStreamExt;
use ledger::{Ledger, Selector};

use super::tickets::required;
use crate::Result;

/// Read-only queries over stored bookings.
pub struct BookingQueries<L: Ledger> {
    repo: Repository<L>,
}

impl<L: Ledger> BookingQueries<L> {
    pub fn new(ledger: L) -> Self {
        Self {
            repo: Repository::new(ledger),
        }
    }

    /// Every booking made by `customer_id`, cancelled ones included.
    ///
    /// An unknown customer simply has no bookings.
    #[tracing::instrument(skip(self))]
    pub async fn customer_bookings(&self, customer_id: &EntityId) -> Result<Vec<Booking>> {
        required(customer_id.as_str(), "customer id")?;

        let selector = Selector::new().eq("userId", customer_id.as_str());
        let bookings: Vec<Booking> = self.repo.query(&selector).await?.try_collect().await?;

        metrics::counter!("queries_total", "query" => "customer_bookings").increment(1);
        tracing::debug!(matched = bookings.len(), "Booking query answered");
        Ok(bookings)
    }
}
