//! Ticket queries: route, provider, transport mode, price and provider rating.

use common::EntityId;
use domain::{
    Money, Provider, Repository, Seat, Ticket, TransportMode, ValidationError,
    directory::MAX_RATING,
};
use futures_util::TryStreamExt;
use ledger::{Ledger, Selector};

use crate::Result;

/// Read-only queries over stored tickets.
///
/// Results are returned in ticket id order. Records that fail to decode are
/// skipped.
pub struct TicketQueries<L: Ledger> {
    repo: Repository<L>,
}

impl<L: Ledger> TicketQueries<L> {
    pub fn new(ledger: L) -> Self {
        Self {
            repo: Repository::new(ledger),
        }
    }

    /// Tickets from `origin` to `destination` departing on `date`.
    ///
    /// `date` is matched as a literal prefix of the RFC 3339 departure
    /// timestamp, so `2026-10-27` selects the whole day and `2026-10`
    /// the whole month.
    #[tracing::instrument(skip(self))]
    pub async fn by_route(&self, origin: &str, destination: &str, date: &str) -> Result<Vec<Ticket>> {
        required(origin, "origin")?;
        required(destination, "destination")?;
        required(date, "departure date")?;

        let selector = Selector::new()
            .eq("origin", origin)
            .eq("destination", destination)
            .starts_with("departureTime", date)?;
        self.run("by_route", &selector).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn by_provider(&self, provider_id: &EntityId) -> Result<Vec<Ticket>> {
        required(provider_id.as_str(), "provider id")?;
        let selector = Selector::new().eq("serviceProvider", provider_id.as_str());
        self.run("by_provider", &selector).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn by_transport_mode(&self, mode: &str) -> Result<Vec<Ticket>> {
        let mode: TransportMode = mode.parse()?;
        let selector = Selector::new().eq("transportMode", mode.as_str());
        self.run("by_transport_mode", &selector).await
    }

    /// Tickets whose current dynamic price lies in `[min, max]`.
    #[tracing::instrument(skip(self))]
    pub async fn by_price_range(&self, min: Money, max: Money) -> Result<Vec<Ticket>> {
        if min.is_negative() || max.is_negative() || min > max {
            return Err(ValidationError::InvalidPriceRange { min, max }.into());
        }
        let selector = Selector::new().range("dynamicPrice", min.cents(), max.cents());
        self.run("by_price_range", &selector).await
    }

    /// Tickets offered by providers rated at least `min_rating`.
    ///
    /// Inactive providers keep their rating and are included.
    #[tracing::instrument(skip(self))]
    pub async fn by_provider_rating(&self, min_rating: f64) -> Result<Vec<Ticket>> {
        if !(0.0..=MAX_RATING).contains(&min_rating) {
            return Err(ValidationError::InvalidRating(min_rating).into());
        }

        let providers: Vec<Provider> = self
            .repo
            .query(&Selector::new().gte("rating", min_rating))
            .await?
            .try_collect()
            .await?;
        if providers.is_empty() {
            tracing::debug!(min_rating, "No provider meets the rating threshold");
            return Ok(Vec::new());
        }

        let alternatives = providers
            .iter()
            .map(|p| Selector::new().eq("serviceProvider", p.id.as_str()))
            .collect();
        let selector = Selector::new().any_of(alternatives);
        self.run("by_provider_rating", &selector).await
    }

    /// The vacant seats of one ticket, in seat order.
    #[tracing::instrument(skip(self))]
    pub async fn available_seats(&self, ticket_id: &EntityId) -> Result<Vec<Seat>> {
        required(ticket_id.as_str(), "ticket id")?;
        let ticket: Ticket = self.repo.require(ticket_id).await?;
        metrics::counter!("queries_total", "query" => "available_seats").increment(1);
        Ok(ticket.vacant_seats().cloned().collect())
    }

    /// Every stored ticket.
    #[tracing::instrument(skip(self))]
    pub async fn all_tickets(&self) -> Result<Vec<Ticket>> {
        let tickets = self.repo.scan::<Ticket>().await?.try_collect().await?;
        metrics::counter!("queries_total", "query" => "all_tickets").increment(1);
        Ok(tickets)
    }

    async fn run(&self, query: &'static str, selector: &Selector) -> Result<Vec<Ticket>> {
        let tickets: Vec<Ticket> = self.repo.query(selector).await?.try_collect().await?;
        metrics::counter!("queries_total", "query" => query).increment(1);
        tracing::debug!(query, matched = tickets.len(), "Ticket query answered");
        Ok(tickets)
    }
}

pub(crate) fn required(value: &str, field: &'static str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(ValidationError::Required { field }.into());
    }
    Ok(())
}
