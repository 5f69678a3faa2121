//! Booking engine: the cross-entity transitions of the travel domain.
//!
//! Every operation follows the same shape: validate the input, read what it
//! needs through a [`UnitOfWork`](crate::repository::UnitOfWork), apply the
//! change to in-memory copies and commit all touched records in one batch.
//! A failure at any step leaves the ledger untouched.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use common::EntityId;
use ledger::Ledger;

use crate::clock::{Clock, SystemClock};
use crate::directory::{Customer, Provider, require};
use crate::error::{ConflictError, Result, ValidationError};
use crate::inventory::{MAX_BASE_PRICE, MAX_SEATS, Ticket, TicketDraft, pricing};
use crate::repository::Repository;
use crate::value_objects::TransportMode;

use super::{BookTicket, Booking, CancelBooking, ConfirmPayment, CreateTicket, Payment};

/// Service orchestrating tickets, bookings and payments.
pub struct BookingEngine<L: Ledger> {
    repo: Repository<L>,
    clock: Arc<dyn Clock>,
}

impl<L: Ledger> BookingEngine<L> {
    /// Creates a new booking engine using the system clock.
    pub fn new(ledger: L) -> Self {
        Self::with_clock(ledger, Arc::new(SystemClock))
    }

    pub fn with_clock(ledger: L, clock: Arc<dyn Clock>) -> Self {
        Self {
            repo: Repository::new(ledger),
            clock,
        }
    }

    /// Returns the repository the engine reads through.
    pub fn repository(&self) -> &Repository<L> {
        &self.repo
    }

    /// Publishes a ticket and appends it to its provider's list.
    #[tracing::instrument(skip(self, cmd), fields(ticket_id = %cmd.id, provider_id = %cmd.provider_id))]
    pub async fn create_ticket(&self, cmd: CreateTicket) -> Result<Ticket> {
        let draft = validate_ticket(cmd)?;

        let mut uow = self.repo.begin();
        uow.ensure_absent::<Ticket>(&draft.id).await?;

        let mut provider: Provider = uow.require(&draft.service_provider).await?;
        if !provider.is_active {
            return Err(ConflictError::ProviderInactive {
                provider_id: provider.id.to_string(),
            }
            .into());
        }

        let ticket = Ticket::new(draft, self.clock.now());
        provider.add_ticket(ticket.id.clone());

        uow.stage(&ticket)?;
        uow.stage(&provider)?;
        uow.commit().await?;

        metrics::counter!("tickets_created_total").increment(1);
        tracing::info!(
            ticket_id = %ticket.id,
            seats = ticket.total_seats,
            price = %ticket.price,
            "Ticket created"
        );
        Ok(ticket)
    }

    /// Re-quotes a ticket from its occupancy, time to departure and season.
    #[tracing::instrument(skip(self))]
    pub async fn update_dynamic_price(&self, ticket_id: &EntityId) -> Result<Ticket> {
        let now = self.clock.now();
        let mut uow = self.repo.begin();
        let mut ticket: Ticket = uow.require(ticket_id).await?;

        let previous = ticket.dynamic_price;
        ticket.dynamic_price = pricing::quote(&ticket, now);
        ticket.updated_at = now;

        uow.stage(&ticket)?;
        uow.commit().await?;

        metrics::counter!("dynamic_price_updates_total").increment(1);
        tracing::info!(
            ticket_id = %ticket.id,
            from = %previous,
            to = %ticket.dynamic_price,
            "Dynamic price updated"
        );
        Ok(ticket)
    }

    /// Books seats for a customer at the ticket's current dynamic price.
    #[tracing::instrument(skip(self, cmd), fields(booking_id = %cmd.booking_id, ticket_id = %cmd.ticket_id))]
    pub async fn book_ticket(&self, cmd: BookTicket) -> Result<Booking> {
        require(&cmd.booking_id, "booking id")?;
        require(&cmd.ticket_id, "ticket id")?;
        require(&cmd.customer_id, "customer id")?;
        validate_seat_numbers(&cmd.seat_numbers)?;

        let now = self.clock.now();
        let mut uow = self.repo.begin();
        uow.ensure_absent::<Booking>(&cmd.booking_id).await?;

        let mut ticket: Ticket = uow.require(&cmd.ticket_id).await?;
        if !ticket.status.can_book() {
            return Err(ConflictError::TicketNotAvailable {
                ticket_id: ticket.id.to_string(),
            }
            .into());
        }

        let mut customer: Customer = uow.require(&cmd.customer_id).await?;
        if !customer.is_active {
            return Err(ConflictError::CustomerInactive {
                customer_id: customer.id.to_string(),
            }
            .into());
        }

        let seat_ids = ticket.reserve_seats(&cmd.seat_numbers, &customer.id, now)?;
        let booking = Booking::new(
            cmd.booking_id,
            ticket.id.clone(),
            customer.id.clone(),
            seat_ids,
            ticket.dynamic_price,
            now,
        )?;
        customer.add_booking(booking.id.clone());

        uow.stage(&booking)?;
        uow.stage(&ticket)?;
        uow.stage(&customer)?;
        uow.commit().await?;

        metrics::counter!("bookings_created_total").increment(1);
        tracing::info!(
            booking_id = %booking.id,
            seats = booking.number_of_seats,
            total = %booking.total_price,
            available = ticket.available_seats,
            "Booking created"
        );
        Ok(booking)
    }

    /// Records payment for a pending booking.
    ///
    /// Rejected if the ticket has been re-priced since the booking was made.
    #[tracing::instrument(skip(self, cmd), fields(booking_id = %cmd.booking_id))]
    pub async fn confirm_payment(&self, cmd: ConfirmPayment) -> Result<Payment> {
        require(&cmd.booking_id, "booking id")?;
        if cmd.transaction_ref.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "transaction reference",
            }
            .into());
        }

        let now = self.clock.now();
        let mut uow = self.repo.begin();
        let mut booking: Booking = uow.require(&cmd.booking_id).await?;
        if !booking.status.can_confirm() {
            return Err(ConflictError::BookingNotPending {
                booking_id: booking.id.to_string(),
                status: booking.status,
            }
            .into());
        }

        let ticket: Ticket = uow.require(&booking.ticket_id).await?;
        let expected = ticket.dynamic_price.multiply(booking.number_of_seats)?;
        if expected != booking.total_price {
            return Err(ConflictError::PriceMismatch {
                booking_id: booking.id.to_string(),
                expected,
                booked: booking.total_price,
            }
            .into());
        }

        let payment = Payment::confirmed(
            booking.id.clone(),
            booking.total_price,
            cmd.transaction_ref,
            now,
        );
        uow.ensure_absent::<Payment>(&payment.id).await?;
        booking.confirm(uow.tx_ref(), now);

        uow.stage(&payment)?;
        uow.stage(&booking)?;
        uow.commit().await?;

        metrics::counter!("payments_confirmed_total").increment(1);
        tracing::info!(
            booking_id = %booking.id,
            payment_id = %payment.id,
            amount = %payment.amount,
            "Payment confirmed"
        );
        Ok(payment)
    }

    /// Cancels a booking, releases its seats and refunds 80% of its total.
    #[tracing::instrument(skip(self, cmd), fields(booking_id = %cmd.booking_id))]
    pub async fn cancel_booking(&self, cmd: CancelBooking) -> Result<Booking> {
        require(&cmd.booking_id, "booking id")?;

        let now = self.clock.now();
        let mut uow = self.repo.begin();
        let mut booking: Booking = uow.require(&cmd.booking_id).await?;
        if !booking.status.can_cancel() {
            return Err(ConflictError::BookingAlreadyCancelled {
                booking_id: booking.id.to_string(),
            }
            .into());
        }

        let mut ticket: Ticket = uow.require(&booking.ticket_id).await?;
        let mut customer: Customer = uow.require(&booking.user_id).await?;

        let released = ticket.release_seats(&booking.seat_ids, now);
        let refund = booking.cancel(now)?;
        if !customer.remove_booking(&booking.id) {
            tracing::warn!(
                booking_id = %booking.id,
                customer_id = %customer.id,
                "Cancelled booking was missing from customer history"
            );
        }

        uow.stage(&ticket)?;
        uow.stage(&booking)?;
        uow.stage(&customer)?;
        uow.commit().await?;

        metrics::counter!("bookings_cancelled_total").increment(1);
        tracing::info!(
            booking_id = %booking.id,
            released,
            refund = %refund,
            available = ticket.available_seats,
            "Booking cancelled"
        );
        Ok(booking)
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_ticket(&self, ticket_id: &EntityId) -> Result<Ticket> {
        self.repo.require(ticket_id).await
    }

    pub async fn ticket_exists(&self, ticket_id: &EntityId) -> Result<bool> {
        self.repo.exists::<Ticket>(ticket_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_booking(&self, booking_id: &EntityId) -> Result<Booking> {
        self.repo.require(booking_id).await
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_payment(&self, payment_id: &EntityId) -> Result<Payment> {
        self.repo.require(payment_id).await
    }
}

fn validate_ticket(cmd: CreateTicket) -> Result<TicketDraft> {
    require(&cmd.id, "ticket id")?;
    require(&cmd.provider_id, "provider id")?;
    for (value, field) in [
        (&cmd.origin, "origin"),
        (&cmd.destination, "destination"),
        (&cmd.departure_time, "departure time"),
        (&cmd.arrival_time, "arrival time"),
        (&cmd.transport_mode, "transport mode"),
    ] {
        if value.trim().is_empty() {
            return Err(ValidationError::Required { field }.into());
        }
    }

    let transport_mode: TransportMode = cmd.transport_mode.parse()?;
    if !cmd.base_price.is_positive() {
        return Err(ValidationError::NonPositivePrice(cmd.base_price).into());
    }
    if cmd.base_price > MAX_BASE_PRICE {
        return Err(ValidationError::PriceTooHigh {
            price: cmd.base_price,
            max: MAX_BASE_PRICE,
        }
        .into());
    }
    if cmd.total_seats <= 0 {
        return Err(ValidationError::NonPositiveSeats(cmd.total_seats).into());
    }
    let total_seats = u32::try_from(cmd.total_seats)
        .ok()
        .filter(|n| *n <= MAX_SEATS)
        .ok_or(ValidationError::TooManySeats {
            requested: cmd.total_seats,
            max: MAX_SEATS,
        })?;

    let departure_time = parse_timestamp("departure time", &cmd.departure_time)?;
    let arrival_time = parse_timestamp("arrival time", &cmd.arrival_time)?;
    if departure_time >= arrival_time {
        return Err(ValidationError::DepartureNotBeforeArrival.into());
    }

    Ok(TicketDraft {
        id: cmd.id,
        origin: cmd.origin,
        destination: cmd.destination,
        departure_time,
        arrival_time,
        base_price: cmd.base_price,
        total_seats,
        service_provider: cmd.provider_id,
        transport_mode,
    })
}

fn validate_seat_numbers(numbers: &[String]) -> std::result::Result<(), ValidationError> {
    if numbers.is_empty() {
        return Err(ValidationError::NoSeatsRequested);
    }
    let mut seen = HashSet::with_capacity(numbers.len());
    for number in numbers {
        if number.trim().is_empty() {
            return Err(ValidationError::Required {
                field: "seat number",
            });
        }
        if !seen.insert(number.as_str()) {
            return Err(ValidationError::DuplicateSeat(number.clone()));
        }
    }
    Ok(())
}

fn parse_timestamp(
    field: &'static str,
    value: &str,
) -> std::result::Result<DateTime<Utc>, ValidationError> {
    DateTime::parse_from_rfc3339(value)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| ValidationError::InvalidTimestamp {
            field,
            value: value.to_string(),
            reason: e.to_string(),
        })
}
