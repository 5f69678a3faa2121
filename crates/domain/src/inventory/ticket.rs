//! Ticket inventory with its embedded seat table.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use common::{EntityId, EntityKind};
use serde::{Deserialize, Serialize};

use crate::codec::Entity;
use crate::error::{ConflictError, DomainError, ValidationError};
use crate::value_objects::{Money, TransportMode};

/// Largest seat table a ticket may be created with.
pub const MAX_SEATS: u32 = 10_000;

/// Largest base price a ticket may be created with ($10,000,000.00).
pub const MAX_BASE_PRICE: Money = Money::from_cents(1_000_000_000);

/// Status of one seat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SeatStatus {
    Vacant,
    Booked,

    /// Withheld from sale. Nothing in the booking flow produces it, but
    /// stored records may carry it.
    Blocked,
}

/// One seat of a ticket. Seats are created with the ticket and never
/// added or removed; only their status and holder change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    /// `<ticketId>-seat-<n>`
    pub id: String,

    /// 1-based seat number in string form.
    pub number: String,
    pub status: SeatStatus,

    /// Customer holding the seat; `None` while vacant.
    #[serde(default)]
    pub booked_by: Option<EntityId>,
}

impl Seat {
    fn vacant(ticket_id: &EntityId, number: u32) -> Self {
        Self {
            id: format!("{ticket_id}-seat-{number}"),
            number: number.to_string(),
            status: SeatStatus::Vacant,
            booked_by: None,
        }
    }

    pub fn is_vacant(&self) -> bool {
        self.status == SeatStatus::Vacant
    }
}

/// Lifecycle status of a ticket.
///
/// `Booked` exactly when no seat is vacant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum TicketStatus {
    #[default]
    Available,
    Booked,
}

impl TicketStatus {
    pub fn can_book(&self) -> bool {
        matches!(self, TicketStatus::Available)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Available => "Available",
            TicketStatus::Booked => "Booked",
        }
    }
}

impl std::fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A sellable journey with a fixed number of seats.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Ticket {
    pub id: EntityId,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,

    /// Base price per seat, fixed at creation.
    pub price: Money,

    /// Currently quoted price per seat, within `[price, 2.5 × price]`.
    pub dynamic_price: Money,
    pub available_seats: u32,
    pub total_seats: u32,
    pub seats: Vec<Seat>,
    pub service_provider: EntityId,
    pub transport_mode: TransportMode,
    pub status: TicketStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Validated fields of a new ticket.
#[derive(Debug, Clone)]
pub struct TicketDraft {
    pub id: EntityId,
    pub origin: String,
    pub destination: String,
    pub departure_time: DateTime<Utc>,
    pub arrival_time: DateTime<Utc>,
    pub base_price: Money,
    pub total_seats: u32,
    pub service_provider: EntityId,
    pub transport_mode: TransportMode,
}

impl Ticket {
    /// Allocates a ticket with every seat vacant, priced at its base price.
    pub fn new(draft: TicketDraft, now: DateTime<Utc>) -> Self {
        let seats = (1..=draft.total_seats)
            .map(|n| Seat::vacant(&draft.id, n))
            .collect();

        Self {
            id: draft.id,
            origin: draft.origin,
            destination: draft.destination,
            departure_time: draft.departure_time,
            arrival_time: draft.arrival_time,
            price: draft.base_price,
            dynamic_price: draft.base_price,
            available_seats: draft.total_seats,
            total_seats: draft.total_seats,
            seats,
            service_provider: draft.service_provider,
            transport_mode: draft.transport_mode,
            status: TicketStatus::Available,
            created_at: now,
            updated_at: now,
        }
    }

    /// Number of seats that are not vacant.
    pub fn occupied_seats(&self) -> u32 {
        self.total_seats.saturating_sub(self.available_seats)
    }

    pub fn vacant_seats(&self) -> impl Iterator<Item = &Seat> {
        self.seats.iter().filter(|s| s.is_vacant())
    }

    /// Books the seats with the given numbers for `holder`.
    ///
    /// Every requested seat is checked before any is changed, so either all
    /// of them are booked or the ticket is left untouched. Returns the ids
    /// of the booked seats in request order.
    pub fn reserve_seats(
        &mut self,
        numbers: &[String],
        holder: &EntityId,
        now: DateTime<Utc>,
    ) -> Result<Vec<String>, DomainError> {
        if numbers.is_empty() {
            return Err(ValidationError::NoSeatsRequested.into());
        }
        if !self.status.can_book() {
            return Err(ConflictError::TicketNotAvailable {
                ticket_id: self.id.to_string(),
            }
            .into());
        }

        let mut seen = HashSet::with_capacity(numbers.len());
        let mut indices = Vec::with_capacity(numbers.len());
        for number in numbers {
            if !seen.insert(number.as_str()) {
                return Err(ValidationError::DuplicateSeat(number.clone()).into());
            }
            let index = self
                .seats
                .iter()
                .position(|s| &s.number == number)
                .ok_or_else(|| DomainError::NotFound {
                    entity: "seat",
                    id: format!("{} on ticket {}", number, self.id),
                })?;
            if !self.seats[index].is_vacant() {
                return Err(ConflictError::SeatNotVacant {
                    ticket_id: self.id.to_string(),
                    seat: number.clone(),
                }
                .into());
            }
            indices.push(index);
        }

        let mut seat_ids = Vec::with_capacity(indices.len());
        for index in indices {
            let seat = &mut self.seats[index];
            seat.status = SeatStatus::Booked;
            seat.booked_by = Some(holder.clone());
            seat_ids.push(seat.id.clone());
        }
        self.recount(now);
        Ok(seat_ids)
    }

    /// Returns the given seats to sale. Only seats that are currently
    /// booked are released; the number released is returned.
    pub fn release_seats(&mut self, seat_ids: &[String], now: DateTime<Utc>) -> u32 {
        let mut released = 0;
        for seat in &mut self.seats {
            if seat.status == SeatStatus::Booked && seat_ids.contains(&seat.id) {
                seat.status = SeatStatus::Vacant;
                seat.booked_by = None;
                released += 1;
            }
        }
        self.recount(now);
        released
    }

    /// True when the counters agree with the seat table.
    pub fn is_consistent(&self) -> bool {
        let vacant = self.vacant_seats().count() as u32;
        self.seats.len() as u32 == self.total_seats
            && self.available_seats == vacant
            && (self.status == TicketStatus::Booked) == (self.available_seats == 0)
            && self.dynamic_price >= self.price
            && self.dynamic_price <= self.price_cap()
    }

    /// Highest dynamic price allowed: 2.5 × base, rounded down to the cent.
    pub fn price_cap(&self) -> Money {
        let cap = i128::from(self.price.cents()) * 5 / 2;
        Money::from_cents(i64::try_from(cap).unwrap_or(i64::MAX))
    }

    fn recount(&mut self, now: DateTime<Utc>) {
        self.available_seats = self.vacant_seats().count() as u32;
        self.status = if self.available_seats == 0 {
            TicketStatus::Booked
        } else {
            TicketStatus::Available
        };
        self.updated_at = now;
    }
}

impl Entity for Ticket {
    const KIND: EntityKind = EntityKind::Ticket;

    fn id(&self) -> &EntityId {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use chrono::{Duration, TimeZone};

    use super::*;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 17, 9, 0, 0).unwrap()
    }

    fn ticket(seats: u32) -> Ticket {
        Ticket::new(
            TicketDraft {
                id: EntityId::new("T1"),
                origin: "Lisbon".into(),
                destination: "Porto".into(),
                departure_time: now() + Duration::days(10),
                arrival_time: now() + Duration::days(10) + Duration::hours(3),
                base_price: Money::from_dollars(100),
                total_seats: seats,
                service_provider: EntityId::new("P1"),
                transport_mode: TransportMode::Land,
            },
            now(),
        )
    }

    fn numbers(ns: &[&str]) -> Vec<String> {
        ns.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn new_ticket_allocates_vacant_seats() {
        let t = ticket(3);
        assert_eq!(t.seats.len(), 3);
        assert_eq!(t.seats[2].id, "T1-seat-3");
        assert_eq!(t.seats[2].number, "3");
        assert_eq!(t.available_seats, 3);
        assert_eq!(t.dynamic_price, t.price);
        assert_eq!(t.status, TicketStatus::Available);
        assert!(t.is_consistent());
    }

    #[test]
    fn occupied_seats_never_underflows() {
        let mut t = ticket(2);
        t.available_seats = 5;
        assert_eq!(t.occupied_seats(), 0);

        let quoted = crate::inventory::pricing::quote(&t, now());
        assert_eq!(quoted, t.price);
    }

    #[test]
    fn price_cap_of_huge_price_saturates() {
        let mut t = ticket(1);
        t.price = Money::from_cents(i64::MAX - 1);
        assert_eq!(t.price_cap(), Money::from_cents(i64::MAX));
    }

    #[test]
    fn booking_last_seat_marks_ticket_booked() {
        let mut t = ticket(2);
        let holder = EntityId::new("C1");

        let ids = t.reserve_seats(&numbers(&["1"]), &holder, now()).unwrap();
        assert_eq!(ids, vec!["T1-seat-1"]);
        assert_eq!(t.available_seats, 1);
        assert_eq!(t.status, TicketStatus::Available);

        t.reserve_seats(&numbers(&["2"]), &holder, now()).unwrap();
        assert_eq!(t.available_seats, 0);
        assert_eq!(t.status, TicketStatus::Booked);
        assert_eq!(t.seats[1].booked_by, Some(holder));
        assert!(t.is_consistent());
    }

    #[test]
    fn failed_reservation_changes_nothing() {
        let mut t = ticket(3);
        let holder = EntityId::new("C1");
        t.reserve_seats(&numbers(&["2"]), &holder, now()).unwrap();
        let before = t.clone();

        let taken = t.reserve_seats(&numbers(&["1", "2"]), &holder, now());
        assert!(matches!(
            taken,
            Err(DomainError::Conflict(ConflictError::SeatNotVacant { .. }))
        ));

        let missing = t.reserve_seats(&numbers(&["1", "9"]), &holder, now());
        assert!(matches!(missing, Err(DomainError::NotFound { entity: "seat", .. })));

        let duplicate = t.reserve_seats(&numbers(&["1", "1"]), &holder, now());
        assert!(matches!(
            duplicate,
            Err(DomainError::Validation(ValidationError::DuplicateSeat(_)))
        ));

        let empty = t.reserve_seats(&[], &holder, now());
        assert!(matches!(
            empty,
            Err(DomainError::Validation(ValidationError::NoSeatsRequested))
        ));

        assert_eq!(t, before);
    }

    #[test]
    fn booked_ticket_rejects_reservations() {
        let mut t = ticket(1);
        let holder = EntityId::new("C1");
        t.reserve_seats(&numbers(&["1"]), &holder, now()).unwrap();

        let result = t.reserve_seats(&numbers(&["1"]), &holder, now());
        assert!(matches!(
            result,
            Err(DomainError::Conflict(ConflictError::TicketNotAvailable { .. }))
        ));
    }

    #[test]
    fn release_counts_only_booked_seats() {
        let mut t = ticket(3);
        let holder = EntityId::new("C1");
        let ids = t
            .reserve_seats(&numbers(&["1", "2", "3"]), &holder, now())
            .unwrap();
        t.seats[2].status = SeatStatus::Blocked;

        let released = t.release_seats(&ids, now());
        assert_eq!(released, 2);
        assert_eq!(t.available_seats, 2);
        assert_eq!(t.status, TicketStatus::Available);

        // Releasing again has no further effect
        assert_eq!(t.release_seats(&ids, now()), 0);
        assert_eq!(t.available_seats, 2);
    }

    #[test]
    fn seat_status_wire_form_is_lowercase() {
        let json = serde_json::to_value(ticket(1)).unwrap();
        assert_eq!(json["seats"][0]["status"], "vacant");
        assert_eq!(json["status"], "Available");
        assert_eq!(json["serviceProvider"], "P1");
        assert_eq!(json["dynamicPrice"], 10000);
    }
}
