//! Dynamic pricing.
//!
//! The quoted price is the base price scaled by three factors:
//!
//! | factor    | value                                                        |
//! |-----------|--------------------------------------------------------------|
//! | occupancy | `1 + 0.5 × booked / total`                                   |
//! | time      | 1.3 under a day to departure, 1.2 under 3, 1.1 under 7, else 1 |
//! | season    | 1.2 in June, July, August, December and January, else 1      |
//!
//! clamped to `[base, 2.5 × base]` and truncated to the cent. All of it is
//! computed on integers: `base × (2T + B) × time% × season% / (2T × 100 × 100)`.

use chrono::{DateTime, Datelike, Duration, Utc};

use super::Ticket;
use crate::value_objects::Money;

/// The inputs of one price computation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PriceFactors {
    pub booked_seats: u32,
    pub total_seats: u32,

    /// Time-to-departure factor in percent (100..=130).
    pub time_pct: u32,

    /// Seasonal factor in percent (100 or 120).
    pub season_pct: u32,
}

impl PriceFactors {
    /// Collects the factors for `ticket` as of `now`.
    pub fn for_ticket(ticket: &Ticket, now: DateTime<Utc>) -> Self {
        Self {
            booked_seats: ticket.occupied_seats(),
            total_seats: ticket.total_seats,
            time_pct: time_pct(ticket.departure_time - now),
            season_pct: season_pct(now),
        }
    }

    pub fn occupancy_factor(&self) -> f64 {
        if self.total_seats == 0 {
            return 1.0;
        }
        1.0 + 0.5 * f64::from(self.booked_seats) / f64::from(self.total_seats)
    }

    pub fn time_factor(&self) -> f64 {
        f64::from(self.time_pct) / 100.0
    }

    pub fn seasonal_factor(&self) -> f64 {
        f64::from(self.season_pct) / 100.0
    }
}

/// Time factor in percent for the given time left before departure.
/// Departures already in the past count as last-minute.
pub fn time_pct(until_departure: Duration) -> u32 {
    if until_departure < Duration::days(1) {
        130
    } else if until_departure < Duration::days(3) {
        120
    } else if until_departure < Duration::days(7) {
        110
    } else {
        100
    }
}

pub fn is_peak_month(month: u32) -> bool {
    matches!(month, 6 | 7 | 8 | 12 | 1)
}

/// Seasonal factor in percent for the UTC month of `now`.
pub fn season_pct(now: DateTime<Utc>) -> u32 {
    if is_peak_month(now.month()) { 120 } else { 100 }
}

/// Computes the dynamic price for `base` under `factors`.
pub fn dynamic_price(base: Money, factors: &PriceFactors) -> Money {
    let base_cents = i128::from(base.cents());
    if factors.total_seats == 0 || base_cents <= 0 {
        return base;
    }

    let total = i128::from(factors.total_seats);
    let booked = i128::from(factors.booked_seats.min(factors.total_seats));
    let numerator = base_cents
        * (2 * total + booked)
        * i128::from(factors.time_pct)
        * i128::from(factors.season_pct);
    let raw = numerator / (2 * total * 100 * 100);

    let cap = base_cents * 5 / 2;
    let clamped = raw.clamp(base_cents, cap);

    // clamped lies within [base, 2.5 × base], which fits in i64
    Money::from_cents(i64::try_from(clamped).unwrap_or(i64::MAX))
}

/// Quotes the current price of `ticket`.
pub fn quote(ticket: &Ticket, now: DateTime<Utc>) -> Money {
    dynamic_price(ticket.price, &PriceFactors::for_ticket(ticket, now))
}
