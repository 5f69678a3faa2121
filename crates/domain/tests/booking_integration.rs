//! Integration tests for the booking engine.
//!
//! These tests drive providers, customers, tickets, bookings and payments
//! through the in-memory ledger and check the seat-inventory invariants
//! after every step.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use common::EntityId;
use domain::{
    BookTicket, Booking, BookingEngine, BookingStatus, CancelBooking, ConfirmPayment,
    ConflictError, CreateTicket, Customer, DirectoryService, DomainError, FixedClock,
    MAX_BASE_PRICE, MAX_SEATS, Money,
    Payment, Provider, RegisterCustomer, RegisterProvider, SeatStatus, Ticket, TicketStatus,
    ValidationError,
};
use futures_util::TryStreamExt;
use ledger::{InMemoryLedger, LedgerError};

/// Mid-October: outside every peak month.
fn off_peak() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap()
}

struct Fixture {
    ledger: InMemoryLedger,
    clock: FixedClock,
    directory: DirectoryService<InMemoryLedger>,
    engine: BookingEngine<InMemoryLedger>,
}

impl Fixture {
    async fn new() -> Self {
        let ledger = InMemoryLedger::new();
        let clock = FixedClock::new(off_peak());
        let directory = DirectoryService::with_clock(ledger.clone(), Arc::new(clock.clone()));
        let engine = BookingEngine::with_clock(ledger.clone(), Arc::new(clock.clone()));

        directory
            .register_provider(RegisterProvider::new("P1", "Coastal Ferries", "water"))
            .await
            .unwrap();
        directory
            .register_customer(RegisterCustomer::new("C1", "Ada", "public"))
            .await
            .unwrap();

        Self {
            ledger,
            clock,
            directory,
            engine,
        }
    }

    fn ticket_cmd(&self, id: &str, seats: i64, base_dollars: i64) -> CreateTicket {
        let departure = off_peak() + Duration::days(10);
        CreateTicket {
            id: id.into(),
            origin: "Piraeus".into(),
            destination: "Santorini".into(),
            departure_time: departure.to_rfc3339(),
            arrival_time: (departure + Duration::hours(8)).to_rfc3339(),
            base_price: Money::from_dollars(base_dollars),
            total_seats: seats,
            provider_id: "P1".into(),
            transport_mode: "water".into(),
        }
    }

    async fn ticket(&self, id: &str) -> Ticket {
        let ticket = self.engine.get_ticket(&id.into()).await.unwrap();
        assert!(ticket.is_consistent(), "inconsistent ticket: {ticket:?}");
        ticket
    }

    async fn customer(&self, id: &str) -> Customer {
        self.directory.get_customer(&id.into()).await.unwrap()
    }
}

mod ticket_creation {
    use super::*;

    #[tokio::test]
    async fn ticket_starts_fully_vacant_at_base_price() {
        let fx = Fixture::new().await;
        let ticket = fx.engine.create_ticket(fx.ticket_cmd("T1", 3, 100)).await.unwrap();

        assert_eq!(ticket.available_seats, 3);
        assert_eq!(ticket.status, TicketStatus::Available);
        assert_eq!(ticket.dynamic_price, Money::from_dollars(100));
        let ids: Vec<_> = ticket.seats.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["T1-seat-1", "T1-seat-2", "T1-seat-3"]);
        assert!(ticket.seats.iter().all(|s| s.booked_by.is_none()));

        let provider: Provider = fx.directory.get_provider(&"P1".into()).await.unwrap();
        assert_eq!(provider.transport_list, vec![EntityId::from("T1")]);
    }

    #[tokio::test]
    async fn invalid_input_is_rejected_before_any_write() {
        let fx = Fixture::new().await;
        let height = ledger::Ledger::height(&fx.ledger).await.unwrap();

        let mut cmd = fx.ticket_cmd("T1", 2, 100);
        cmd.origin = "  ".into();
        assert!(matches!(
            fx.engine.create_ticket(cmd).await,
            Err(DomainError::Validation(ValidationError::Required { field: "origin" }))
        ));

        let mut cmd = fx.ticket_cmd("T1", 2, 100);
        cmd.transport_mode = "rail".into();
        assert!(matches!(
            fx.engine.create_ticket(cmd).await,
            Err(DomainError::Validation(ValidationError::InvalidTransportMode(_)))
        ));

        let mut cmd = fx.ticket_cmd("T1", 2, 100);
        cmd.base_price = Money::zero();
        assert!(matches!(
            fx.engine.create_ticket(cmd).await,
            Err(DomainError::Validation(ValidationError::NonPositivePrice(_)))
        ));

        let mut cmd = fx.ticket_cmd("T1", 2, 100);
        cmd.total_seats = 0;
        assert!(matches!(
            fx.engine.create_ticket(cmd).await,
            Err(DomainError::Validation(ValidationError::NonPositiveSeats(0)))
        ));

        let mut cmd = fx.ticket_cmd("T1", 2, 100);
        cmd.departure_time = "next tuesday".into();
        assert!(matches!(
            fx.engine.create_ticket(cmd).await,
            Err(DomainError::Validation(ValidationError::InvalidTimestamp { .. }))
        ));

        let mut cmd = fx.ticket_cmd("T1", 2, 100);
        cmd.arrival_time = cmd.departure_time.clone();
        assert!(matches!(
            fx.engine.create_ticket(cmd).await,
            Err(DomainError::Validation(ValidationError::DepartureNotBeforeArrival))
        ));

        assert_eq!(ledger::Ledger::height(&fx.ledger).await.unwrap(), height);
        assert!(!fx.engine.ticket_exists(&"T1".into()).await.unwrap());
    }

    #[tokio::test]
    async fn oversized_price_and_seat_count_are_rejected() {
        let fx = Fixture::new().await;

        let mut cmd = fx.ticket_cmd("T1", 2, 100);
        cmd.base_price = "50000000000000000".parse().unwrap();
        assert!(matches!(
            fx.engine.create_ticket(cmd).await,
            Err(DomainError::Validation(ValidationError::PriceTooHigh { .. }))
        ));

        let mut cmd = fx.ticket_cmd("T1", 4_000_000_000, 100);
        assert!(matches!(
            fx.engine.create_ticket(cmd.clone()).await,
            Err(DomainError::Validation(ValidationError::TooManySeats {
                requested: 4_000_000_000,
                ..
            }))
        ));
        cmd.total_seats = i64::from(MAX_SEATS) + 1;
        assert!(matches!(
            fx.engine.create_ticket(cmd).await,
            Err(DomainError::Validation(ValidationError::TooManySeats { .. }))
        ));
        assert!(!fx.engine.ticket_exists(&"T1".into()).await.unwrap());

        let mut cmd = fx.ticket_cmd("T1", 2, 100);
        cmd.base_price = MAX_BASE_PRICE;
        let ticket = fx.engine.create_ticket(cmd).await.unwrap();
        assert_eq!(ticket.price, MAX_BASE_PRICE);

        let booking = fx
            .engine
            .book_ticket(BookTicket::new("B1", "T1", "C1", ["1", "2"]))
            .await
            .unwrap();
        assert_eq!(booking.total_price, Money::from_cents(MAX_BASE_PRICE.cents() * 2));
    }

    #[tokio::test]
    async fn duplicate_ticket_is_rejected() {
        let fx = Fixture::new().await;
        fx.engine.create_ticket(fx.ticket_cmd("T1", 2, 100)).await.unwrap();

        let result = fx.engine.create_ticket(fx.ticket_cmd("T1", 5, 50)).await;
        assert!(matches!(result, Err(DomainError::AlreadyExists { entity: "ticket", .. })));
        assert_eq!(fx.ticket("T1").await.total_seats, 2);
    }

    #[tokio::test]
    async fn provider_must_exist_and_be_active() {
        let fx = Fixture::new().await;

        let mut cmd = fx.ticket_cmd("T1", 2, 100);
        cmd.provider_id = "P404".into();
        assert!(matches!(
            fx.engine.create_ticket(cmd).await,
            Err(DomainError::NotFound { entity: "provider", .. })
        ));

        fx.directory.deregister_provider(&"P1".into()).await.unwrap();
        assert!(matches!(
            fx.engine.create_ticket(fx.ticket_cmd("T1", 2, 100)).await,
            Err(DomainError::Conflict(ConflictError::ProviderInactive { .. }))
        ));
    }

    #[tokio::test]
    async fn ids_are_namespaced_per_kind() {
        let fx = Fixture::new().await;
        fx.directory
            .register_provider(RegisterProvider::new("X", "Shared", "air"))
            .await
            .unwrap();
        fx.directory
            .register_customer(RegisterCustomer::new("X", "Shared", "anonymous"))
            .await
            .unwrap();
        let mut cmd = fx.ticket_cmd("X", 1, 10);
        cmd.provider_id = "X".into();
        cmd.transport_mode = "air".into();
        fx.engine.create_ticket(cmd).await.unwrap();

        assert_eq!(fx.directory.get_provider(&"X".into()).await.unwrap().name, "Shared");
        assert_eq!(fx.customer("X").await.name, "Shared");
        assert_eq!(fx.ticket("X").await.total_seats, 1);
    }
}

mod seat_reservation {
    use super::*;

    #[tokio::test]
    async fn two_seat_ticket_books_out_one_seat_at_a_time() {
        let fx = Fixture::new().await;
        fx.engine.create_ticket(fx.ticket_cmd("T1", 2, 100)).await.unwrap();

        let ticket = fx.engine.update_dynamic_price(&"T1".into()).await.unwrap();
        assert_eq!(ticket.dynamic_price, Money::from_dollars(100));

        fx.engine
            .book_ticket(BookTicket::new("B1", "T1", "C1", ["1"]))
            .await
            .unwrap();
        let ticket = fx.ticket("T1").await;
        assert_eq!(ticket.available_seats, 1);
        assert_eq!(ticket.status, TicketStatus::Available);

        let second = fx
            .engine
            .book_ticket(BookTicket::new("B2", "T1", "C1", ["2"]))
            .await
            .unwrap();
        let ticket = fx.ticket("T1").await;
        assert_eq!(ticket.available_seats, 0);
        assert_eq!(ticket.status, TicketStatus::Booked);
        assert_eq!(second.total_price, Money::from_dollars(100));
        assert_eq!(second.status, BookingStatus::Pending);
        assert_eq!(second.seat_ids, vec!["T1-seat-2"]);

        assert_eq!(
            fx.customer("C1").await.booking_history,
            vec![EntityId::from("B1"), EntityId::from("B2")]
        );
    }

    #[tokio::test]
    async fn booked_out_ticket_rejects_further_bookings() {
        let fx = Fixture::new().await;
        fx.engine.create_ticket(fx.ticket_cmd("T1", 1, 100)).await.unwrap();
        fx.engine
            .book_ticket(BookTicket::new("B1", "T1", "C1", ["1"]))
            .await
            .unwrap();

        let result = fx
            .engine
            .book_ticket(BookTicket::new("B2", "T1", "C1", ["1"]))
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Conflict(ConflictError::TicketNotAvailable { .. }))
        ));
    }

    #[tokio::test]
    async fn partial_reservation_never_happens() {
        let fx = Fixture::new().await;
        fx.engine.create_ticket(fx.ticket_cmd("T1", 3, 100)).await.unwrap();
        fx.engine
            .book_ticket(BookTicket::new("B1", "T1", "C1", ["2"]))
            .await
            .unwrap();

        let taken = fx
            .engine
            .book_ticket(BookTicket::new("B2", "T1", "C1", ["1", "2"]))
            .await;
        assert!(matches!(
            taken,
            Err(DomainError::Conflict(ConflictError::SeatNotVacant { .. }))
        ));

        let missing = fx
            .engine
            .book_ticket(BookTicket::new("B2", "T1", "C1", ["1", "9"]))
            .await;
        assert!(matches!(missing, Err(DomainError::NotFound { entity: "seat", .. })));

        let ticket = fx.ticket("T1").await;
        assert_eq!(ticket.available_seats, 2);
        assert_eq!(ticket.seats[0].status, SeatStatus::Vacant);
        assert!(fx.engine.get_booking(&"B2".into()).await.is_err());
        assert_eq!(fx.customer("C1").await.booking_history.len(), 1);
    }

    #[tokio::test]
    async fn request_shape_is_validated() {
        let fx = Fixture::new().await;
        fx.engine.create_ticket(fx.ticket_cmd("T1", 3, 100)).await.unwrap();

        let none: [&str; 0] = [];
        assert!(matches!(
            fx.engine.book_ticket(BookTicket::new("B1", "T1", "C1", none)).await,
            Err(DomainError::Validation(ValidationError::NoSeatsRequested))
        ));
        assert!(matches!(
            fx.engine
                .book_ticket(BookTicket::new("B1", "T1", "C1", ["1", "1"]))
                .await,
            Err(DomainError::Validation(ValidationError::DuplicateSeat(_)))
        ));
        assert!(matches!(
            fx.engine.book_ticket(BookTicket::new("", "T1", "C1", ["1"])).await,
            Err(DomainError::Validation(ValidationError::Required { .. }))
        ));
    }

    #[tokio::test]
    async fn customer_must_be_active() {
        let fx = Fixture::new().await;
        fx.engine.create_ticket(fx.ticket_cmd("T1", 2, 100)).await.unwrap();
        fx.directory.deregister_customer(&"C1".into()).await.unwrap();

        let result = fx
            .engine
            .book_ticket(BookTicket::new("B1", "T1", "C1", ["1"]))
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Conflict(ConflictError::CustomerInactive { .. }))
        ));
        assert_eq!(fx.ticket("T1").await.available_seats, 2);
    }

    #[tokio::test]
    async fn booking_is_priced_at_dynamic_price() {
        let fx = Fixture::new().await;
        fx.engine.create_ticket(fx.ticket_cmd("T1", 4, 100)).await.unwrap();
        fx.engine
            .book_ticket(BookTicket::new("B1", "T1", "C1", ["1", "2"]))
            .await
            .unwrap();

        // Half full: occupancy factor 1.25
        let ticket = fx.engine.update_dynamic_price(&"T1".into()).await.unwrap();
        assert_eq!(ticket.dynamic_price, Money::from_dollars(125));

        let booking = fx
            .engine
            .book_ticket(BookTicket::new("B2", "T1", "C1", ["3"]))
            .await
            .unwrap();
        assert_eq!(booking.total_price, Money::from_dollars(125));
    }

    #[tokio::test]
    async fn total_that_would_overflow_is_rejected_without_writing() {
        let fx = Fixture::new().await;
        fx.engine.create_ticket(fx.ticket_cmd("T1", 2, 100)).await.unwrap();

        // A stored price no ticket command would accept
        let repo = fx.engine.repository();
        let mut uow = repo.begin();
        let mut ticket: Ticket = uow.require(&"T1".into()).await.unwrap();
        ticket.price = Money::from_cents(5_000_000_000_000_000_000);
        ticket.dynamic_price = ticket.price;
        uow.stage(&ticket).unwrap();
        uow.commit().await.unwrap();
        let height = ledger::Ledger::height(&fx.ledger).await.unwrap();

        let result = fx
            .engine
            .book_ticket(BookTicket::new("B1", "T1", "C1", ["1", "2"]))
            .await;
        assert!(matches!(
            result,
            Err(DomainError::Validation(ValidationError::InvalidAmount { .. }))
        ));

        assert_eq!(ledger::Ledger::height(&fx.ledger).await.unwrap(), height);
        assert_eq!(fx.ticket("T1").await.available_seats, 2);
        assert!(fx.engine.get_booking(&"B1".into()).await.is_err());
        assert!(fx.customer("C1").await.booking_history.is_empty());
    }
}

mod payment {
    use super::*;

    #[tokio::test]
    async fn confirm_payment_records_payment_and_tx_ref() {
        let fx = Fixture::new().await;
        fx.engine.create_ticket(fx.ticket_cmd("T1", 2, 100)).await.unwrap();
        fx.engine
            .book_ticket(BookTicket::new("B1", "T1", "C1", ["1", "2"]))
            .await
            .unwrap();

        let payment = fx
            .engine
            .confirm_payment(ConfirmPayment::new("B1", "TX-42"))
            .await
            .unwrap();
        assert_eq!(payment.id, Payment::id_for(&"B1".into()));
        assert_eq!(payment.amount, Money::from_dollars(200));
        assert_eq!(payment.transaction_id, "TX-42");

        let booking: Booking = fx.engine.get_booking(&"B1".into()).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Confirmed);
        assert!(booking.is_payment_confirmed);
        assert!(booking.payment_tx_ref.is_some());

        let stored = fx.engine.get_payment(&payment.id).await.unwrap();
        assert_eq!(stored, payment);
    }

    #[tokio::test]
    async fn confirm_requires_pending_booking_and_reference() {
        let fx = Fixture::new().await;
        fx.engine.create_ticket(fx.ticket_cmd("T1", 2, 100)).await.unwrap();
        fx.engine
            .book_ticket(BookTicket::new("B1", "T1", "C1", ["1"]))
            .await
            .unwrap();

        assert!(matches!(
            fx.engine.confirm_payment(ConfirmPayment::new("B1", "")).await,
            Err(DomainError::Validation(_))
        ));
        assert!(matches!(
            fx.engine.confirm_payment(ConfirmPayment::new("B404", "TX")).await,
            Err(DomainError::NotFound { entity: "booking", .. })
        ));

        fx.engine
            .confirm_payment(ConfirmPayment::new("B1", "TX-1"))
            .await
            .unwrap();
        assert!(matches!(
            fx.engine.confirm_payment(ConfirmPayment::new("B1", "TX-2")).await,
            Err(DomainError::Conflict(ConflictError::BookingNotPending {
                status: BookingStatus::Confirmed,
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn price_drift_since_booking_is_rejected() {
        let fx = Fixture::new().await;
        fx.engine.create_ticket(fx.ticket_cmd("T1", 2, 100)).await.unwrap();
        fx.engine
            .book_ticket(BookTicket::new("B1", "T1", "C1", ["1"]))
            .await
            .unwrap();

        // One of two seats gone: 100 -> 125
        fx.engine.update_dynamic_price(&"T1".into()).await.unwrap();

        let result = fx
            .engine
            .confirm_payment(ConfirmPayment::new("B1", "TX-1"))
            .await;
        match result {
            Err(DomainError::Conflict(ConflictError::PriceMismatch {
                expected, booked, ..
            })) => {
                assert_eq!(expected, Money::from_dollars(125));
                assert_eq!(booked, Money::from_dollars(100));
            }
            other => panic!("expected price mismatch, got {other:?}"),
        }

        let booking = fx.engine.get_booking(&"B1".into()).await.unwrap();
        assert_eq!(booking.status, BookingStatus::Pending);
        assert!(
            fx.engine
                .get_payment(&Payment::id_for(&"B1".into()))
                .await
                .is_err()
        );
    }
}

mod cancellation {
    use super::*;

    #[tokio::test]
    async fn cancel_restores_inventory_and_refunds_eighty_percent() {
        let fx = Fixture::new().await;
        fx.engine.create_ticket(fx.ticket_cmd("T1", 2, 100)).await.unwrap();
        let before = fx.ticket("T1").await;

        fx.engine
            .book_ticket(BookTicket::new("B1", "T1", "C1", ["1", "2"]))
            .await
            .unwrap();
        assert_eq!(fx.ticket("T1").await.status, TicketStatus::Booked);

        fx.clock.advance(Duration::hours(1));
        let cancelled = fx
            .engine
            .cancel_booking(CancelBooking::new("B1"))
            .await
            .unwrap();

        assert_eq!(cancelled.status, BookingStatus::Cancelled);
        assert_eq!(cancelled.original_total, Money::from_dollars(200));
        assert_eq!(cancelled.total_price, Money::from_dollars(160));
        assert_eq!(cancelled.refund_amount, Some(Money::from_dollars(160)));
        assert!(cancelled.is_payment_confirmed);

        let after = fx.ticket("T1").await;
        assert_eq!(after.available_seats, before.available_seats);
        assert_eq!(after.status, TicketStatus::Available);
        assert!(
            after
                .seats
                .iter()
                .all(|s| s.status == SeatStatus::Vacant && s.booked_by.is_none())
        );
        assert!(fx.customer("C1").await.booking_history.is_empty());
    }

    #[tokio::test]
    async fn cancel_removes_only_its_own_booking_from_history() {
        let fx = Fixture::new().await;
        fx.engine.create_ticket(fx.ticket_cmd("T1", 3, 100)).await.unwrap();
        for (booking, seat) in [("B1", "1"), ("B2", "2")] {
            fx.engine
                .book_ticket(BookTicket::new(booking, "T1", "C1", [seat]))
                .await
                .unwrap();
        }

        fx.engine
            .cancel_booking(CancelBooking::new("B1"))
            .await
            .unwrap();

        assert_eq!(fx.customer("C1").await.booking_history, vec![EntityId::from("B2")]);
        let ticket = fx.ticket("T1").await;
        assert_eq!(ticket.available_seats, 2);
        assert_eq!(ticket.seats[1].status, SeatStatus::Booked);
    }

    #[tokio::test]
    async fn second_cancellation_is_rejected() {
        let fx = Fixture::new().await;
        fx.engine.create_ticket(fx.ticket_cmd("T1", 2, 100)).await.unwrap();
        fx.engine
            .book_ticket(BookTicket::new("B1", "T1", "C1", ["1"]))
            .await
            .unwrap();
        fx.engine
            .cancel_booking(CancelBooking::new("B1"))
            .await
            .unwrap();

        // Someone else takes the released seat
        fx.engine
            .book_ticket(BookTicket::new("B2", "T1", "C1", ["1"]))
            .await
            .unwrap();

        let result = fx.engine.cancel_booking(CancelBooking::new("B1")).await;
        assert!(matches!(
            result,
            Err(DomainError::Conflict(ConflictError::BookingAlreadyCancelled { .. }))
        ));
        let ticket = fx.ticket("T1").await;
        assert_eq!(ticket.available_seats, 1);
        assert_eq!(ticket.seats[0].booked_by, Some(EntityId::from("C1")));
    }

    #[tokio::test]
    async fn confirmed_booking_can_be_cancelled() {
        let fx = Fixture::new().await;
        fx.engine.create_ticket(fx.ticket_cmd("T1", 2, 100)).await.unwrap();
        fx.engine
            .book_ticket(BookTicket::new("B1", "T1", "C1", ["1"]))
            .await
            .unwrap();
        fx.engine
            .confirm_payment(ConfirmPayment::new("B1", "TX"))
            .await
            .unwrap();

        let cancelled = fx
            .engine
            .cancel_booking(CancelBooking::new("B1"))
            .await
            .unwrap();
        assert_eq!(cancelled.total_price, Money::from_dollars(80));
    }
}

mod ledger_semantics {
    use super::*;

    #[tokio::test]
    async fn concurrent_change_surfaces_as_ledger_conflict() {
        let fx = Fixture::new().await;
        fx.engine.create_ticket(fx.ticket_cmd("T1", 2, 100)).await.unwrap();

        let repo = fx.engine.repository();
        let mut uow = repo.begin();
        let mut stale: Ticket = uow.require(&"T1".into()).await.unwrap();

        fx.engine
            .book_ticket(BookTicket::new("B1", "T1", "C1", ["1"]))
            .await
            .unwrap();

        stale.origin = "Rafina".into();
        uow.stage(&stale).unwrap();
        let result = uow.commit().await;
        assert!(matches!(
            result,
            Err(DomainError::Ledger(LedgerError::Conflict { .. }))
        ));
        assert_eq!(fx.ticket("T1").await.available_seats, 1);
    }

    #[tokio::test]
    async fn malformed_record_is_strict_for_reads_and_skipped_in_scans() {
        let fx = Fixture::new().await;
        fx.engine.create_ticket(fx.ticket_cmd("T1", 1, 100)).await.unwrap();
        fx.engine.create_ticket(fx.ticket_cmd("T3", 1, 100)).await.unwrap();
        fx.ledger.put_raw("ticket:T2", b"{not json".to_vec()).await;

        assert!(matches!(
            fx.engine.get_ticket(&"T2".into()).await,
            Err(DomainError::Codec(_))
        ));

        let tickets: Vec<Ticket> = fx
            .engine
            .repository()
            .scan::<Ticket>()
            .await
            .unwrap()
            .try_collect()
            .await
            .unwrap();
        let ids: Vec<_> = tickets.iter().map(|t| t.id.as_str()).collect();
        assert_eq!(ids, vec!["T1", "T3"]);
    }
}
