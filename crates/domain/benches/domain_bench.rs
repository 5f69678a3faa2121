use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use domain::{
    BookTicket, BookingEngine, CancelBooking, CreateTicket, DirectoryService, FixedClock, Money,
    PriceFactors, RegisterCustomer, RegisterProvider, inventory::pricing,
};
use ledger::InMemoryLedger;

fn ticket_cmd(id: &str, seats: i64) -> CreateTicket {
    let departure = Utc.with_ymd_and_hms(2026, 10, 27, 8, 0, 0).unwrap();
    CreateTicket {
        id: id.into(),
        origin: "LIS".into(),
        destination: "OPO".into(),
        departure_time: departure.to_rfc3339(),
        arrival_time: (departure + Duration::hours(1)).to_rfc3339(),
        base_price: Money::from_dollars(80),
        total_seats: seats,
        provider_id: "P1".into(),
        transport_mode: "air".into(),
    }
}

async fn setup() -> (DirectoryService<InMemoryLedger>, BookingEngine<InMemoryLedger>) {
    let ledger = InMemoryLedger::new();
    let clock = Arc::new(FixedClock::new(
        Utc.with_ymd_and_hms(2026, 10, 17, 12, 0, 0).unwrap(),
    ));
    let directory = DirectoryService::with_clock(ledger.clone(), clock.clone());
    let engine = BookingEngine::with_clock(ledger, clock);

    directory
        .register_provider(RegisterProvider::new("P1", "Bench Air", "air"))
        .await
        .unwrap();
    directory
        .register_customer(RegisterCustomer::new("C1", "Bench", "public"))
        .await
        .unwrap();
    (directory, engine)
}

fn bench_dynamic_price(c: &mut Criterion) {
    let factors = PriceFactors {
        booked_seats: 137,
        total_seats: 180,
        time_pct: 120,
        season_pct: 120,
    };

    c.bench_function("domain/dynamic_price", |b| {
        b.iter(|| pricing::dynamic_price(Money::from_cents(12_999), &factors));
    });
}

fn bench_create_ticket(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let mut group = c.benchmark_group("domain/create_ticket");

    for seats in [10_i64, 200] {
        group.bench_with_input(BenchmarkId::from_parameter(seats), &seats, |b, &seats| {
            b.iter(|| {
                rt.block_on(async {
                    let (_, engine) = setup().await;
                    engine.create_ticket(ticket_cmd("T1", seats)).await.unwrap();
                });
            });
        });
    }
    group.finish();
}

fn bench_book_and_cancel(c: &mut Criterion) {
    let rt = tokio::runtime::Runtime::new().unwrap();
    let (_directory, engine) = rt.block_on(setup());
    rt.block_on(async { engine.create_ticket(ticket_cmd("T1", 200)).await.unwrap() });

    let mut n = 0_u64;
    c.bench_function("domain/book_then_cancel", |b| {
        b.iter(|| {
            n += 1;
            let booking_id = format!("B{n}");
            rt.block_on(async {
                engine
                    .book_ticket(BookTicket::new(
                        booking_id.as_str(),
                        "T1",
                        "C1",
                        ["1", "2"],
                    ))
                    .await
                    .unwrap();
                engine
                    .cancel_booking(CancelBooking::new(booking_id.as_str()))
                    .await
                    .unwrap();
            });
        });
    });
}

criterion_group!(
    benches,
    bench_dynamic_price,
    bench_create_ticket,
    bench_book_and_cancel
);
criterion_main!(benches);
