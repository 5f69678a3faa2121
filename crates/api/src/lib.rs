//! HTTP API server with observability for the travel booking ledger.
//!
//! Provides REST endpoints for providers, customers, tickets, bookings and
//! ticket search, with structured logging (tracing) and Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post, put};
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

pub use routes::{AppState, SharedLedger};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/providers", post(routes::providers::register))
        .route("/providers/{id}", get(routes::providers::get))
        .route(
            "/providers/{id}/deregister",
            post(routes::providers::deregister),
        )
        .route("/providers/{id}/ratings", post(routes::providers::rate))
        .route("/customers", post(routes::customers::register))
        .route("/customers/{id}", get(routes::customers::get))
        .route(
            "/customers/{id}/deregister",
            post(routes::customers::deregister),
        )
        .route(
            "/customers/{id}/visibility",
            put(routes::customers::set_visibility),
        )
        .route("/customers/{id}/bookings", get(routes::customers::bookings))
        .route(
            "/tickets",
            post(routes::tickets::create).get(routes::tickets::list),
        )
        .route("/tickets/{id}", get(routes::tickets::get))
        .route("/tickets/{id}/price", post(routes::tickets::reprice))
        .route("/tickets/{id}/seats", get(routes::tickets::seats))
        .route("/tickets/search/route", get(routes::search::by_route))
        .route(
            "/tickets/search/provider/{id}",
            get(routes::search::by_provider),
        )
        .route("/tickets/search/mode/{mode}", get(routes::search::by_mode))
        .route("/tickets/search/price", get(routes::search::by_price))
        .route("/tickets/search/rating", get(routes::search::by_rating))
        .route("/bookings", post(routes::bookings::create))
        .route("/bookings/{id}", get(routes::bookings::get))
        .route("/bookings/{id}/payment", post(routes::bookings::pay))
        .route("/bookings/{id}/cancel", post(routes::bookings::cancel))
        .route("/payments/{id}", get(routes::bookings::payment))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}
