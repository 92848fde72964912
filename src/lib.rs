pub mod config;
pub mod db;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod services;
pub mod state;

use std::sync::Arc;

use axum::routing::{get, post, put};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(handlers::health::health))
        .route("/api/turfs", get(handlers::turfs::list_turfs))
        .route("/api/turfs/:id", get(handlers::turfs::get_turf))
        .route(
            "/api/turfs/:id/availability",
            get(handlers::turfs::get_availability),
        )
        .route("/api/bookings", post(handlers::bookings::create_booking))
        .route("/api/bookings", get(handlers::bookings::list_bookings))
        .route("/api/bookings/:id", get(handlers::bookings::get_booking))
        .route("/api/bookings/:id", put(handlers::bookings::update_booking))
        .route(
            "/api/bookings/:id/cancel",
            put(handlers::bookings::cancel_booking),
        )
        .route(
            "/api/bookings/:id/payment/order",
            post(handlers::payments::create_order),
        )
        .route(
            "/api/bookings/:id/payment/verify",
            post(handlers::payments::verify_payment),
        )
        .route("/api/admin/turfs", post(handlers::admin::create_turf))
        .route("/api/admin/turfs/:id", put(handlers::admin::update_turf))
        .route("/api/admin/bookings", get(handlers::admin::get_bookings))
        .route(
            "/api/admin/bookings/:id/status",
            post(handlers::admin::update_booking_status),
        )
        .route(
            "/api/admin/bookings/:id/cancel",
            post(handlers::admin::cancel_booking),
        )
        .route("/api/admin/stats", get(handlers::admin::get_stats))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
