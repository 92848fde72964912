use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, Turf};
use crate::state::AppState;

fn check_auth(headers: &HeaderMap, expected_token: &str) -> Result<(), AppError> {
    let auth = headers
        .get("authorization")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("");

    let token = auth.strip_prefix("Bearer ").unwrap_or("");
    if token != expected_token {
        return Err(AppError::Unauthorized);
    }
    Ok(())
}

// POST /api/admin/turfs
#[derive(Deserialize)]
pub struct CreateTurfRequest {
    pub name: String,
    pub address: String,
    pub city: String,
    pub price_per_hour: f64,
    pub currency: Option<String>,
    pub opening_time: String,
    pub closing_time: String,
    pub sport_types: Vec<String>,
    pub facilities: Option<Vec<String>>,
}

pub async fn create_turf(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(body): Json<CreateTurfRequest>,
) -> Result<(StatusCode, Json<Turf>), AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let turf = Turf {
        id: Uuid::new_v4().to_string(),
        name: body.name,
        address: body.address,
        city: body.city,
        price_per_hour: body.price_per_hour,
        currency: body.currency.unwrap_or_else(|| "INR".to_string()),
        opening_time: body.opening_time,
        closing_time: body.closing_time,
        is_active: true,
        sport_types: body.sport_types,
        facilities: body.facilities.unwrap_or_default(),
    };
    turf.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;

    {
        let db = state.db.lock().unwrap();
        queries::create_turf(&db, &turf)?;
    }

    tracing::info!(turf_id = %turf.id, name = %turf.name, "turf created");
    Ok((StatusCode::CREATED, Json(turf)))
}

// PUT /api/admin/turfs/:id
#[derive(Deserialize)]
pub struct UpdateTurfRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub city: Option<String>,
    pub price_per_hour: Option<f64>,
    pub currency: Option<String>,
    pub opening_time: Option<String>,
    pub closing_time: Option<String>,
    pub is_active: Option<bool>,
    pub sport_types: Option<Vec<String>>,
    pub facilities: Option<Vec<String>>,
}

pub async fn update_turf(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateTurfRequest>,
) -> Result<Json<Turf>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let mut turf =
        queries::get_turf(&db, &id)?.ok_or_else(|| AppError::NotFound(format!("turf {id}")))?;

    if let Some(name) = body.name {
        turf.name = name;
    }
    if let Some(address) = body.address {
        turf.address = address;
    }
    if let Some(city) = body.city {
        turf.city = city;
    }
    if let Some(price) = body.price_per_hour {
        turf.price_per_hour = price;
    }
    if let Some(currency) = body.currency {
        turf.currency = currency;
    }
    if let Some(opening) = body.opening_time {
        turf.opening_time = opening;
    }
    if let Some(closing) = body.closing_time {
        turf.closing_time = closing;
    }
    if let Some(active) = body.is_active {
        turf.is_active = active;
    }
    if let Some(sports) = body.sport_types {
        turf.sport_types = sports;
    }
    if let Some(facilities) = body.facilities {
        turf.facilities = facilities;
    }

    turf.validate()
        .map_err(|e| AppError::Validation(e.to_string()))?;
    queries::update_turf(&db, &turf)?;

    Ok(Json(turf))
}

// GET /api/admin/bookings
#[derive(Deserialize)]
pub struct AdminBookingsQuery {
    pub status: Option<String>,
    pub limit: Option<i64>,
}

pub async fn get_bookings(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<AdminBookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let limit = query.limit.unwrap_or(50);
    let bookings = {
        let db = state.db.lock().unwrap();
        queries::get_all_bookings(&db, query.status.as_deref(), limit)?
    };
    Ok(Json(bookings))
}

// POST /api/admin/bookings/:id/status
#[derive(Deserialize)]
pub struct UpdateStatusRequest {
    pub status: String,
}

pub async fn update_booking_status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<UpdateStatusRequest>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let next = match body.status.as_str() {
        "pending" => BookingStatus::Pending,
        "confirmed" => BookingStatus::Confirmed,
        "cancelled" => BookingStatus::Cancelled,
        "completed" => BookingStatus::Completed,
        other => {
            return Err(AppError::Validation(format!("unknown status: {other}")));
        }
    };

    let db = state.db.lock().unwrap();
    let booking = queries::get_booking_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

    if booking.status == next {
        return Ok(Json(booking));
    }
    if !booking.status.can_transition_to(next) {
        return Err(AppError::Conflict(format!(
            "cannot move booking from {} to {}",
            booking.status.as_str(),
            next.as_str()
        )));
    }

    queries::update_booking_status(&db, &id, next)?;
    let updated = queries::get_booking_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
    Ok(Json(updated))
}

// POST /api/admin/bookings/:id/cancel — not subject to the customer
// cancellation cutoff.
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let db = state.db.lock().unwrap();
    let booking = queries::get_booking_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

    if booking.status == BookingStatus::Cancelled {
        return Ok(Json(booking));
    }
    if !booking.status.can_transition_to(BookingStatus::Cancelled) {
        return Err(AppError::Conflict(format!(
            "a {} booking cannot be cancelled",
            booking.status.as_str()
        )));
    }

    queries::update_booking_status(&db, &id, BookingStatus::Cancelled)?;
    let updated = queries::get_booking_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
    Ok(Json(updated))
}

// GET /api/admin/stats
#[derive(Serialize)]
pub struct StatsResponse {
    pub active_turfs: i64,
    pub upcoming_confirmed_bookings: i64,
    pub todays_bookings: i64,
}

pub async fn get_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Json<StatsResponse>, AppError> {
    check_auth(&headers, &state.config.admin_token)?;

    let stats = {
        let db = state.db.lock().unwrap();
        queries::get_dashboard_stats(&db)?
    };

    Ok(Json(StatsResponse {
        active_turfs: stats.active_turfs,
        upcoming_confirmed_bookings: stats.upcoming_confirmed_bookings,
        todays_bookings: stats.todays_bookings,
    }))
}
