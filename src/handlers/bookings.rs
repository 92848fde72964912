use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{Local, Utc};
use serde::Deserialize;
use uuid::Uuid;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Booking, BookingStatus, PaymentStatus};
use crate::services::scheduling;
use crate::state::AppState;

// POST /api/bookings
#[derive(Deserialize)]
pub struct CreateBookingRequest {
    pub turf_id: String,
    pub user_id: String,
    pub date: String,
    pub start_time: String,
    pub end_time: String,
    /// Optional client-side duration, accepted only when it agrees with
    /// the time range.
    pub duration_minutes: Option<i32>,
}

pub async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBookingRequest>,
) -> Result<(StatusCode, Json<Booking>), AppError> {
    scheduling::validate_date(&body.date)?;
    if body.user_id.trim().is_empty() {
        return Err(AppError::Validation("user_id is required".to_string()));
    }

    let db = state.db.lock().unwrap();

    let turf = queries::get_turf(&db, &body.turf_id)?
        .ok_or_else(|| AppError::NotFound(format!("turf {}", body.turf_id)))?;
    if !turf.is_active {
        return Err(AppError::Validation(format!(
            "turf {} is not accepting bookings",
            turf.id
        )));
    }

    let duration_minutes =
        scheduling::validate_time_range(&turf, &body.start_time, &body.end_time, body.duration_minutes)?;

    // Fast-path check for a friendly message; the unique index below is
    // what actually prevents a concurrent double-booking.
    scheduling::ensure_slot_free(
        &db,
        &turf.id,
        &body.date,
        &body.start_time,
        &body.end_time,
        None,
    )?;

    let now = Utc::now().naive_utc();
    let booking = Booking {
        id: Uuid::new_v4().to_string(),
        turf_id: turf.id.clone(),
        user_id: body.user_id,
        date: body.date,
        start_time: body.start_time,
        end_time: body.end_time,
        duration_minutes,
        total_price: scheduling::compute_total_price(turf.price_per_hour, duration_minutes),
        status: BookingStatus::Pending,
        payment_status: PaymentStatus::Pending,
        payment_order_id: None,
        created_at: now,
        updated_at: now,
    };

    if let Err(e) = queries::create_booking(&db, &booking) {
        if queries::is_unique_violation(&e) {
            return Err(AppError::Conflict(format!(
                "slot {}-{} was just taken",
                booking.start_time, booking.end_time
            )));
        }
        return Err(e.into());
    }

    tracing::info!(
        booking_id = %booking.id,
        turf_id = %booking.turf_id,
        date = %booking.date,
        "booking created"
    );

    Ok((StatusCode::CREATED, Json(booking)))
}

// GET /api/bookings?user_id=
#[derive(Deserialize)]
pub struct BookingsQuery {
    pub user_id: String,
}

pub async fn list_bookings(
    State(state): State<Arc<AppState>>,
    Query(query): Query<BookingsQuery>,
) -> Result<Json<Vec<Booking>>, AppError> {
    let bookings = {
        let db = state.db.lock().unwrap();
        queries::get_bookings_for_user(&db, &query.user_id)?
    };
    Ok(Json(bookings))
}

// GET /api/bookings/:id
pub async fn get_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_id(&db, &id)?
    };

    booking
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))
}

// PUT /api/bookings/:id
#[derive(Deserialize)]
pub struct UpdateBookingRequest {
    pub date: Option<String>,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub duration_minutes: Option<i32>,
}

pub async fn update_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<UpdateBookingRequest>,
) -> Result<Json<Booking>, AppError> {
    let db = state.db.lock().unwrap();

    let booking = queries::get_booking_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

    match booking.status {
        BookingStatus::Cancelled | BookingStatus::Completed => {
            return Err(AppError::Validation(format!(
                "a {} booking cannot be modified",
                booking.status.as_str()
            )));
        }
        BookingStatus::Pending | BookingStatus::Confirmed => {}
    }

    let date = body.date.unwrap_or_else(|| booking.date.clone());
    let start_time = body.start_time.unwrap_or_else(|| booking.start_time.clone());
    let end_time = body.end_time.unwrap_or_else(|| booking.end_time.clone());
    scheduling::validate_date(&date)?;

    let turf = queries::get_turf(&db, &booking.turf_id)?
        .ok_or_else(|| AppError::NotFound(format!("turf {}", booking.turf_id)))?;

    let duration_minutes =
        scheduling::validate_time_range(&turf, &start_time, &end_time, body.duration_minutes)?;

    let range_changed = date != booking.date
        || start_time != booking.start_time
        || end_time != booking.end_time;

    if range_changed {
        scheduling::ensure_slot_free(&db, &turf.id, &date, &start_time, &end_time, Some(&id))?;
    }

    // Price is re-snapshotted from the turf's current rate when the range
    // changes; otherwise the original snapshot stands.
    let total_price = if range_changed {
        scheduling::compute_total_price(turf.price_per_hour, duration_minutes)
    } else {
        booking.total_price
    };

    if let Err(e) = queries::update_booking_times(
        &db,
        &id,
        &date,
        &start_time,
        &end_time,
        duration_minutes,
        total_price,
    ) {
        if queries::is_unique_violation(&e) {
            return Err(AppError::Conflict(format!(
                "slot {start_time}-{end_time} was just taken"
            )));
        }
        return Err(e.into());
    }

    let updated = queries::get_booking_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
    Ok(Json(updated))
}

// PUT /api/bookings/:id/cancel
pub async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Booking>, AppError> {
    let db = state.db.lock().unwrap();

    let booking = queries::get_booking_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;

    // Cancelling twice is a no-op, not an error.
    if booking.status == BookingStatus::Cancelled {
        return Ok(Json(booking));
    }

    if !booking.status.can_transition_to(BookingStatus::Cancelled) {
        return Err(AppError::Validation(format!(
            "a {} booking cannot be cancelled",
            booking.status.as_str()
        )));
    }

    let cutoff = state.config.cancellation_cutoff_minutes;
    if !scheduling::cancellable_at(&booking, cutoff, Local::now().naive_local()) {
        return Err(AppError::Validation(format!(
            "bookings can only be cancelled at least {cutoff} minutes before the slot starts"
        )));
    }

    queries::update_booking_status(&db, &id, BookingStatus::Cancelled)?;
    tracing::info!(booking_id = %id, "booking cancelled");

    let updated = queries::get_booking_by_id(&db, &id)?
        .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?;
    Ok(Json(updated))
}
