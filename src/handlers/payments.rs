use std::sync::Arc;

use axum::extract::{Path, State};
use axum::Json;
use serde::Deserialize;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{BookingStatus, PaymentStatus};
use crate::services::payments::PaymentOrder;
use crate::state::AppState;

// POST /api/bookings/:id/payment/order
pub async fn create_order(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<PaymentOrder>, AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_id(&db, &id)?
            .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?
    };

    if booking.payment_status != PaymentStatus::Pending {
        return Err(AppError::Validation(format!(
            "booking {id} is already {}",
            booking.payment_status.as_str()
        )));
    }
    if booking.status == BookingStatus::Cancelled {
        return Err(AppError::Validation(format!(
            "booking {id} is cancelled"
        )));
    }

    let turf = {
        let db = state.db.lock().unwrap();
        queries::get_turf(&db, &booking.turf_id)?
            .ok_or_else(|| AppError::NotFound(format!("turf {}", booking.turf_id)))?
    };

    // Gateway amounts are in the smallest currency unit.
    let amount = (booking.total_price * 100.0).round() as i64;
    let order = state
        .payments
        .create_order(&booking.id, amount, &turf.currency)
        .await
        .map_err(|e| AppError::Payment(e.to_string()))?;

    {
        let db = state.db.lock().unwrap();
        queries::update_booking_payment(&db, &id, PaymentStatus::Pending, Some(&order.order_id))?;
    }

    tracing::info!(booking_id = %id, order_id = %order.order_id, "payment order created");
    Ok(Json(order))
}

// POST /api/bookings/:id/payment/verify
#[derive(Deserialize)]
pub struct VerifyPaymentRequest {
    pub order_id: String,
    pub payment_id: String,
    pub signature: String,
}

pub async fn verify_payment(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(body): Json<VerifyPaymentRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let booking = {
        let db = state.db.lock().unwrap();
        queries::get_booking_by_id(&db, &id)?
            .ok_or_else(|| AppError::NotFound(format!("booking {id}")))?
    };

    if booking.payment_order_id.as_deref() != Some(body.order_id.as_str()) {
        return Err(AppError::Validation(format!(
            "order {} does not belong to booking {id}",
            body.order_id
        )));
    }
    if !booking
        .payment_status
        .can_transition_to(PaymentStatus::Paid)
    {
        return Err(AppError::Validation(format!(
            "booking {id} payment is already {}",
            booking.payment_status.as_str()
        )));
    }

    if !state
        .payments
        .verify_signature(&body.order_id, &body.payment_id, &body.signature)
    {
        return Err(AppError::Validation("invalid payment signature".to_string()));
    }

    {
        let db = state.db.lock().unwrap();
        queries::update_booking_payment(&db, &id, PaymentStatus::Paid, None)?;
        // A successful payment confirms a pending booking.
        if booking.status.can_transition_to(BookingStatus::Confirmed) {
            queries::update_booking_status(&db, &id, BookingStatus::Confirmed)?;
        }
    }

    tracing::info!(booking_id = %id, payment_id = %body.payment_id, "payment verified");
    Ok(Json(serde_json::json!({ "ok": true })))
}
