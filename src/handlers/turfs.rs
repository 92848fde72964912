use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::db::queries;
use crate::errors::AppError;
use crate::models::{Slot, Turf};
use crate::services::scheduling;
use crate::state::AppState;

// GET /api/turfs
#[derive(Deserialize)]
pub struct TurfsQuery {
    pub city: Option<String>,
    pub sport: Option<String>,
}

pub async fn list_turfs(
    State(state): State<Arc<AppState>>,
    Query(query): Query<TurfsQuery>,
) -> Result<Json<Vec<Turf>>, AppError> {
    let turfs = {
        let db = state.db.lock().unwrap();
        queries::list_turfs(&db, query.city.as_deref())?
    };

    // sport_types is a JSON column, so the sport filter is applied here
    // rather than in SQL.
    let turfs = match query.sport {
        Some(sport) => turfs
            .into_iter()
            .filter(|t| {
                t.sport_types
                    .iter()
                    .any(|s| s.eq_ignore_ascii_case(&sport))
            })
            .collect(),
        None => turfs,
    };

    Ok(Json(turfs))
}

// GET /api/turfs/:id
pub async fn get_turf(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Turf>, AppError> {
    let turf = {
        let db = state.db.lock().unwrap();
        queries::get_turf(&db, &id)?
    };

    turf.map(Json)
        .ok_or_else(|| AppError::NotFound(format!("turf {id}")))
}

// GET /api/turfs/:id/availability?date=YYYY-MM-DD
#[derive(Deserialize)]
pub struct AvailabilityQuery {
    pub date: String,
}

#[derive(Serialize)]
pub struct AvailabilityResponse {
    pub turf_id: String,
    pub date: String,
    pub slots: Vec<Slot>,
}

pub async fn get_availability(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Query(query): Query<AvailabilityQuery>,
) -> Result<Json<AvailabilityResponse>, AppError> {
    scheduling::validate_date(&query.date)?;

    let db = state.db.lock().unwrap();
    let turf =
        queries::get_turf(&db, &id)?.ok_or_else(|| AppError::NotFound(format!("turf {id}")))?;

    let slots = scheduling::check_availability(&db, &turf, &query.date)?;

    Ok(Json(AvailabilityResponse {
        turf_id: turf.id,
        date: query.date,
        slots,
    }))
}
