use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use rusqlite::Connection;

use crate::db::queries;
use crate::errors::AppError;
use crate::models::slot::{format_hhmm, parse_hhmm};
use crate::models::{Booking, Slot, Turf};

/// Fixed slot width used by the availability grid.
pub const SLOT_MINUTES: u32 = 30;

#[derive(Debug)]
pub enum SchedulingError {
    OutsideOperatingHours { open: String, close: String },
    InvalidTimeRange(String),
    DurationMismatch { supplied: i32, derived: i32 },
}

impl std::fmt::Display for SchedulingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SchedulingError::OutsideOperatingHours { open, close } => {
                write!(f, "requested time is outside operating hours ({open}-{close})")
            }
            SchedulingError::InvalidTimeRange(msg) => write!(f, "invalid time range: {msg}"),
            SchedulingError::DurationMismatch { supplied, derived } => write!(
                f,
                "supplied duration ({supplied} min) does not match the time range ({derived} min)"
            ),
        }
    }
}

impl From<SchedulingError> for AppError {
    fn from(err: SchedulingError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Slot start offsets in minutes since midnight. A start whose slot would
/// run past closing is dropped rather than truncated, so an odd tail
/// (closing - opening not a multiple of the width) yields no partial slot.
fn slot_starts(opening: u32, closing: u32) -> impl Iterator<Item = u32> {
    (opening..closing)
        .step_by(SLOT_MINUTES as usize)
        .filter(move |start| start + SLOT_MINUTES <= closing)
}

/// The full slot grid for a turf's operating hours, all marked available.
/// A misconfigured turf (closing <= opening) yields an empty grid.
pub fn generate_slots(opening_time: &str, closing_time: &str) -> anyhow::Result<Vec<Slot>> {
    let opening = parse_hhmm(opening_time)?;
    let closing = parse_hhmm(closing_time)?;

    Ok(slot_starts(opening, closing)
        .map(|start| Slot {
            start_time: format_hhmm(start),
            end_time: format_hhmm(start + SLOT_MINUTES),
            is_available: true,
        })
        .collect())
}

/// Three-case half-open interval overlap: the slot starts inside the
/// booking, ends inside it, or fully contains it.
fn overlaps(slot_start: u32, slot_end: u32, booking_start: u32, booking_end: u32) -> bool {
    (slot_start >= booking_start && slot_start < booking_end)
        || (slot_end > booking_start && slot_end <= booking_end)
        || (slot_start <= booking_start && slot_end >= booking_end)
}

/// The slot grid for one turf+date with each slot flagged against the
/// non-cancelled bookings of that day. Pure read.
pub fn check_availability(
    conn: &Connection,
    turf: &Turf,
    date: &str,
) -> anyhow::Result<Vec<Slot>> {
    let mut slots = generate_slots(&turf.opening_time, &turf.closing_time)?;
    let bookings = queries::get_bookings_for_turf_date(conn, &turf.id, date)?;

    let booked: Vec<(u32, u32)> = bookings
        .iter()
        .map(|b| Ok((parse_hhmm(&b.start_time)?, parse_hhmm(&b.end_time)?)))
        .collect::<anyhow::Result<_>>()?;

    for slot in &mut slots {
        let start = parse_hhmm(&slot.start_time)?;
        let end = parse_hhmm(&slot.end_time)?;
        slot.is_available = !booked.iter().any(|&(bs, be)| overlaps(start, end, bs, be));
    }

    Ok(slots)
}

/// Validate a proposed [start, end) against the turf's hours and return
/// the derived duration in minutes. Duration is never taken from the
/// client; when a client supplies one it must agree with the range.
pub fn validate_time_range(
    turf: &Turf,
    start_time: &str,
    end_time: &str,
    supplied_duration: Option<i32>,
) -> Result<i32, SchedulingError> {
    let start = parse_hhmm(start_time)
        .map_err(|e| SchedulingError::InvalidTimeRange(e.to_string()))?;
    let end =
        parse_hhmm(end_time).map_err(|e| SchedulingError::InvalidTimeRange(e.to_string()))?;

    if start >= end {
        return Err(SchedulingError::InvalidTimeRange(format!(
            "start_time must be before end_time ({start_time} >= {end_time})"
        )));
    }

    let opening = parse_hhmm(&turf.opening_time)
        .map_err(|e| SchedulingError::InvalidTimeRange(e.to_string()))?;
    let closing = parse_hhmm(&turf.closing_time)
        .map_err(|e| SchedulingError::InvalidTimeRange(e.to_string()))?;
    if start < opening || end > closing {
        return Err(SchedulingError::OutsideOperatingHours {
            open: turf.opening_time.clone(),
            close: turf.closing_time.clone(),
        });
    }

    let derived = (end - start) as i32;
    if let Some(supplied) = supplied_duration {
        if supplied != derived {
            return Err(SchedulingError::DurationMismatch {
                supplied,
                derived,
            });
        }
    }
    Ok(derived)
}

/// Fast-path conflict check before insert/update. The partial unique index
/// on (turf_id, date, start_time, end_time) remains the authoritative
/// guard; this query only exists to give the caller a useful message.
pub fn ensure_slot_free(
    conn: &Connection,
    turf_id: &str,
    date: &str,
    start_time: &str,
    end_time: &str,
    exclude_booking_id: Option<&str>,
) -> Result<(), AppError> {
    let conflicts = queries::find_conflicting_bookings(
        conn,
        turf_id,
        date,
        start_time,
        end_time,
        exclude_booking_id,
    )?;

    if let Some(existing) = conflicts.first() {
        return Err(AppError::Conflict(format!(
            "slot {start_time}-{end_time} overlaps an existing booking ({}-{})",
            existing.start_time, existing.end_time
        )));
    }
    Ok(())
}

/// Price snapshot: price-per-hour at this moment times the derived duration.
pub fn compute_total_price(price_per_hour: f64, duration_minutes: i32) -> f64 {
    price_per_hour * f64::from(duration_minutes) / 60.0
}

pub fn validate_date(date: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid date, expected YYYY-MM-DD: {date}")))
}

/// Whether a customer may still cancel: at least `cutoff_minutes` must
/// remain before the booked slot starts.
pub fn cancellable_at(booking: &Booking, cutoff_minutes: i64, now: NaiveDateTime) -> bool {
    let Ok(date) = NaiveDate::parse_from_str(&booking.date, "%Y-%m-%d") else {
        return false;
    };
    let Ok(minutes) = parse_hhmm(&booking.start_time) else {
        return false;
    };
    let start = date.and_time(
        NaiveTime::from_num_seconds_from_midnight_opt(minutes * 60, 0)
            .unwrap_or(NaiveTime::MIN),
    );
    start - now >= chrono::Duration::minutes(cutoff_minutes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::models::{BookingStatus, PaymentStatus};
    use chrono::Utc;

    fn setup_db() -> Connection {
        db::init_db(":memory:").unwrap()
    }

    fn turf(opening: &str, closing: &str) -> Turf {
        Turf {
            id: "turf-1".to_string(),
            name: "Greenfield Arena".to_string(),
            address: "12 MG Road".to_string(),
            city: "Bengaluru".to_string(),
            price_per_hour: 1200.0,
            currency: "INR".to_string(),
            opening_time: opening.to_string(),
            closing_time: closing.to_string(),
            is_active: true,
            sport_types: vec!["football".to_string()],
            facilities: vec![],
        }
    }

    fn booking(turf_id: &str, date: &str, start: &str, end: &str, status: BookingStatus) -> Booking {
        let now = Utc::now().naive_utc();
        let duration = (parse_hhmm(end).unwrap() - parse_hhmm(start).unwrap()) as i32;
        Booking {
            id: uuid::Uuid::new_v4().to_string(),
            turf_id: turf_id.to_string(),
            user_id: "user-1".to_string(),
            date: date.to_string(),
            start_time: start.to_string(),
            end_time: end.to_string(),
            duration_minutes: duration,
            total_price: compute_total_price(1200.0, duration),
            status,
            payment_status: PaymentStatus::Pending,
            payment_order_id: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_generate_slots_properties() {
        let slots = generate_slots("06:00", "22:00").unwrap();
        assert_eq!(slots.len(), 32);

        let opening = parse_hhmm("06:00").unwrap();
        let closing = parse_hhmm("22:00").unwrap();
        let mut prev_end = opening;
        for slot in &slots {
            let start = parse_hhmm(&slot.start_time).unwrap();
            let end = parse_hhmm(&slot.end_time).unwrap();
            assert_eq!(end - start, SLOT_MINUTES);
            assert!(start >= opening && end <= closing);
            assert!(start >= prev_end); // ascending and non-overlapping
            prev_end = end;
            assert!(slot.is_available);
        }
    }

    #[test]
    fn test_generate_slots_drops_partial_tail() {
        // 09:00-10:45 fits three full slots; the 10:30-11:00 slot would
        // run past closing and must be dropped, not truncated.
        let slots = generate_slots("09:00", "10:45").unwrap();
        assert_eq!(slots.len(), 3);
        assert_eq!(slots.last().unwrap().end_time, "10:30");
    }

    #[test]
    fn test_generate_slots_misconfigured_turf_is_empty() {
        assert!(generate_slots("22:00", "06:00").unwrap().is_empty());
        assert!(generate_slots("09:00", "09:00").unwrap().is_empty());
    }

    #[test]
    fn test_generate_slots_zero_padded_output() {
        let slots = generate_slots("08:00", "09:00").unwrap();
        assert_eq!(slots[0].start_time, "08:00");
        assert_eq!(slots[0].end_time, "08:30");
    }

    #[test]
    fn test_availability_marks_booked_slots() {
        let conn = setup_db();
        let t = turf("09:00", "11:00");
        queries::create_turf(&conn, &t).unwrap();
        queries::create_booking(
            &conn,
            &booking("turf-1", "2030-05-01", "09:00", "10:00", BookingStatus::Confirmed),
        )
        .unwrap();

        let slots = check_availability(&conn, &t, "2030-05-01").unwrap();
        assert_eq!(slots.len(), 4);
        assert!(!slots[0].is_available); // 09:00-09:30
        assert!(!slots[1].is_available); // 09:30-10:00
        assert!(slots[2].is_available); // 10:00-10:30
        assert!(slots[3].is_available); // 10:30-11:00
    }

    #[test]
    fn test_availability_ignores_cancelled_bookings() {
        let conn = setup_db();
        let t = turf("09:00", "11:00");
        queries::create_turf(&conn, &t).unwrap();
        queries::create_booking(
            &conn,
            &booking("turf-1", "2030-05-01", "09:00", "10:00", BookingStatus::Cancelled),
        )
        .unwrap();

        let slots = check_availability(&conn, &t, "2030-05-01").unwrap();
        assert!(slots.iter().all(|s| s.is_available));
    }

    #[test]
    fn test_availability_is_idempotent() {
        let conn = setup_db();
        let t = turf("09:00", "12:00");
        queries::create_turf(&conn, &t).unwrap();
        queries::create_booking(
            &conn,
            &booking("turf-1", "2030-05-01", "10:00", "11:00", BookingStatus::Pending),
        )
        .unwrap();

        let first = check_availability(&conn, &t, "2030-05-01").unwrap();
        let second = check_availability(&conn, &t, "2030-05-01").unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_conflict_sequence() {
        // Opening 09:00, closing 11:00: C1 [09:00,10:00) succeeds,
        // C2 [09:30,10:30) overlaps, C3 [10:00,11:00) is adjacent and fine.
        let conn = setup_db();
        let t = turf("09:00", "11:00");
        queries::create_turf(&conn, &t).unwrap();

        ensure_slot_free(&conn, "turf-1", "2030-05-01", "09:00", "10:00", None).unwrap();
        queries::create_booking(
            &conn,
            &booking("turf-1", "2030-05-01", "09:00", "10:00", BookingStatus::Pending),
        )
        .unwrap();

        let err =
            ensure_slot_free(&conn, "turf-1", "2030-05-01", "09:30", "10:30", None).unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        ensure_slot_free(&conn, "turf-1", "2030-05-01", "10:00", "11:00", None).unwrap();
    }

    #[test]
    fn test_conflict_ignores_other_dates_and_turfs() {
        let conn = setup_db();
        let t = turf("09:00", "11:00");
        queries::create_turf(&conn, &t).unwrap();
        queries::create_booking(
            &conn,
            &booking("turf-1", "2030-05-01", "09:00", "10:00", BookingStatus::Pending),
        )
        .unwrap();

        ensure_slot_free(&conn, "turf-1", "2030-05-02", "09:00", "10:00", None).unwrap();
        ensure_slot_free(&conn, "turf-2", "2030-05-01", "09:00", "10:00", None).unwrap();
    }

    #[test]
    fn test_conflict_excludes_own_booking_on_update() {
        let conn = setup_db();
        let t = turf("09:00", "11:00");
        queries::create_turf(&conn, &t).unwrap();
        let b = booking("turf-1", "2030-05-01", "09:00", "10:00", BookingStatus::Pending);
        queries::create_booking(&conn, &b).unwrap();

        // Shifting the same booking half a slot must not conflict with itself.
        ensure_slot_free(&conn, "turf-1", "2030-05-01", "09:30", "10:30", Some(&b.id)).unwrap();
        // But it still conflicts with someone else's booking.
        let other = booking("turf-1", "2030-05-01", "10:00", "11:00", BookingStatus::Pending);
        queries::create_booking(&conn, &other).unwrap();
        let err = ensure_slot_free(&conn, "turf-1", "2030-05-01", "09:30", "10:30", Some(&b.id))
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[test]
    fn test_unique_index_rejects_exact_duplicate() {
        let conn = setup_db();
        let t = turf("09:00", "11:00");
        queries::create_turf(&conn, &t).unwrap();
        queries::create_booking(
            &conn,
            &booking("turf-1", "2030-05-01", "09:00", "10:00", BookingStatus::Pending),
        )
        .unwrap();

        // Second insert that skipped the fast-path check: the storage-level
        // index is the authoritative rejection.
        let err = queries::create_booking(
            &conn,
            &booking("turf-1", "2030-05-01", "09:00", "10:00", BookingStatus::Pending),
        )
        .unwrap_err();
        assert!(queries::is_unique_violation(&err));
    }

    #[test]
    fn test_unique_index_frees_cancelled_slot() {
        let conn = setup_db();
        let t = turf("09:00", "11:00");
        queries::create_turf(&conn, &t).unwrap();
        let b = booking("turf-1", "2030-05-01", "09:00", "10:00", BookingStatus::Cancelled);
        queries::create_booking(&conn, &b).unwrap();

        queries::create_booking(
            &conn,
            &booking("turf-1", "2030-05-01", "09:00", "10:00", BookingStatus::Pending),
        )
        .unwrap();
    }

    #[test]
    fn test_validate_time_range() {
        let t = turf("09:00", "22:00");
        assert_eq!(validate_time_range(&t, "10:00", "11:30", None).unwrap(), 90);
        assert_eq!(validate_time_range(&t, "10:00", "11:00", Some(60)).unwrap(), 60);

        assert!(matches!(
            validate_time_range(&t, "10:00", "11:00", Some(90)),
            Err(SchedulingError::DurationMismatch { supplied: 90, derived: 60 })
        ));
        assert!(matches!(
            validate_time_range(&t, "11:00", "10:00", None),
            Err(SchedulingError::InvalidTimeRange(_))
        ));
        assert!(matches!(
            validate_time_range(&t, "08:00", "09:30", None),
            Err(SchedulingError::OutsideOperatingHours { .. })
        ));
        assert!(matches!(
            validate_time_range(&t, "21:30", "22:30", None),
            Err(SchedulingError::OutsideOperatingHours { .. })
        ));
    }

    #[test]
    fn test_compute_total_price() {
        assert_eq!(compute_total_price(1200.0, 60), 1200.0);
        assert_eq!(compute_total_price(1200.0, 90), 1800.0);
        assert_eq!(compute_total_price(500.0, 30), 250.0);
    }

    #[test]
    fn test_cancellable_at_cutoff() {
        let b = booking("turf-1", "2030-05-01", "18:00", "19:00", BookingStatus::Confirmed);
        let cutoff = 240;

        let early = NaiveDateTime::parse_from_str("2030-05-01 13:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let exact = NaiveDateTime::parse_from_str("2030-05-01 14:00:00", "%Y-%m-%d %H:%M:%S").unwrap();
        let late = NaiveDateTime::parse_from_str("2030-05-01 15:00:00", "%Y-%m-%d %H:%M:%S").unwrap();

        assert!(cancellable_at(&b, cutoff, early));
        assert!(cancellable_at(&b, cutoff, exact));
        assert!(!cancellable_at(&b, cutoff, late));
    }
}
