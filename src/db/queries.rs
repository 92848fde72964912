use chrono::{NaiveDateTime, Utc};
use rusqlite::{params, Connection};

use crate::models::{Booking, BookingStatus, PaymentStatus, Turf};

// ── Turfs ──

pub fn create_turf(conn: &Connection, turf: &Turf) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO turfs (id, name, address, city, price_per_hour, currency, opening_time, closing_time, is_active, sport_types, facilities)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        params![
            turf.id,
            turf.name,
            turf.address,
            turf.city,
            turf.price_per_hour,
            turf.currency,
            turf.opening_time,
            turf.closing_time,
            turf.is_active as i32,
            serde_json::to_string(&turf.sport_types)?,
            serde_json::to_string(&turf.facilities)?,
        ],
    )?;
    Ok(())
}

pub fn update_turf(conn: &Connection, turf: &Turf) -> anyhow::Result<bool> {
    let count = conn.execute(
        "UPDATE turfs SET name = ?1, address = ?2, city = ?3, price_per_hour = ?4, currency = ?5,
                opening_time = ?6, closing_time = ?7, is_active = ?8, sport_types = ?9, facilities = ?10,
                updated_at = datetime('now')
         WHERE id = ?11",
        params![
            turf.name,
            turf.address,
            turf.city,
            turf.price_per_hour,
            turf.currency,
            turf.opening_time,
            turf.closing_time,
            turf.is_active as i32,
            serde_json::to_string(&turf.sport_types)?,
            serde_json::to_string(&turf.facilities)?,
            turf.id,
        ],
    )?;
    Ok(count > 0)
}

pub fn get_turf(conn: &Connection, id: &str) -> anyhow::Result<Option<Turf>> {
    let result = conn.query_row(
        "SELECT id, name, address, city, price_per_hour, currency, opening_time, closing_time, is_active, sport_types, facilities
         FROM turfs WHERE id = ?1",
        params![id],
        |row| Ok(parse_turf_row(row)),
    );

    match result {
        Ok(turf) => Ok(Some(turf?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

pub fn list_turfs(conn: &Connection, city: Option<&str>) -> anyhow::Result<Vec<Turf>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match city {
        Some(city) => (
            "SELECT id, name, address, city, price_per_hour, currency, opening_time, closing_time, is_active, sport_types, facilities
             FROM turfs WHERE is_active = 1 AND city = ?1 COLLATE NOCASE ORDER BY name ASC"
                .to_string(),
            vec![Box::new(city.to_string()) as Box<dyn rusqlite::types::ToSql>],
        ),
        None => (
            "SELECT id, name, address, city, price_per_hour, currency, opening_time, closing_time, is_active, sport_types, facilities
             FROM turfs WHERE is_active = 1 ORDER BY name ASC"
                .to_string(),
            vec![],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_turf_row(row)))?;

    let mut turfs = vec![];
    for row in rows {
        turfs.push(row??);
    }
    Ok(turfs)
}

fn parse_turf_row(row: &rusqlite::Row) -> anyhow::Result<Turf> {
    let sport_types_json: String = row.get(9)?;
    let facilities_json: String = row.get(10)?;

    Ok(Turf {
        id: row.get(0)?,
        name: row.get(1)?,
        address: row.get(2)?,
        city: row.get(3)?,
        price_per_hour: row.get(4)?,
        currency: row.get(5)?,
        opening_time: row.get(6)?,
        closing_time: row.get(7)?,
        is_active: row.get::<_, i32>(8)? != 0,
        sport_types: serde_json::from_str(&sport_types_json).unwrap_or_default(),
        facilities: serde_json::from_str(&facilities_json).unwrap_or_default(),
    })
}

// ── Bookings ──

const BOOKING_COLUMNS: &str = "id, turf_id, user_id, date, start_time, end_time, duration_minutes, total_price, status, payment_status, payment_order_id, created_at, updated_at";

pub fn create_booking(conn: &Connection, booking: &Booking) -> anyhow::Result<()> {
    let created_at = booking.created_at.format("%Y-%m-%d %H:%M:%S").to_string();
    let updated_at = booking.updated_at.format("%Y-%m-%d %H:%M:%S").to_string();

    conn.execute(
        "INSERT INTO bookings (id, turf_id, user_id, date, start_time, end_time, duration_minutes, total_price, status, payment_status, payment_order_id, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)",
        params![
            booking.id,
            booking.turf_id,
            booking.user_id,
            booking.date,
            booking.start_time,
            booking.end_time,
            booking.duration_minutes,
            booking.total_price,
            booking.status.as_str(),
            booking.payment_status.as_str(),
            booking.payment_order_id,
            created_at,
            updated_at,
        ],
    )?;
    Ok(())
}

/// True when the error is a violation of the unique slot index, i.e. a
/// concurrent request already took the exact same interval.
pub fn is_unique_violation(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<rusqlite::Error>(),
        Some(rusqlite::Error::SqliteFailure(e, _))
            if e.code == rusqlite::ErrorCode::ConstraintViolation
    )
}

pub fn get_booking_by_id(conn: &Connection, id: &str) -> anyhow::Result<Option<Booking>> {
    let result = conn.query_row(
        &format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE id = ?1"),
        params![id],
        |row| Ok(parse_booking_row(row)),
    );

    match result {
        Ok(booking) => Ok(Some(booking?)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(e.into()),
    }
}

/// Non-cancelled bookings for one turf on one date, ordered by start time.
pub fn get_bookings_for_turf_date(
    conn: &Connection,
    turf_id: &str,
    date: &str,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE turf_id = ?1 AND date = ?2 AND status != 'cancelled'
         ORDER BY start_time ASC"
    ))?;

    let rows = stmt.query_map(params![turf_id, date], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

/// Fast-path conflict probe: non-cancelled bookings on the same turf+date
/// whose interval touches the proposed one. Zero-padded HH:MM strings
/// compare correctly as text.
pub fn find_conflicting_bookings(
    conn: &Connection,
    turf_id: &str,
    date: &str,
    start_time: &str,
    end_time: &str,
    exclude_id: Option<&str>,
) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE turf_id = ?1 AND date = ?2 AND status != 'cancelled'
           AND id != ?5
           AND (start_time = ?3 OR end_time = ?4 OR (start_time < ?4 AND end_time > ?3))
         ORDER BY start_time ASC"
    ))?;

    let exclude = exclude_id.unwrap_or("");
    let rows = stmt.query_map(
        params![turf_id, date, start_time, end_time, exclude],
        |row| Ok(parse_booking_row(row)),
    )?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn update_booking_times(
    conn: &Connection,
    id: &str,
    date: &str,
    start_time: &str,
    end_time: &str,
    duration_minutes: i32,
    total_price: f64,
) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string();
    let count = conn.execute(
        "UPDATE bookings SET date = ?1, start_time = ?2, end_time = ?3, duration_minutes = ?4, total_price = ?5, updated_at = ?6
         WHERE id = ?7",
        params![date, start_time, end_time, duration_minutes, total_price, now, id],
    )?;
    Ok(count > 0)
}

pub fn update_booking_status(
    conn: &Connection,
    id: &str,
    status: BookingStatus,
) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string();
    let count = conn.execute(
        "UPDATE bookings SET status = ?1, updated_at = ?2 WHERE id = ?3",
        params![status.as_str(), now, id],
    )?;
    Ok(count > 0)
}

pub fn update_booking_payment(
    conn: &Connection,
    id: &str,
    payment_status: PaymentStatus,
    payment_order_id: Option<&str>,
) -> anyhow::Result<bool> {
    let now = Utc::now().naive_utc().format("%Y-%m-%d %H:%M:%S").to_string();
    let count = conn.execute(
        "UPDATE bookings SET payment_status = ?1, payment_order_id = COALESCE(?2, payment_order_id), updated_at = ?3
         WHERE id = ?4",
        params![payment_status.as_str(), payment_order_id, now, id],
    )?;
    Ok(count > 0)
}

pub fn get_bookings_for_user(conn: &Connection, user_id: &str) -> anyhow::Result<Vec<Booking>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {BOOKING_COLUMNS} FROM bookings
         WHERE user_id = ?1 ORDER BY date DESC, start_time DESC"
    ))?;

    let rows = stmt.query_map(params![user_id], |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

pub fn get_all_bookings(
    conn: &Connection,
    status_filter: Option<&str>,
    limit: i64,
) -> anyhow::Result<Vec<Booking>> {
    let (sql, params_vec): (String, Vec<Box<dyn rusqlite::types::ToSql>>) = match status_filter {
        Some(status) => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = ?1
                 ORDER BY date DESC, start_time DESC LIMIT ?2"
            ),
            vec![
                Box::new(status.to_string()) as Box<dyn rusqlite::types::ToSql>,
                Box::new(limit),
            ],
        ),
        None => (
            format!(
                "SELECT {BOOKING_COLUMNS} FROM bookings
                 ORDER BY date DESC, start_time DESC LIMIT ?1"
            ),
            vec![Box::new(limit) as Box<dyn rusqlite::types::ToSql>],
        ),
    };

    let mut stmt = conn.prepare(&sql)?;
    let params_refs: Vec<&dyn rusqlite::types::ToSql> =
        params_vec.iter().map(|p| p.as_ref()).collect();
    let rows = stmt.query_map(params_refs.as_slice(), |row| Ok(parse_booking_row(row)))?;

    let mut bookings = vec![];
    for row in rows {
        bookings.push(row??);
    }
    Ok(bookings)
}

fn parse_booking_row(row: &rusqlite::Row) -> anyhow::Result<Booking> {
    let status_str: String = row.get(8)?;
    let payment_status_str: String = row.get(9)?;
    let created_at_str: String = row.get(11)?;
    let updated_at_str: String = row.get(12)?;

    let created_at = NaiveDateTime::parse_from_str(&created_at_str, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| Utc::now().naive_utc());
    let updated_at = NaiveDateTime::parse_from_str(&updated_at_str, "%Y-%m-%d %H:%M:%S")
        .unwrap_or_else(|_| Utc::now().naive_utc());

    Ok(Booking {
        id: row.get(0)?,
        turf_id: row.get(1)?,
        user_id: row.get(2)?,
        date: row.get(3)?,
        start_time: row.get(4)?,
        end_time: row.get(5)?,
        duration_minutes: row.get(6)?,
        total_price: row.get(7)?,
        status: BookingStatus::parse(&status_str),
        payment_status: PaymentStatus::parse(&payment_status_str),
        payment_order_id: row.get(10)?,
        created_at,
        updated_at,
    })
}

// ── Dashboard ──

pub struct DashboardStats {
    pub active_turfs: i64,
    pub upcoming_confirmed_bookings: i64,
    pub todays_bookings: i64,
}

pub fn get_dashboard_stats(conn: &Connection) -> anyhow::Result<DashboardStats> {
    let today = Utc::now().format("%Y-%m-%d").to_string();

    let active_turfs: i64 = conn
        .query_row("SELECT COUNT(*) FROM turfs WHERE is_active = 1", [], |row| {
            row.get(0)
        })
        .unwrap_or(0);

    let upcoming_confirmed_bookings: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM bookings WHERE date >= ?1 AND status = 'confirmed'",
            params![today],
            |row| row.get(0),
        )
        .unwrap_or(0);

    let todays_bookings: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM bookings WHERE date = ?1 AND status != 'cancelled'",
            params![today],
            |row| row.get(0),
        )
        .unwrap_or(0);

    Ok(DashboardStats {
        active_turfs,
        upcoming_confirmed_bookings,
        todays_bookings,
    })
}
