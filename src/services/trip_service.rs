use crate::error::AppError;
use crate::models::trip::validate_dates;
use crate::models::Trip;
use crate::services::{day_service, photo_service};
use crate::storage::MediaStore;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

const TRIP_COLUMNS: &str = "uuid, name, start_date, end_date, description,
     feature_photo_filename, feature_photo_asset_id, created_at";

/// Content that a date change would delete
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DaysAtRisk {
    pub days: usize,
    /// Journal entries with non-blank content
    pub written_entries: usize,
    pub photos: usize,
}

impl DaysAtRisk {
    /// Nothing but empty days would be lost
    pub fn is_harmless(&self) -> bool {
        self.written_entries == 0 && self.photos == 0
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateChangeOutcome {
    /// False when the dates were unchanged and nothing happened
    pub regenerated: bool,
    pub removed: DaysAtRisk,
    pub days_created: usize,
}

/// Creates a trip together with its days
pub fn create_trip(conn: &Connection, trip: &Trip) -> Result<Uuid, AppError> {
    trip.validate()?;

    let tx = conn.unchecked_transaction()?;
    tx.execute(
        "INSERT INTO trips (uuid, name, start_date, end_date, description,
                            feature_photo_filename, feature_photo_asset_id, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            trip.uuid.to_string(),
            trip.name.trim(),
            &trip.start_date,
            &trip.end_date,
            &trip.description,
            &trip.feature_photo_filename,
            &trip.feature_photo_asset_id,
            &trip.created_at,
        ],
    )?;
    day_service::insert_days(&tx, trip)?;
    tx.commit()?;

    log::info!(
        "Created trip {} ({}) with {} days",
        trip.name,
        trip.uuid,
        trip.day_count()
    );
    Ok(trip.uuid)
}

pub fn get_trip(conn: &Connection, trip_uuid: &Uuid) -> Result<Trip, AppError> {
    conn.query_row(
        &format!("SELECT {} FROM trips WHERE uuid = ?1", TRIP_COLUMNS),
        params![trip_uuid.to_string()],
        |row| Trip::try_from(row),
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound("Trip".to_string()))
}

/// All trips, most recent first
pub fn list_trips(conn: &Connection) -> Result<Vec<Trip>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM trips ORDER BY start_date DESC, created_at DESC",
        TRIP_COLUMNS
    ))?;
    let trips = stmt
        .query_map([], |row| Trip::try_from(row))?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(trips)
}

/// Changes name and description. Dates go through [`update_trip_dates`].
pub fn update_trip_details(
    conn: &Connection,
    trip_uuid: &Uuid,
    name: &str,
    description: Option<&str>,
) -> Result<(), AppError> {
    let mut trip = get_trip(conn, trip_uuid)?;
    trip.name = name.trim().to_string();
    trip.description = description
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(str::to_string);
    trip.validate()?;

    conn.execute(
        "UPDATE trips SET name = ?1, description = ?2 WHERE uuid = ?3",
        params![&trip.name, &trip.description, trip_uuid.to_string()],
    )?;
    Ok(())
}

/// Counts what regenerating the trip's days would delete
pub fn days_at_risk(conn: &Connection, trip_uuid: &Uuid) -> Result<DaysAtRisk, AppError> {
    let days = day_service::count_days(conn, trip_uuid)? as usize;
    let written_entries: i64 = conn.query_row(
        "SELECT COUNT(*) FROM journal_entries j
         JOIN days d ON d.uuid = j.day_uuid
         WHERE d.trip_uuid = ?1 AND TRIM(j.content) <> ''",
        params![trip_uuid.to_string()],
        |row| row.get(0),
    )?;
    let photos: i64 = conn.query_row(
        "SELECT COUNT(*) FROM photos p
         JOIN days d ON d.uuid = p.day_uuid
         WHERE d.trip_uuid = ?1",
        params![trip_uuid.to_string()],
        |row| row.get(0),
    )?;

    Ok(DaysAtRisk {
        days,
        written_entries: written_entries as usize,
        photos: photos as usize,
    })
}

/// Moves a trip to new dates.
///
/// Changed dates delete every day of the trip, with its journal entry and
/// photos, and generate fresh days. The stored media files of the deleted
/// photos are removed once the change is committed.
pub fn update_trip_dates(
    conn: &Connection,
    store: &MediaStore,
    trip_uuid: &Uuid,
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> Result<DateChangeOutcome, AppError> {
    validate_dates(start_date, end_date)?;

    let mut trip = get_trip(conn, trip_uuid)?;
    if trip.start_date == start_date && trip.end_date == end_date {
        log::debug!("Dates of trip {} unchanged", trip_uuid);
        return Ok(DateChangeOutcome::default());
    }

    let tx = conn.unchecked_transaction()?;
    let removed = days_at_risk(&tx, trip_uuid)?;
    let filenames = photo_service::trip_photo_filenames(&tx, trip_uuid)?;

    tx.execute(
        "DELETE FROM days WHERE trip_uuid = ?1",
        params![trip_uuid.to_string()],
    )?;
    tx.execute(
        "UPDATE trips SET start_date = ?1, end_date = ?2 WHERE uuid = ?3",
        params![&start_date, &end_date, trip_uuid.to_string()],
    )?;

    trip.start_date = start_date;
    trip.end_date = end_date;
    let days_created = day_service::insert_days(&tx, &trip)?;
    tx.commit()?;

    if removed.written_entries > 0 || removed.photos > 0 {
        log::warn!(
            "Date change of trip {} removed {} journal entries and {} photos",
            trip_uuid,
            removed.written_entries,
            removed.photos
        );
    }
    let deleted_files = store.delete_all(filenames.iter().map(String::as_str));
    log::debug!("Removed {} media files of trip {}", deleted_files, trip_uuid);

    Ok(DateChangeOutcome {
        regenerated: true,
        removed,
        days_created,
    })
}

/// Deletes a trip with all its days, entries and media files
pub fn delete_trip(conn: &Connection, store: &MediaStore, trip_uuid: &Uuid) -> Result<(), AppError> {
    let trip = get_trip(conn, trip_uuid)?;
    let mut filenames = photo_service::trip_photo_filenames(conn, trip_uuid)?;
    filenames.extend(trip.feature_photo_filename);

    let rows = conn.execute(
        "DELETE FROM trips WHERE uuid = ?1",
        params![trip_uuid.to_string()],
    )?;
    if rows == 0 {
        return Err(AppError::NotFound("Trip".to_string()));
    }

    store.delete_all(filenames.iter().map(String::as_str));
    log::info!("Deleted trip {}", trip_uuid);
    Ok(())
}

/// Points the trip's cover image at a new stored file. Returns the filename
/// it replaced.
pub(crate) fn set_feature_photo(
    conn: &Connection,
    trip_uuid: &Uuid,
    filename: &str,
    asset_identifier: Option<&str>,
) -> Result<Option<String>, AppError> {
    let previous: Option<String> = conn
        .query_row(
            "SELECT feature_photo_filename FROM trips WHERE uuid = ?1",
            params![trip_uuid.to_string()],
            |row| row.get(0),
        )
        .optional()?
        .ok_or_else(|| AppError::NotFound("Trip".to_string()))?;

    conn.execute(
        "UPDATE trips SET feature_photo_filename = ?1, feature_photo_asset_id = ?2
         WHERE uuid = ?3",
        params![filename, asset_identifier, trip_uuid.to_string()],
    )?;

    Ok(previous)
}
