use crate::error::AppError;
use crate::models::Photo;
use crate::storage::MediaStore;
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::HashSet;
use uuid::Uuid;

const PHOTO_COLUMNS: &str = "p.uuid, p.day_uuid, p.filename, p.asset_identifier, p.media_kind,
     p.caption, p.capture_date, p.order_index, p.created_at";

/// Photos of a day in display order
pub fn list_day_photos(conn: &Connection, day_uuid: &Uuid) -> Result<Vec<Photo>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM photos p
         WHERE p.day_uuid = ?1
         ORDER BY p.order_index, p.created_at",
        PHOTO_COLUMNS
    ))?;

    let rows = stmt.query_map(params![day_uuid.to_string()], |row| Photo::try_from(row))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

/// All photos of a trip, across its days
pub fn list_trip_photos(conn: &Connection, trip_uuid: &Uuid) -> Result<Vec<Photo>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM photos p
         JOIN days d ON d.uuid = p.day_uuid
         WHERE d.trip_uuid = ?1
         ORDER BY d.order_index, p.order_index",
        PHOTO_COLUMNS
    ))?;

    let rows = stmt.query_map(params![trip_uuid.to_string()], |row| Photo::try_from(row))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn get_photo(conn: &Connection, photo_uuid: &Uuid) -> Result<Photo, AppError> {
    conn.query_row(
        &format!("SELECT {} FROM photos p WHERE p.uuid = ?1", PHOTO_COLUMNS),
        params![photo_uuid.to_string()],
        |row| Photo::try_from(row),
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound("Photo".to_string()))
}

pub fn count_day_photos(conn: &Connection, day_uuid: &Uuid) -> Result<i32, AppError> {
    let count: i32 = conn.query_row(
        "SELECT COUNT(*) FROM photos WHERE day_uuid = ?1",
        params![day_uuid.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

pub(crate) fn insert_photo(conn: &Connection, photo: &Photo) -> Result<(), AppError> {
    conn.execute(
        "INSERT INTO photos (uuid, day_uuid, filename, asset_identifier, media_kind, caption,
                             capture_date, order_index, created_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        params![
            photo.uuid.to_string(),
            photo.day_uuid.to_string(),
            &photo.filename,
            &photo.asset_identifier,
            photo.kind.as_str(),
            &photo.caption,
            &photo.capture_date,
            photo.order_index,
            &photo.created_at,
        ],
    )?;
    Ok(())
}

/// Stored filenames of every photo of a trip
pub(crate) fn trip_photo_filenames(
    conn: &Connection,
    trip_uuid: &Uuid,
) -> Result<Vec<String>, AppError> {
    let mut stmt = conn.prepare(
        "SELECT p.filename FROM photos p
         JOIN days d ON d.uuid = p.day_uuid
         WHERE d.trip_uuid = ?1",
    )?;
    let rows = stmt.query_map(params![trip_uuid.to_string()], |row| row.get(0))?;
    Ok(rows.collect::<Result<Vec<String>, _>>()?)
}

/// Deletes the photo record and its stored file
pub fn delete_photo(conn: &Connection, store: &MediaStore, photo_uuid: &Uuid) -> Result<(), AppError> {
    let photo = get_photo(conn, photo_uuid)?;

    let rows = conn.execute(
        "DELETE FROM photos WHERE uuid = ?1",
        params![photo_uuid.to_string()],
    )?;
    if rows == 0 {
        return Err(AppError::NotFound("Photo".to_string()));
    }

    if let Err(e) = store.delete(&photo.filename) {
        log::warn!("Photo {} deleted, file {} left behind: {}", photo_uuid, photo.filename, e);
    }

    Ok(())
}

pub fn update_caption(
    conn: &Connection,
    photo_uuid: &Uuid,
    caption: Option<&str>,
) -> Result<(), AppError> {
    let caption = caption.map(str::trim).filter(|c| !c.is_empty());
    let rows = conn.execute(
        "UPDATE photos SET caption = ?1 WHERE uuid = ?2",
        params![caption, photo_uuid.to_string()],
    )?;
    if rows == 0 {
        return Err(AppError::NotFound("Photo".to_string()));
    }
    Ok(())
}

/// Renumbers the photos of a day to `0..N-1` in the given order.
/// `ordered` must contain exactly the day's photos.
pub fn reorder_photos(conn: &Connection, day_uuid: &Uuid, ordered: &[Uuid]) -> Result<(), AppError> {
    let current: HashSet<Uuid> = list_day_photos(conn, day_uuid)?
        .into_iter()
        .map(|p| p.uuid)
        .collect();
    let requested: HashSet<Uuid> = ordered.iter().copied().collect();

    if requested.len() != ordered.len() || requested != current {
        return Err(AppError::Validation(
            "New order must list every photo of the day exactly once".to_string(),
        ));
    }

    let tx = conn.unchecked_transaction()?;
    for (index, photo_uuid) in ordered.iter().enumerate() {
        tx.execute(
            "UPDATE photos SET order_index = ?1 WHERE uuid = ?2",
            params![index as i32, photo_uuid.to_string()],
        )?;
    }
    tx.commit()?;

    Ok(())
}
