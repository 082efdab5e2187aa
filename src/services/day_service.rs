use crate::error::AppError;
use crate::models::trip::validate_dates;
use crate::models::{Day, JournalEntry, Trip};
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

const DAY_COLUMNS: &str = "uuid, trip_uuid, day_date, order_index";

/// Creates the days of a trip, one per calendar date from start to end, each
/// with an empty journal entry.
///
/// Does nothing when the trip already has days. Returns the number of days
/// created.
pub fn generate_days(conn: &Connection, trip: &Trip) -> Result<usize, AppError> {
    let tx = conn.unchecked_transaction()?;
    if count_days(&tx, &trip.uuid)? > 0 {
        log::debug!("Trip {} already has days, skipping generation", trip.uuid);
        return Ok(0);
    }
    let created = insert_days(&tx, trip)?;
    tx.commit()?;
    Ok(created)
}

/// Inserts days and empty journal entries, without transaction handling
pub(crate) fn insert_days(conn: &Connection, trip: &Trip) -> Result<usize, AppError> {
    validate_dates(trip.start_date, trip.end_date)?;

    let mut date = trip.start_date;
    let mut order_index = 0;
    loop {
        let day = Day::new(trip.uuid, date, order_index);
        conn.execute(
            "INSERT INTO days (uuid, trip_uuid, day_date, order_index) VALUES (?1, ?2, ?3, ?4)",
            params![
                day.uuid.to_string(),
                day.trip_uuid.to_string(),
                &day.date,
                day.order_index
            ],
        )?;

        let entry = JournalEntry::empty(day.uuid);
        conn.execute(
            "INSERT INTO journal_entries (uuid, day_uuid, content, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                entry.uuid.to_string(),
                entry.day_uuid.to_string(),
                &entry.content,
                &entry.created_at,
                &entry.updated_at
            ],
        )?;

        order_index += 1;
        match date.succ_opt() {
            Some(next) if date < trip.end_date => date = next,
            _ => break,
        }
    }

    log::info!("Generated {} days for trip {}", order_index, trip.uuid);
    Ok(order_index as usize)
}

pub fn count_days(conn: &Connection, trip_uuid: &Uuid) -> Result<i32, AppError> {
    let count: i32 = conn.query_row(
        "SELECT COUNT(*) FROM days WHERE trip_uuid = ?1",
        params![trip_uuid.to_string()],
        |row| row.get(0),
    )?;
    Ok(count)
}

/// Days of a trip, first day first
pub fn list_days(conn: &Connection, trip_uuid: &Uuid) -> Result<Vec<Day>, AppError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM days WHERE trip_uuid = ?1 ORDER BY order_index",
        DAY_COLUMNS
    ))?;
    let rows = stmt.query_map(params![trip_uuid.to_string()], |row| Day::try_from(row))?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}

pub fn get_day(conn: &Connection, day_uuid: &Uuid) -> Result<Day, AppError> {
    conn.query_row(
        &format!("SELECT {} FROM days WHERE uuid = ?1", DAY_COLUMNS),
        params![day_uuid.to_string()],
        |row| Day::try_from(row),
    )
    .optional()?
    .ok_or_else(|| AppError::NotFound("Day".to_string()))
}

pub fn find_day_by_date(
    conn: &Connection,
    trip_uuid: &Uuid,
    date: chrono::NaiveDate,
) -> Result<Option<Day>, AppError> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {} FROM days WHERE trip_uuid = ?1 AND day_date = ?2",
                DAY_COLUMNS
            ),
            params![trip_uuid.to_string(), &date],
            |row| Day::try_from(row),
        )
        .optional()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;
    use crate::services::{journal_service, trip_service};
    use chrono::{Duration, NaiveDate};

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        database::schema::init_schema(&conn).unwrap();
        conn
    }

    /// Inserts the trip row only, without generating days
    fn insert_bare_trip(conn: &Connection, trip: &Trip) {
        conn.execute(
            "INSERT INTO trips (uuid, name, start_date, end_date, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                trip.uuid.to_string(),
                &trip.name,
                &trip.start_date,
                &trip.end_date,
                &trip.created_at
            ],
        )
        .unwrap();
    }

    fn date(month: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, month, day).unwrap()
    }

    #[test]
    fn test_week_long_trip_gets_seven_days() {
        let conn = setup();
        let trip = Trip::new("Bretagne", date(7, 1), date(7, 7));
        insert_bare_trip(&conn, &trip);

        assert_eq!(generate_days(&conn, &trip).unwrap(), 7);

        let days = list_days(&conn, &trip.uuid).unwrap();
        assert_eq!(days.len(), 7);
        for (i, day) in days.iter().enumerate() {
            assert_eq!(day.order_index, i as i32);
            assert_eq!(day.date, date(7, 1) + Duration::days(i as i64));

            let entry = journal_service::get_journal_entry(&conn, &day.uuid)
                .unwrap()
                .expect("every day has an entry");
            assert!(entry.is_empty());
        }
    }

    #[test]
    fn test_generation_is_noop_when_days_exist() {
        let conn = setup();
        let trip = Trip::new("Bretagne", date(7, 1), date(7, 3));
        insert_bare_trip(&conn, &trip);

        generate_days(&conn, &trip).unwrap();
        let first_ids: Vec<_> = list_days(&conn, &trip.uuid)
            .unwrap()
            .into_iter()
            .map(|d| d.uuid)
            .collect();

        assert_eq!(generate_days(&conn, &trip).unwrap(), 0);
        let second_ids: Vec<_> = list_days(&conn, &trip.uuid)
            .unwrap()
            .into_iter()
            .map(|d| d.uuid)
            .collect();
        assert_eq!(first_ids, second_ids);
    }

    #[test]
    fn test_single_day_trip() {
        let conn = setup();
        let trip = Trip::new("Tagesausflug", date(8, 15), date(8, 15));
        trip_service::create_trip(&conn, &trip).unwrap();

        let days = list_days(&conn, &trip.uuid).unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].date, date(8, 15));
        assert_eq!(days[0].order_index, 0);
    }

    #[test]
    fn test_generation_across_month_boundary() {
        let conn = setup();
        let trip = Trip::new(
            "Jahreswechsel",
            NaiveDate::from_ymd_opt(2024, 12, 30).unwrap(),
            NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
        );
        trip_service::create_trip(&conn, &trip).unwrap();

        let days = list_days(&conn, &trip.uuid).unwrap();
        assert_eq!(days.len(), 4);
        assert_eq!(days[3].date, NaiveDate::from_ymd_opt(2025, 1, 2).unwrap());
    }

    #[test]
    fn test_reversed_dates_are_rejected() {
        let conn = setup();
        let trip = Trip::new("Falsch", date(7, 5), date(7, 1));
        assert!(matches!(
            generate_days(&conn, &trip),
            Err(AppError::Validation(_))
        ));
    }

    #[test]
    fn test_find_day_by_date() {
        let conn = setup();
        let trip = Trip::new("Bretagne", date(7, 1), date(7, 3));
        trip_service::create_trip(&conn, &trip).unwrap();

        let day = find_day_by_date(&conn, &trip.uuid, date(7, 2)).unwrap().unwrap();
        assert_eq!(day.order_index, 1);
        assert!(find_day_by_date(&conn, &trip.uuid, date(7, 9)).unwrap().is_none());
        assert_eq!(get_day(&conn, &day.uuid).unwrap(), day);
    }
}
