use crate::error::AppError;
use crate::models::JournalEntry;
use crate::notifications::{JournalEvent, Notifications};
use crate::services::day_service;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension};
use uuid::Uuid;

const ENTRY_COLUMNS: &str = "uuid, day_uuid, content, created_at, updated_at";

pub fn get_journal_entry(
    conn: &Connection,
    day_uuid: &Uuid,
) -> Result<Option<JournalEntry>, AppError> {
    Ok(conn
        .query_row(
            &format!(
                "SELECT {} FROM journal_entries WHERE day_uuid = ?1",
                ENTRY_COLUMNS
            ),
            params![day_uuid.to_string()],
            |row| JournalEntry::try_from(row),
        )
        .optional()?)
}

/// Stores the text of a day's entry, creating the entry if the day has none
/// yet, and announces the change
pub fn save_journal_entry(
    conn: &Connection,
    notifications: &Notifications,
    day_uuid: &Uuid,
    content: &str,
) -> Result<JournalEntry, AppError> {
    day_service::get_day(conn, day_uuid)?;

    let now = Utc::now();
    conn.execute(
        "INSERT INTO journal_entries (uuid, day_uuid, content, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?4)
         ON CONFLICT(day_uuid) DO UPDATE SET content = excluded.content,
                                             updated_at = excluded.updated_at",
        params![Uuid::new_v4().to_string(), day_uuid.to_string(), content, now],
    )?;

    let entry = get_journal_entry(conn, day_uuid)?
        .ok_or_else(|| AppError::NotFound("Journal entry".to_string()))?;
    log::debug!("Saved journal entry of day {}", day_uuid);

    notifications.publish(JournalEvent::JournalEntrySaved {
        day_uuid: *day_uuid,
        entry_uuid: entry.uuid,
    });
    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database;
    use crate::models::Trip;
    use crate::services::trip_service;
    use chrono::NaiveDate;

    fn setup() -> (Connection, Uuid) {
        let conn = Connection::open_in_memory().unwrap();
        database::schema::init_schema(&conn).unwrap();
        let date = NaiveDate::from_ymd_opt(2025, 5, 20).unwrap();
        let trip = Trip::new("Amsterdam", date, date);
        trip_service::create_trip(&conn, &trip).unwrap();
        let day = day_service::list_days(&conn, &trip.uuid).unwrap().remove(0);
        (conn, day.uuid)
    }

    #[test]
    fn test_save_updates_existing_entry() {
        let (conn, day_uuid) = setup();
        let notifications = Notifications::default();
        let generated = get_journal_entry(&conn, &day_uuid).unwrap().unwrap();

        let saved = save_journal_entry(&conn, &notifications, &day_uuid, "Grachtenfahrt").unwrap();
        assert_eq!(saved.uuid, generated.uuid);
        assert_eq!(saved.content, "Grachtenfahrt");
        assert!(saved.updated_at >= generated.updated_at);

        let count: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM journal_entries WHERE day_uuid = ?1",
                params![day_uuid.to_string()],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_save_creates_missing_entry() {
        let (conn, day_uuid) = setup();
        conn.execute("DELETE FROM journal_entries", []).unwrap();

        let saved =
            save_journal_entry(&conn, &Notifications::default(), &day_uuid, "Museum").unwrap();
        assert_eq!(saved.day_uuid, day_uuid);
        assert_eq!(
            get_journal_entry(&conn, &day_uuid).unwrap().unwrap().content,
            "Museum"
        );
    }

    #[test]
    fn test_save_publishes_event() {
        let (conn, day_uuid) = setup();
        let notifications = Notifications::default();
        let mut rx = notifications.subscribe();

        let saved = save_journal_entry(&conn, &notifications, &day_uuid, "Regen").unwrap();
        assert_eq!(
            rx.try_recv().unwrap(),
            JournalEvent::JournalEntrySaved {
                day_uuid,
                entry_uuid: saved.uuid
            }
        );
    }

    #[test]
    fn test_save_for_unknown_day_fails() {
        let (conn, _) = setup();
        let result = save_journal_entry(&conn, &Notifications::default(), &Uuid::new_v4(), "x");
        assert!(matches!(result, Err(AppError::NotFound(_))));
    }
}
