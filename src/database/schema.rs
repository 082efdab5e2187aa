use rusqlite::{Connection, Result};

/// Initialize complete database schema for the travel journal
pub fn init_schema(conn: &Connection) -> Result<()> {
    // Enable foreign keys (cascading deletes of days, entries and photos)
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    // Schema version table for future migrations
    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    // Check if schema already exists
    let current_version: i32 = conn
        .query_row(
            "SELECT version FROM schema_version ORDER BY version DESC LIMIT 1",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    if current_version < 1 {
        create_schema(conn)?;
        conn.execute("INSERT INTO schema_version (version) VALUES (1)", [])?;
    }

    Ok(())
}

/// Create the complete schema (version 1)
fn create_schema(conn: &Connection) -> Result<()> {
    // Table: trips
    conn.execute(
        "CREATE TABLE IF NOT EXISTS trips (
            uuid TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            description TEXT,
            feature_photo_filename TEXT,
            feature_photo_asset_id TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            CHECK(start_date <= end_date)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_trips_start ON trips(start_date DESC)",
        [],
    )?;

    // Trigger for updated_at in trips
    conn.execute(
        "CREATE TRIGGER IF NOT EXISTS update_trips_timestamp
         AFTER UPDATE ON trips
         BEGIN
            UPDATE trips SET updated_at = CURRENT_TIMESTAMP WHERE uuid = NEW.uuid;
         END",
        [],
    )?;

    // Table: days (one per calendar date of a trip)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS days (
            uuid TEXT PRIMARY KEY,
            trip_uuid TEXT NOT NULL,
            day_date TEXT NOT NULL,
            order_index INTEGER NOT NULL CHECK(order_index >= 0),
            FOREIGN KEY (trip_uuid) REFERENCES trips(uuid) ON DELETE CASCADE,
            UNIQUE(trip_uuid, day_date)
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_days_trip ON days(trip_uuid, order_index)",
        [],
    )?;

    // Table: journal_entries (at most one per day)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS journal_entries (
            uuid TEXT PRIMARY KEY,
            day_uuid TEXT NOT NULL UNIQUE,
            content TEXT NOT NULL DEFAULT '',
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (day_uuid) REFERENCES days(uuid) ON DELETE CASCADE
        )",
        [],
    )?;

    // Table: photos (imported photo and video media of a day)
    conn.execute(
        "CREATE TABLE IF NOT EXISTS photos (
            uuid TEXT PRIMARY KEY,
            day_uuid TEXT NOT NULL,
            filename TEXT NOT NULL,
            asset_identifier TEXT,
            media_kind TEXT CHECK(media_kind IN ('photo', 'video')) NOT NULL DEFAULT 'photo',
            caption TEXT,
            capture_date TEXT,
            order_index INTEGER NOT NULL DEFAULT 0,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP,
            FOREIGN KEY (day_uuid) REFERENCES days(uuid) ON DELETE CASCADE
        )",
        [],
    )?;

    // Indexes for photos
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_photos_day ON photos(day_uuid, order_index)",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_photos_asset ON photos(asset_identifier)",
        [],
    )?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();

        let versions: i32 = conn
            .query_row("SELECT COUNT(*) FROM schema_version", [], |row| row.get(0))
            .unwrap();
        assert_eq!(versions, 1);

        let tables: i32 = conn
            .query_row(
                "SELECT COUNT(*) FROM sqlite_master WHERE type='table'
                 AND name IN ('trips', 'days', 'journal_entries', 'photos')",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(tables, 4);
    }
}
