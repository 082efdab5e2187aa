pub mod schema;

use crate::config::AppConfig;
use crate::error::AppError;
use rusqlite::Connection;

/// Opens the database named in the config and brings its schema up to date
pub fn init_database(config: &AppConfig) -> Result<Connection, AppError> {
    let db_path = config.database_path();

    // Make sure the directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let conn = Connection::open(&db_path)?;
    schema::init_schema(&conn)?;

    log::debug!("Database ready at {:?}", db_path);
    Ok(conn)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_database_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.data_dir = dir.path().join("nested");

        let conn = init_database(&config).unwrap();
        let fk: i32 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(fk, 1);
        assert!(config.database_path().exists());
    }
}
