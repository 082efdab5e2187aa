pub mod day;
pub mod journal_entry;
pub mod photo;
pub mod trip;

pub use day::Day;
pub use journal_entry::JournalEntry;
pub use photo::Photo;
pub use trip::Trip;

use rusqlite::types::Type;
use rusqlite::Row;
use uuid::Uuid;

/// Reads a TEXT column holding a UUID
pub(crate) fn uuid_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Uuid> {
    let value: String = row.get(idx)?;
    Uuid::parse_str(&value)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
