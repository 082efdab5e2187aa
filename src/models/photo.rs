use crate::models::uuid_column;
use chrono::{DateTime, Utc};
use photo_library::MediaKind;
use rusqlite::types::Type;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Imported photo or video attached to a day
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Photo {
    pub uuid: Uuid,
    pub day_uuid: Uuid,
    /// Key of the copy in app storage
    pub filename: String,
    /// Library asset the copy came from; `None` for legacy imports
    pub asset_identifier: Option<String>,
    pub kind: MediaKind,
    pub caption: Option<String>,
    /// Capture time from metadata or the day's date; legacy rows may lack it
    pub capture_date: Option<DateTime<Utc>>,
    pub order_index: i32,
    pub created_at: DateTime<Utc>,
}

impl Photo {
    /// Timestamp used to compare against library assets when no identifier
    /// was stored
    pub fn reference_timestamp(&self) -> DateTime<Utc> {
        self.capture_date.unwrap_or(self.created_at)
    }

    pub fn is_legacy(&self) -> bool {
        self.asset_identifier.is_none()
    }
}

/// Expects columns: uuid, day_uuid, filename, asset_identifier, media_kind,
/// caption, capture_date, order_index, created_at
impl<'r> TryFrom<&Row<'r>> for Photo {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'r>) -> Result<Self, Self::Error> {
        let kind_str: String = row.get(4)?;
        let kind = kind_str
            .parse::<MediaKind>()
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(4, Type::Text, Box::new(e)))?;

        Ok(Photo {
            uuid: uuid_column(row, 0)?,
            day_uuid: uuid_column(row, 1)?,
            filename: row.get(2)?,
            asset_identifier: row.get(3)?,
            kind,
            caption: row.get(5)?,
            capture_date: row.get(6)?,
            order_index: row.get(7)?,
            created_at: row.get(8)?,
        })
    }
}
