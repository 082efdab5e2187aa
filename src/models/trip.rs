use crate::error::AppError;
use crate::models::uuid_column;
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Maximum length of a trip name
const MAX_NAME_LEN: usize = 200;

/// Longest trip in days, both ends inclusive
pub const MAX_TRIP_DAYS: i64 = 1000;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Trip {
    pub uuid: Uuid,
    pub name: String,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub description: Option<String>,
    /// Filename of the cover image in app storage
    pub feature_photo_filename: Option<String>,
    /// Library asset the cover image was copied from
    pub feature_photo_asset_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Trip {
    pub fn new(name: impl Into<String>, start_date: NaiveDate, end_date: NaiveDate) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            start_date,
            end_date,
            description: None,
            feature_photo_filename: None,
            feature_photo_asset_id: None,
            created_at: Utc::now(),
        }
    }

    /// Number of calendar days covered, both ends inclusive
    pub fn day_count(&self) -> usize {
        ((self.end_date - self.start_date).num_days() + 1).max(0) as usize
    }

    pub fn validate(&self) -> Result<(), AppError> {
        validate_dates(self.start_date, self.end_date)?;

        if self.name.trim().is_empty() {
            return Err(AppError::Validation("Trip name must not be empty".to_string()));
        }
        if self.name.chars().count() > MAX_NAME_LEN {
            return Err(AppError::Validation(format!(
                "Trip name must be at most {} characters",
                MAX_NAME_LEN
            )));
        }

        Ok(())
    }
}

pub fn validate_dates(start_date: NaiveDate, end_date: NaiveDate) -> Result<(), AppError> {
    if start_date > end_date {
        return Err(AppError::Validation(
            "Start date must not be after end date".to_string(),
        ));
    }
    if (end_date - start_date).num_days() >= MAX_TRIP_DAYS {
        return Err(AppError::Validation(format!(
            "A trip can span at most {} days",
            MAX_TRIP_DAYS
        )));
    }
    Ok(())
}

/// Expects columns: uuid, name, start_date, end_date, description,
/// feature_photo_filename, feature_photo_asset_id, created_at
impl<'r> TryFrom<&Row<'r>> for Trip {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'r>) -> Result<Self, Self::Error> {
        Ok(Trip {
            uuid: uuid_column(row, 0)?,
            name: row.get(1)?,
            start_date: row.get(2)?,
            end_date: row.get(3)?,
            description: row.get(4)?,
            feature_photo_filename: row.get(5)?,
            feature_photo_asset_id: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, d).unwrap()
    }

    #[test]
    fn test_day_count_is_inclusive() {
        assert_eq!(Trip::new("Korsika", date(1), date(7)).day_count(), 7);
        assert_eq!(Trip::new("Tagesausflug", date(3), date(3)).day_count(), 1);
    }

    #[test]
    fn test_validate_rejects_reversed_dates() {
        let trip = Trip::new("Rückwärts", date(5), date(4));
        assert!(matches!(trip.validate(), Err(AppError::Validation(_))));
    }

    #[test]
    fn test_validate_limits_trip_span() {
        let start = date(1);
        let longest = start + chrono::Duration::days(MAX_TRIP_DAYS - 1);
        assert!(validate_dates(start, longest).is_ok());
        assert!(matches!(
            validate_dates(start, longest + chrono::Duration::days(1)),
            Err(AppError::Validation(_))
        ));
        assert!(validate_dates(NaiveDate::MIN, NaiveDate::MAX).is_err());
        assert!(validate_dates(NaiveDate::MAX, NaiveDate::MAX).is_ok());
    }

    #[test]
    fn test_validate_rejects_blank_name() {
        let trip = Trip::new("   ", date(1), date(2));
        assert!(trip.validate().is_err());
        assert!(Trip::new("Lissabon", date(1), date(2)).validate().is_ok());
    }
}
