use crate::models::uuid_column;
use chrono::NaiveDate;
use rusqlite::Row;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One calendar date of a trip
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Day {
    pub uuid: Uuid,
    pub trip_uuid: Uuid,
    pub date: NaiveDate,
    /// Position within the trip, 0 for the first day
    pub order_index: i32,
}

impl Day {
    pub fn new(trip_uuid: Uuid, date: NaiveDate, order_index: i32) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            trip_uuid,
            date,
            order_index,
        }
    }
}

/// Expects columns: uuid, trip_uuid, day_date, order_index
impl<'r> TryFrom<&Row<'r>> for Day {
    type Error = rusqlite::Error;

    fn try_from(row: &Row<'r>) -> Result<Self, Self::Error> {
        Ok(Day {
            uuid: uuid_column(row, 0)?,
            trip_uuid: uuid_column(row, 1)?,
            date: row.get(2)?,
            order_index: row.get(3)?,
        })
    }
}
