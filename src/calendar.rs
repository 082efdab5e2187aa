//! Calendar-aware day boundaries.
//!
//! Trip days are calendar dates in the user's zone. Library assets carry UTC
//! timestamps. Everything that maps one onto the other goes through
//! [`Calendar`].

use chrono::{
    DateTime, Duration, FixedOffset, Local, NaiveDate, NaiveDateTime, NaiveTime, Offset, TimeZone,
    Utc,
};
use photo_library::DateRange;

/// Number of minutes probed forward when midnight does not exist (DST gap)
const DST_GAP_PROBE_MINUTES: i64 = 180;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Calendar {
    /// System time zone
    Local,
    /// Fixed offset from UTC
    Fixed(FixedOffset),
}

impl Calendar {
    /// `None` selects the system zone. Out-of-range offsets fall back to it.
    pub fn from_offset_minutes(minutes: Option<i32>) -> Self {
        match minutes
            .and_then(|m| m.checked_mul(60))
            .and_then(FixedOffset::east_opt)
        {
            Some(offset) => Calendar::Fixed(offset),
            None => Calendar::Local,
        }
    }

    pub fn utc() -> Self {
        Calendar::Fixed(Utc.fix())
    }

    /// Interprets a wall-clock time in this calendar. Ambiguous times take the
    /// earlier instant, non-existent ones yield `None`.
    pub fn local_to_utc(&self, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
        match self {
            Calendar::Local => earliest(&Local, naive),
            Calendar::Fixed(offset) => earliest(offset, naive),
        }
    }

    /// First instant of `date`
    pub fn start_of_day(&self, date: NaiveDate) -> DateTime<Utc> {
        match self {
            Calendar::Local => start_of_day_in(&Local, date),
            Calendar::Fixed(offset) => start_of_day_in(offset, date),
        }
    }

    /// `[start_of_day(date), start_of_day(date) + 24h)`
    pub fn day_window(&self, date: NaiveDate) -> DateRange {
        let start = self.start_of_day(date);
        DateRange::new(start, one_day_after(start))
    }

    /// `[start_of_day(first), start_of_day(last) + 24h)`
    pub fn range_window(&self, first: NaiveDate, last: NaiveDate) -> DateRange {
        DateRange::new(
            self.start_of_day(first),
            one_day_after(self.start_of_day(last)),
        )
    }

    /// Calendar date an instant falls on
    pub fn date_of(&self, ts: DateTime<Utc>) -> NaiveDate {
        match self {
            Calendar::Local => ts.with_timezone(&Local).date_naive(),
            Calendar::Fixed(offset) => ts.with_timezone(offset).date_naive(),
        }
    }
}

fn earliest<Tz: TimeZone>(tz: &Tz, naive: NaiveDateTime) -> Option<DateTime<Utc>> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
}

fn start_of_day_in<Tz: TimeZone>(tz: &Tz, date: NaiveDate) -> DateTime<Utc> {
    let midnight = date.and_time(NaiveTime::MIN);
    if let Some(start) = earliest(tz, midnight) {
        return start;
    }

    // Midnight skipped by a DST transition: first valid minute of the day
    (1..=DST_GAP_PROBE_MINUTES)
        .find_map(|m| earliest(tz, midnight + Duration::minutes(m)))
        .unwrap_or_else(|| Utc.from_utc_datetime(&midnight))
}

/// Saturates at the end of the representable range
fn one_day_after(start: DateTime<Utc>) -> DateTime<Utc> {
    start
        .checked_add_signed(Duration::hours(24))
        .unwrap_or(DateTime::<Utc>::MAX_UTC)
}
