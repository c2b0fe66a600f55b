// libs/availability-cell/src/services/business_hours.rs
use chrono::{DateTime, Datelike, NaiveDate, NaiveTime, Utc, Weekday};
use chrono_tz::Tz;
use serde::Serialize;

use shared_models::WeeklySchedule;

/// A `[start, end)` instant pair seen from a location's wall clock.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LocalWindow {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub weekday: Weekday,
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl LocalWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>, timezone: Tz) -> Self {
        let local_start = start.with_timezone(&timezone);
        let local_end = end.with_timezone(&timezone);

        Self {
            start_date: local_start.date_naive(),
            end_date: local_end.date_naive(),
            weekday: local_start.weekday(),
            start: local_start.time(),
            end: local_end.time(),
        }
    }

    /// Windows never cross local midnight.
    pub fn is_single_day(&self) -> bool {
        self.start_date == self.end_date
    }
}

/// True iff `[start, end)` lies on one local calendar day and inside one of
/// that weekday's configured ranges.
pub fn fits_business_hours(
    start: DateTime<Utc>,
    end: DateTime<Utc>,
    schedule: &WeeklySchedule,
    timezone: Tz,
) -> bool {
    if start >= end {
        return false;
    }

    let local = LocalWindow::new(start, end, timezone);
    if !local.is_single_day() {
        return false;
    }

    schedule
        .ranges_for(local.weekday)
        .iter()
        .any(|range| range.covers(local.start, local.end))
}
