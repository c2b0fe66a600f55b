// libs/shared/models/src/scheduling.rs
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveTime, Utc, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

// ==============================================================================
// SCHEDULE VALUE TYPES
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("Invalid time of day: {0}")]
    InvalidTime(String),

    #[error("Time range must open before it closes: {open}-{close}")]
    EmptyRange { open: NaiveTime, close: NaiveTime },

    #[error("Unknown weekday: {0}")]
    UnknownWeekday(String),
}

/// Local `[open, close)` interval within one day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "TimeRangeRepr", into = "TimeRangeRepr")]
pub struct TimeRange {
    open: NaiveTime,
    close: NaiveTime,
}

impl TimeRange {
    pub fn new(open: NaiveTime, close: NaiveTime) -> Result<Self, ScheduleError> {
        if open >= close {
            return Err(ScheduleError::EmptyRange { open, close });
        }
        Ok(Self { open, close })
    }

    /// Parses `"HH:MM"` (or `"HH:MM:SS"`) boundaries.
    pub fn parse(open: &str, close: &str) -> Result<Self, ScheduleError> {
        Self::new(parse_time_of_day(open)?, parse_time_of_day(close)?)
    }

    pub fn open(&self) -> NaiveTime {
        self.open
    }

    pub fn close(&self) -> NaiveTime {
        self.close
    }

    /// True iff `open <= start` and `end <= close`.
    pub fn covers(&self, start: NaiveTime, end: NaiveTime) -> bool {
        self.open <= start && end <= self.close
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct TimeRangeRepr {
    open: String,
    close: String,
}

impl TryFrom<TimeRangeRepr> for TimeRange {
    type Error = ScheduleError;

    fn try_from(repr: TimeRangeRepr) -> Result<Self, Self::Error> {
        TimeRange::parse(&repr.open, &repr.close)
    }
}

impl From<TimeRange> for TimeRangeRepr {
    fn from(range: TimeRange) -> Self {
        Self {
            open: range.open.format("%H:%M").to_string(),
            close: range.close.format("%H:%M").to_string(),
        }
    }
}

fn parse_time_of_day(raw: &str) -> Result<NaiveTime, ScheduleError> {
    let raw = raw.trim();
    NaiveTime::parse_from_str(raw, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
        .map_err(|_| ScheduleError::InvalidTime(raw.to_string()))
}

/// Weekly opening hours: weekday -> list of local `[open, close)` ranges.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "BTreeMap<String, Vec<TimeRange>>", into = "BTreeMap<String, Vec<TimeRange>>")]
pub struct WeeklySchedule {
    days: HashMap<Weekday, Vec<TimeRange>>,
}

impl WeeklySchedule {
    pub fn new() -> Self {
        Self::default()
    }

    /// Mon–Fri 09:00–18:00, weekends closed.
    pub fn business_default() -> Self {
        let office_hours = TimeRange {
            open: NaiveTime::from_hms_opt(9, 0, 0).unwrap_or_default(),
            close: NaiveTime::from_hms_opt(18, 0, 0).unwrap_or_default(),
        };
        [Weekday::Mon, Weekday::Tue, Weekday::Wed, Weekday::Thu, Weekday::Fri]
            .into_iter()
            .fold(Self::new(), |schedule, day| schedule.with_range(day, office_hours))
    }

    pub fn with_range(mut self, day: Weekday, range: TimeRange) -> Self {
        self.add_range(day, range);
        self
    }

    pub fn add_range(&mut self, day: Weekday, range: TimeRange) {
        let ranges = self.days.entry(day).or_default();
        ranges.push(range);
        ranges.sort_by_key(|r| (r.open, r.close));
    }

    pub fn ranges_for(&self, day: Weekday) -> &[TimeRange] {
        self.days.get(&day).map(Vec::as_slice).unwrap_or(&[])
    }

    /// A schedule with no ranges on any day.
    pub fn is_empty(&self) -> bool {
        self.days.values().all(Vec::is_empty)
    }
}

impl TryFrom<BTreeMap<String, Vec<TimeRange>>> for WeeklySchedule {
    type Error = ScheduleError;

    fn try_from(raw: BTreeMap<String, Vec<TimeRange>>) -> Result<Self, Self::Error> {
        let mut schedule = WeeklySchedule::new();
        for (key, ranges) in raw {
            let day = Weekday::from_str(key.trim())
                .map_err(|_| ScheduleError::UnknownWeekday(key.clone()))?;
            for range in ranges {
                schedule.add_range(day, range);
            }
        }
        Ok(schedule)
    }
}

impl From<WeeklySchedule> for BTreeMap<String, Vec<TimeRange>> {
    fn from(schedule: WeeklySchedule) -> Self {
        schedule
            .days
            .into_iter()
            .filter(|(_, ranges)| !ranges.is_empty())
            .map(|(day, ranges)| (weekday_key(day).to_string(), ranges))
            .collect()
    }
}

fn weekday_key(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "mon",
        Weekday::Tue => "tue",
        Weekday::Wed => "wed",
        Weekday::Thu => "thu",
        Weekday::Fri => "fri",
        Weekday::Sat => "sat",
        Weekday::Sun => "sun",
    }
}

/// Absolute half-open `[start, end)` window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Option<Self> {
        (start < end).then_some(Self { start, end })
    }

    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }

    /// Widened by `minutes` on both sides, saturating at the representable range.
    pub fn padded(&self, minutes: i64) -> TimeWindow {
        let pad = Duration::try_minutes(minutes.max(0)).unwrap_or(Duration::MAX);
        TimeWindow {
            start: self.start.checked_sub_signed(pad).unwrap_or(DateTime::<Utc>::MIN_UTC),
            end: self.end.checked_add_signed(pad).unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }
}

// ==============================================================================
// TENANT-OWNED ENTITIES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Location {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub timezone: String,
    #[serde(default)]
    pub schedule: WeeklySchedule,
    #[serde(default)]
    pub buffer_minutes: i32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Provider {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub active: bool,
    pub default_location_id: Option<Uuid>,
    #[serde(default)]
    pub schedule_override: WeeklySchedule,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Service {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub name: String,
    pub active: bool,
    pub duration_minutes: Option<i32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub phone: String,
    pub name: String,
    pub email: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Find-or-create payload keyed by `(tenant_id, phone)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatientUpsert {
    pub tenant_id: Uuid,
    pub phone: String,
    pub name: String,
    pub email: Option<String>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Canceled,
    Completed,
    NoShow,
    RescheduleRequested,
}

impl AppointmentStatus {
    /// Statuses that still own their time window for conflict purposes.
    pub const SLOT_HOLDING: [AppointmentStatus; 3] = [
        AppointmentStatus::Pending,
        AppointmentStatus::Confirmed,
        AppointmentStatus::RescheduleRequested,
    ];

    pub fn holds_slot(&self) -> bool {
        Self::SLOT_HOLDING.contains(self)
    }

    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            AppointmentStatus::Canceled | AppointmentStatus::Completed | AppointmentStatus::NoShow
        )
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Canceled => "canceled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::NoShow => "no_show",
            AppointmentStatus::RescheduleRequested => "reschedule_requested",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: Uuid,
    pub tenant_id: Uuid,
    pub location_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub patient_id: Uuid,
    pub service_id: Option<Uuid>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
    /// Location buffer captured when the row was written.
    #[serde(default)]
    pub buffer_minutes: i32,
}

impl Appointment {
    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start_at,
            end: self.end_at,
        }
    }

    /// `[start_at, end_at + buffer)`: the range the storage constraint keeps exclusive.
    /// Two held ranges at one location may touch but never overlap, which leaves at
    /// least `buffer_minutes` between neighbours.
    pub fn held_window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start_at,
            end: self
                .end_at
                .checked_add_signed(Duration::minutes(i64::from(self.buffer_minutes.max(0))))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewAppointment {
    pub tenant_id: Uuid,
    pub location_id: Uuid,
    pub provider_id: Option<Uuid>,
    pub patient_id: Uuid,
    pub service_id: Option<Uuid>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AvailabilityBlock {
    pub id: Uuid,
    pub tenant_id: Uuid,
    /// `None` closes every location of the tenant.
    pub location_id: Option<Uuid>,
    /// `None` blocks every provider.
    pub provider_id: Option<Uuid>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AvailabilityBlock {
    pub fn window(&self) -> TimeWindow {
        TimeWindow {
            start: self.start_at,
            end: self.end_at,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBlock {
    pub tenant_id: Uuid,
    pub location_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub reason: Option<String>,
}
