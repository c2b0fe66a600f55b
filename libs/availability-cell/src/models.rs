// libs/availability-cell/src/models.rs
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use shared_database::StoreError;
use shared_models::{Appointment, AvailabilityBlock, WeeklySchedule};

/// Shortest bookable duration; anything shorter is clamped up.
pub const MIN_DURATION_MINUTES: i64 = 5;

/// Candidate start times are stepped on this grid.
pub const SLOT_GRANULARITY_MINUTES: i64 = 15;

/// Used when neither the caller nor the service names a duration.
pub const DEFAULT_DURATION_MINUTES: i64 = 30;

/// Longest duration a single slot or booking may span.
pub const MAX_DURATION_MINUTES: i64 = 24 * 60;

// ==============================================================================
// RESOLVED SCHEDULE
// ==============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScheduleSource {
    ProviderOverride,
    Location,
    BusinessDefault,
}

/// Hours, timezone and buffer that govern one location/provider pair.
#[derive(Debug, Clone)]
pub struct ResolvedSchedule {
    pub schedule: WeeklySchedule,
    pub timezone: Tz,
    pub buffer_minutes: i64,
    pub source: ScheduleSource,
}

// ==============================================================================
// CONFLICT DATA
// ==============================================================================

/// Slot-holding appointments and blocks fetched for one time range.
#[derive(Debug, Clone, Default)]
pub struct ConflictData {
    pub appointments: Vec<Appointment>,
    pub blocks: Vec<AvailabilityBlock>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictReason {
    Appointment(Uuid),
    Block(Uuid),
}

// ==============================================================================
// QUERIES AND RESPONSES
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotQuery {
    pub date: NaiveDate,
    pub location_id: Uuid,
    pub duration_minutes: i64,
    pub provider_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextDatesQuery {
    pub from: NaiveDate,
    pub location_id: Uuid,
    pub duration_minutes: i64,
    pub provider_id: Option<Uuid>,
    pub horizon_days: Option<u32>,
    pub limit: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatePreview {
    pub date: NaiveDate,
    pub slots: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SlotListResponse {
    pub date: NaiveDate,
    pub location_id: Uuid,
    pub timezone: String,
    pub duration_minutes: i64,
    pub slots: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NextDatesResponse {
    pub location_id: Uuid,
    pub timezone: String,
    pub dates: Vec<DatePreview>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AvailabilityError {
    #[error("Location not found")]
    LocationNotFound,

    #[error("Provider not found")]
    InvalidProvider,

    #[error("Provider is not accepting appointments")]
    PausedProvider,

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl From<StoreError> for AvailabilityError {
    fn from(err: StoreError) -> Self {
        AvailabilityError::StorageUnavailable(err.to_string())
    }
}
