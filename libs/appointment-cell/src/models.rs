// libs/appointment-cell/src/models.rs
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use availability_cell::AvailabilityError;
use shared_database::StoreError;
use shared_models::AppointmentStatus;

// ==============================================================================
// REQUEST MODELS
// ==============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BookAppointmentRequest {
    pub patient_name: String,
    pub patient_phone: String,
    pub patient_email: Option<String>,
    pub start_at: DateTime<Utc>,
    pub duration_minutes: Option<i64>,
    pub service_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub notes: Option<String>,
}

/// Staff or patient driven status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum TransitionAction {
    Confirm,
    Cancel,
    /// The patient attended.
    Complete,
    MarkNoShow,
    RequestReschedule,
    /// `keep` returns the appointment to `confirmed`, otherwise it is canceled.
    ResolveReschedule { keep: bool },
}

impl std::fmt::Display for TransitionAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            TransitionAction::Confirm => "confirm",
            TransitionAction::Cancel => "cancel",
            TransitionAction::Complete => "complete",
            TransitionAction::MarkNoShow => "mark_no_show",
            TransitionAction::RequestReschedule => "request_reschedule",
            TransitionAction::ResolveReschedule { keep: true } => "resolve_reschedule(keep)",
            TransitionAction::ResolveReschedule { keep: false } => "resolve_reschedule(cancel)",
        };
        f.write_str(name)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBlockRequest {
    pub location_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    pub start_at: DateTime<Utc>,
    pub end_at: DateTime<Utc>,
    pub reason: Option<String>,
}

// ==============================================================================
// COLLABORATOR PAYLOADS
// ==============================================================================

/// Body of the "appointment created" notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppointmentCreatedNotice {
    pub appointment_id: Uuid,
    pub tenant_id: Uuid,
    pub phone: String,
    pub name: String,
    pub start_at: DateTime<Utc>,
    pub location_name: String,
    pub provider_name: Option<String>,
}

// ==============================================================================
// ERRORS
// ==============================================================================

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    #[error("Service not found")]
    InvalidService,

    #[error("Service is not currently offered")]
    PausedService,

    #[error("Provider not found")]
    InvalidProvider,

    #[error("Provider is not accepting appointments")]
    PausedProvider,

    #[error("No location configured for this tenant")]
    NoLocationConfigured,

    #[error("Location not found")]
    LocationNotFound,

    #[error("Requested time is outside business hours ({local_weekday} {local_time} in {timezone})")]
    OutsideBusinessHours {
        timezone: String,
        local_weekday: String,
        local_hour: u32,
        local_time: String,
    },

    #[error("Requested slot is no longer available")]
    SlotTaken,

    #[error("Invalid date: {0}")]
    InvalidDate(String),

    #[error("Invalid window: {0}")]
    InvalidWindow(String),

    #[error("Invalid phone number: {0}")]
    InvalidPhone(String),

    #[error("Unknown timezone: {0}")]
    InvalidTimezone(String),

    #[error("Appointment not found")]
    AppointmentNotFound,

    #[error("Availability block not found")]
    BlockNotFound,

    #[error("Cannot {action} an appointment that is {from}")]
    InvalidStatusTransition {
        from: AppointmentStatus,
        action: TransitionAction,
    },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),
}

impl From<StoreError> for BookingError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::OverlapViolation => BookingError::SlotTaken,
            StoreError::NotFound(_) => BookingError::AppointmentNotFound,
            other => BookingError::StorageUnavailable(other.to_string()),
        }
    }
}

impl From<AvailabilityError> for BookingError {
    fn from(err: AvailabilityError) -> Self {
        match err {
            AvailabilityError::LocationNotFound => BookingError::LocationNotFound,
            AvailabilityError::InvalidProvider => BookingError::InvalidProvider,
            AvailabilityError::PausedProvider => BookingError::PausedProvider,
            AvailabilityError::InvalidTimezone(zone) => BookingError::InvalidTimezone(zone),
            AvailabilityError::InvalidDate(msg) => BookingError::InvalidDate(msg),
            AvailabilityError::InvalidWindow(msg) => BookingError::InvalidWindow(msg),
            AvailabilityError::StorageUnavailable(msg) => BookingError::StorageUnavailable(msg),
        }
    }
}
