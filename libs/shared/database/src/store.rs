// libs/shared/database/src/store.rs
use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use shared_models::{
    Appointment, AppointmentStatus, AvailabilityBlock, Location, NewAppointment, NewBlock,
    Patient, PatientUpsert, Provider, Service, TimeWindow,
};

#[derive(Debug, Error)]
pub enum StoreError {
    /// The authoritative "no overlapping appointments per location" constraint fired.
    #[error("Appointment overlaps an existing booking at this location")]
    OverlapViolation,

    #[error("Record not found: {0}")]
    NotFound(String),

    /// A conditional write found the row in another status than expected.
    #[error("Status of {0} changed concurrently")]
    StatusChanged(String),

    #[error("Storage unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to decode stored record: {0}")]
    Decode(String),
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Decode(err.to_string())
    }
}

/// Appointments intersecting `window` for one tenant.
#[derive(Debug, Clone)]
pub struct AppointmentQuery {
    pub tenant_id: Uuid,
    pub window: TimeWindow,
    pub location_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
    /// Keep only statuses that still hold their slot.
    pub exclude_canceled: bool,
}

impl AppointmentQuery {
    pub fn active_in(tenant_id: Uuid, window: TimeWindow) -> Self {
        Self {
            tenant_id,
            window,
            location_id: None,
            provider_id: None,
            exclude_canceled: true,
        }
    }

    pub fn at_location(mut self, location_id: Uuid) -> Self {
        self.location_id = Some(location_id);
        self
    }

    pub fn matches(&self, appointment: &Appointment) -> bool {
        appointment.tenant_id == self.tenant_id
            && appointment.window().overlaps(&self.window)
            && self.location_id.map_or(true, |id| appointment.location_id == id)
            && self.provider_id.map_or(true, |id| appointment.provider_id == Some(id))
            && (!self.exclude_canceled || appointment.status.holds_slot())
    }
}

/// Blocks intersecting `window`. A location filter keeps tenant-wide (null) blocks too;
/// likewise a provider filter keeps blocks that apply to every provider.
#[derive(Debug, Clone)]
pub struct BlockQuery {
    pub tenant_id: Uuid,
    pub window: TimeWindow,
    pub location_id: Option<Uuid>,
    pub provider_id: Option<Uuid>,
}

impl BlockQuery {
    pub fn matches(&self, block: &AvailabilityBlock) -> bool {
        block.tenant_id == self.tenant_id
            && block.window().overlaps(&self.window)
            && match (self.location_id, block.location_id) {
                (Some(wanted), Some(scoped)) => wanted == scoped,
                _ => true,
            }
            && match (self.provider_id, block.provider_id) {
                (Some(wanted), Some(scoped)) => wanted == scoped,
                _ => true,
            }
    }
}

/// Storage collaborator consumed by the availability and booking engines.
///
/// Every call is tenant-scoped; implementations must never return another
/// tenant's rows.
#[async_trait]
pub trait BookingStore: Send + Sync {
    async fn get_location_by_id(&self, tenant_id: Uuid, location_id: Uuid) -> Result<Option<Location>, StoreError>;

    /// Alphabetically-first location of the tenant.
    async fn first_location(&self, tenant_id: Uuid) -> Result<Option<Location>, StoreError>;

    async fn get_provider_by_id(&self, tenant_id: Uuid, provider_id: Uuid) -> Result<Option<Provider>, StoreError>;

    /// First active provider by name. Not a scheduler, just a stable default.
    async fn first_active_provider(&self, tenant_id: Uuid) -> Result<Option<Provider>, StoreError>;

    async fn get_service_by_id(&self, tenant_id: Uuid, service_id: Uuid) -> Result<Option<Service>, StoreError>;

    async fn find_patient_by_phone(&self, tenant_id: Uuid, phone: &str) -> Result<Option<Patient>, StoreError>;

    /// Insert, or overwrite name (and email when given) of the `(tenant, phone)` row.
    async fn upsert_patient(&self, patient: PatientUpsert) -> Result<Patient, StoreError>;

    async fn query_appointments(&self, query: &AppointmentQuery) -> Result<Vec<Appointment>, StoreError>;

    async fn query_blocks(&self, query: &BlockQuery) -> Result<Vec<AvailabilityBlock>, StoreError>;

    /// Must fail with [`StoreError::OverlapViolation`] when the exclusion constraint fires.
    async fn insert_appointment(&self, appointment: NewAppointment) -> Result<Appointment, StoreError>;

    async fn get_appointment(&self, tenant_id: Uuid, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError>;

    /// Compare-and-set: writes `status` only while the row is still in `expected`,
    /// failing with [`StoreError::StatusChanged`] otherwise.
    async fn update_appointment_status(
        &self,
        tenant_id: Uuid,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        status: AppointmentStatus,
    ) -> Result<Appointment, StoreError>;

    async fn insert_block(&self, block: NewBlock) -> Result<AvailabilityBlock, StoreError>;

    /// Returns `false` when no such block exists for the tenant.
    async fn delete_block(&self, tenant_id: Uuid, block_id: Uuid) -> Result<bool, StoreError>;
}
