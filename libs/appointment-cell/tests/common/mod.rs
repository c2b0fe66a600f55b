use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use shared_database::{AppointmentQuery, BlockQuery, BookingStore, InMemoryBookingStore, StoreError};
use shared_models::{
    Appointment, AppointmentStatus, AvailabilityBlock, Location, NewAppointment, NewBlock, Patient, PatientUpsert,
    Provider, Service,
};

/// Widens the gap between a read and the write that depends on it, so two
/// concurrent callers both act on the same stale view.
pub struct DelayedStore {
    pub inner: Arc<InMemoryBookingStore>,
    /// Sleep after an appointment query has returned.
    pub after_query: Duration,
    /// Sleep after a single appointment has been read.
    pub after_get: Duration,
}

#[async_trait]
impl BookingStore for DelayedStore {
    async fn get_location_by_id(&self, tenant_id: Uuid, location_id: Uuid) -> Result<Option<Location>, StoreError> {
        self.inner.get_location_by_id(tenant_id, location_id).await
    }

    async fn first_location(&self, tenant_id: Uuid) -> Result<Option<Location>, StoreError> {
        self.inner.first_location(tenant_id).await
    }

    async fn get_provider_by_id(&self, tenant_id: Uuid, provider_id: Uuid) -> Result<Option<Provider>, StoreError> {
        self.inner.get_provider_by_id(tenant_id, provider_id).await
    }

    async fn first_active_provider(&self, tenant_id: Uuid) -> Result<Option<Provider>, StoreError> {
        self.inner.first_active_provider(tenant_id).await
    }

    async fn get_service_by_id(&self, tenant_id: Uuid, service_id: Uuid) -> Result<Option<Service>, StoreError> {
        self.inner.get_service_by_id(tenant_id, service_id).await
    }

    async fn find_patient_by_phone(&self, tenant_id: Uuid, phone: &str) -> Result<Option<Patient>, StoreError> {
        self.inner.find_patient_by_phone(tenant_id, phone).await
    }

    async fn upsert_patient(&self, patient: PatientUpsert) -> Result<Patient, StoreError> {
        self.inner.upsert_patient(patient).await
    }

    async fn query_appointments(&self, query: &AppointmentQuery) -> Result<Vec<Appointment>, StoreError> {
        let found = self.inner.query_appointments(query).await;
        tokio::time::sleep(self.after_query).await;
        found
    }

    async fn query_blocks(&self, query: &BlockQuery) -> Result<Vec<AvailabilityBlock>, StoreError> {
        self.inner.query_blocks(query).await
    }

    async fn insert_appointment(&self, appointment: NewAppointment) -> Result<Appointment, StoreError> {
        self.inner.insert_appointment(appointment).await
    }

    async fn get_appointment(&self, tenant_id: Uuid, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let found = self.inner.get_appointment(tenant_id, appointment_id).await;
        tokio::time::sleep(self.after_get).await;
        found
    }

    async fn update_appointment_status(
        &self,
        tenant_id: Uuid,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        status: AppointmentStatus,
    ) -> Result<Appointment, StoreError> {
        self.inner
            .update_appointment_status(tenant_id, appointment_id, expected, status)
            .await
    }

    async fn insert_block(&self, block: NewBlock) -> Result<AvailabilityBlock, StoreError> {
        self.inner.insert_block(block).await
    }

    async fn delete_block(&self, tenant_id: Uuid, block_id: Uuid) -> Result<bool, StoreError> {
        self.inner.delete_block(tenant_id, block_id).await
    }
}
