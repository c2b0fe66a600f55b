// libs/shared/database/src/memory.rs
//
// Process-local store used by tests and by the API when no database is configured.
// The write lock stands in for PostgreSQL's exclusion constraint.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

use shared_models::{
    Appointment, AppointmentStatus, AvailabilityBlock, Location, NewAppointment, NewBlock,
    Patient, PatientUpsert, Provider, Service,
};

use crate::store::{AppointmentQuery, BlockQuery, BookingStore, StoreError};

#[derive(Default)]
struct Tables {
    locations: Vec<Location>,
    providers: Vec<Provider>,
    services: Vec<Service>,
    patients: HashMap<(Uuid, String), Patient>,
    appointments: Vec<Appointment>,
    blocks: Vec<AvailabilityBlock>,
}

#[derive(Default)]
pub struct InMemoryBookingStore {
    tables: RwLock<Tables>,
}

impl InMemoryBookingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn add_location(&self, location: Location) {
        self.tables.write().await.locations.push(location);
    }

    pub async fn add_provider(&self, provider: Provider) {
        self.tables.write().await.providers.push(provider);
    }

    pub async fn add_service(&self, service: Service) {
        self.tables.write().await.services.push(service);
    }

    /// Seeds a row as-is, still subject to the overlap constraint. The buffer is
    /// re-captured from the row's location, as the database trigger does.
    pub async fn add_appointment(&self, mut appointment: Appointment) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;
        appointment.buffer_minutes = Self::location_buffer(&tables, appointment.location_id);
        Self::check_exclusion(&tables, &appointment)?;
        tables.appointments.push(appointment);
        Ok(())
    }

    pub async fn appointments(&self, tenant_id: Uuid) -> Vec<Appointment> {
        self.tables
            .read()
            .await
            .appointments
            .iter()
            .filter(|a| a.tenant_id == tenant_id)
            .cloned()
            .collect()
    }

    fn location_buffer(tables: &Tables, location_id: Uuid) -> i32 {
        tables
            .locations
            .iter()
            .find(|l| l.id == location_id)
            .map_or(0, |l| l.buffer_minutes.max(0))
    }

    /// Held windows (`end + buffer`) must not overlap among slot-holding rows of a location.
    fn check_exclusion(tables: &Tables, candidate: &Appointment) -> Result<(), StoreError> {
        if !candidate.status.holds_slot() {
            return Ok(());
        }

        let clash = tables.appointments.iter().any(|existing| {
            existing.id != candidate.id
                && existing.tenant_id == candidate.tenant_id
                && existing.location_id == candidate.location_id
                && existing.status.holds_slot()
                && existing.held_window().overlaps(&candidate.held_window())
        });

        if clash {
            warn!(
                "Exclusion constraint rejected appointment at location {} from {} to {}",
                candidate.location_id, candidate.start_at, candidate.end_at
            );
            return Err(StoreError::OverlapViolation);
        }
        Ok(())
    }
}

#[async_trait]
impl BookingStore for InMemoryBookingStore {
    async fn get_location_by_id(&self, tenant_id: Uuid, location_id: Uuid) -> Result<Option<Location>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .locations
            .iter()
            .find(|l| l.tenant_id == tenant_id && l.id == location_id)
            .cloned())
    }

    async fn first_location(&self, tenant_id: Uuid) -> Result<Option<Location>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .locations
            .iter()
            .filter(|l| l.tenant_id == tenant_id)
            .min_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn get_provider_by_id(&self, tenant_id: Uuid, provider_id: Uuid) -> Result<Option<Provider>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .providers
            .iter()
            .find(|p| p.tenant_id == tenant_id && p.id == provider_id)
            .cloned())
    }

    async fn first_active_provider(&self, tenant_id: Uuid) -> Result<Option<Provider>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .providers
            .iter()
            .filter(|p| p.tenant_id == tenant_id && p.active)
            .min_by(|a, b| a.name.cmp(&b.name).then(a.id.cmp(&b.id)))
            .cloned())
    }

    async fn get_service_by_id(&self, tenant_id: Uuid, service_id: Uuid) -> Result<Option<Service>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .services
            .iter()
            .find(|s| s.tenant_id == tenant_id && s.id == service_id)
            .cloned())
    }

    async fn find_patient_by_phone(&self, tenant_id: Uuid, phone: &str) -> Result<Option<Patient>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables.patients.get(&(tenant_id, phone.to_string())).cloned())
    }

    async fn upsert_patient(&self, upsert: PatientUpsert) -> Result<Patient, StoreError> {
        let mut tables = self.tables.write().await;
        let now = Utc::now();
        let key = (upsert.tenant_id, upsert.phone.clone());

        let patient = tables
            .patients
            .entry(key)
            .and_modify(|existing| {
                existing.name = upsert.name.clone();
                if upsert.email.is_some() {
                    existing.email = upsert.email.clone();
                }
                existing.updated_at = now;
            })
            .or_insert_with(|| Patient {
                id: Uuid::new_v4(),
                tenant_id: upsert.tenant_id,
                phone: upsert.phone.clone(),
                name: upsert.name.clone(),
                email: upsert.email.clone(),
                created_at: now,
                updated_at: now,
            });

        Ok(patient.clone())
    }

    async fn query_appointments(&self, query: &AppointmentQuery) -> Result<Vec<Appointment>, StoreError> {
        let tables = self.tables.read().await;
        let mut found: Vec<Appointment> = tables
            .appointments
            .iter()
            .filter(|a| query.matches(a))
            .cloned()
            .collect();
        found.sort_by_key(|a| a.start_at);
        Ok(found)
    }

    async fn query_blocks(&self, query: &BlockQuery) -> Result<Vec<AvailabilityBlock>, StoreError> {
        let tables = self.tables.read().await;
        let mut found: Vec<AvailabilityBlock> = tables
            .blocks
            .iter()
            .filter(|b| query.matches(b))
            .cloned()
            .collect();
        found.sort_by_key(|b| b.start_at);
        Ok(found)
    }

    async fn insert_appointment(&self, new: NewAppointment) -> Result<Appointment, StoreError> {
        let mut tables = self.tables.write().await;
        let appointment = Appointment {
            id: Uuid::new_v4(),
            tenant_id: new.tenant_id,
            location_id: new.location_id,
            provider_id: new.provider_id,
            patient_id: new.patient_id,
            service_id: new.service_id,
            start_at: new.start_at,
            end_at: new.end_at,
            status: new.status,
            notes: new.notes,
            created_at: Utc::now(),
            buffer_minutes: Self::location_buffer(&tables, new.location_id),
        };

        Self::check_exclusion(&tables, &appointment)?;
        tables.appointments.push(appointment.clone());
        debug!("Stored appointment {}", appointment.id);
        Ok(appointment)
    }

    async fn get_appointment(&self, tenant_id: Uuid, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .appointments
            .iter()
            .find(|a| a.tenant_id == tenant_id && a.id == appointment_id)
            .cloned())
    }

    async fn update_appointment_status(
        &self,
        tenant_id: Uuid,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        status: AppointmentStatus,
    ) -> Result<Appointment, StoreError> {
        let mut tables = self.tables.write().await;
        let index = tables
            .appointments
            .iter()
            .position(|a| a.tenant_id == tenant_id && a.id == appointment_id)
            .ok_or_else(|| StoreError::NotFound(format!("appointment {}", appointment_id)))?;

        if tables.appointments[index].status != expected {
            warn!(
                "Appointment {} is {} rather than {}, refusing to set {}",
                appointment_id, tables.appointments[index].status, expected, status
            );
            return Err(StoreError::StatusChanged(format!("appointment {}", appointment_id)));
        }

        let mut updated = tables.appointments[index].clone();
        updated.status = status;
        Self::check_exclusion(&tables, &updated)?;
        tables.appointments[index] = updated.clone();
        Ok(updated)
    }

    async fn insert_block(&self, new: NewBlock) -> Result<AvailabilityBlock, StoreError> {
        let block = AvailabilityBlock {
            id: Uuid::new_v4(),
            tenant_id: new.tenant_id,
            location_id: new.location_id,
            provider_id: new.provider_id,
            start_at: new.start_at,
            end_at: new.end_at,
            reason: new.reason,
            created_at: Utc::now(),
        };
        self.tables.write().await.blocks.push(block.clone());
        Ok(block)
    }

    async fn delete_block(&self, tenant_id: Uuid, block_id: Uuid) -> Result<bool, StoreError> {
        let mut tables = self.tables.write().await;
        let before = tables.blocks.len();
        tables
            .blocks
            .retain(|b| !(b.tenant_id == tenant_id && b.id == block_id));
        Ok(tables.blocks.len() != before)
    }
}
