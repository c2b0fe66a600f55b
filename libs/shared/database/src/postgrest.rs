// libs/shared/database/src/postgrest.rs
use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, error, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::{
    Appointment, AppointmentStatus, AvailabilityBlock, Location, NewAppointment, NewBlock,
    Patient, PatientUpsert, Provider, Service,
};

use crate::store::{AppointmentQuery, BlockQuery, BookingStore, StoreError};
use crate::supabase::{merge_duplicates, return_representation, SupabaseClient, SupabaseError};

/// [`BookingStore`] over Supabase's PostgREST endpoint.
///
/// The overlap guarantee comes from the `appointments_no_overlap` exclusion
/// constraint in `migrations/0001_booking.sql`.
pub struct SupabaseBookingStore {
    supabase: SupabaseClient,
}

impl SupabaseBookingStore {
    pub fn new(config: &AppConfig) -> Self {
        Self {
            supabase: SupabaseClient::new(config),
        }
    }

    async fn fetch_rows<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, StoreError> {
        let rows: Vec<Value> = self
            .supabase
            .request(Method::GET, path, None)
            .await
            .map_err(map_store_error)?;

        rows.into_iter()
            .map(|row| serde_json::from_value(row).map_err(StoreError::from))
            .collect()
    }

    async fn fetch_one<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, StoreError> {
        Ok(self.fetch_rows(path).await?.into_iter().next())
    }

    async fn write_one<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Value,
        headers: reqwest::header::HeaderMap,
    ) -> Result<Option<T>, StoreError> {
        let rows: Vec<Value> = self
            .supabase
            .request_with_headers(method, path, Some(body), Some(headers))
            .await
            .map_err(map_store_error)?;

        match rows.into_iter().next() {
            Some(row) => Ok(Some(serde_json::from_value(row)?)),
            None => Ok(None),
        }
    }
}

fn timestamp(at: DateTime<Utc>) -> String {
    urlencoding::encode(&at.to_rfc3339_opts(SecondsFormat::AutoSi, true)).into_owned()
}

fn map_store_error(err: anyhow::Error) -> StoreError {
    if let Some(api) = err.downcast_ref::<SupabaseError>() {
        if api.is_exclusion_violation() {
            return StoreError::OverlapViolation;
        }
        if let SupabaseError::NotFound(message) = api {
            return StoreError::NotFound(message.clone());
        }
    }
    if let Some(decode) = err.downcast_ref::<serde_json::Error>() {
        return StoreError::Decode(decode.to_string());
    }
    error!("PostgREST request failed: {}", err);
    StoreError::Unavailable(err.to_string())
}

fn appointments_path(query: &AppointmentQuery) -> String {
    let mut query_parts = vec![
        format!("tenant_id=eq.{}", query.tenant_id),
        format!("start_at=lt.{}", timestamp(query.window.end)),
        format!("end_at=gt.{}", timestamp(query.window.start)),
    ];

    if let Some(location_id) = query.location_id {
        query_parts.push(format!("location_id=eq.{}", location_id));
    }
    if let Some(provider_id) = query.provider_id {
        query_parts.push(format!("provider_id=eq.{}", provider_id));
    }
    if query.exclude_canceled {
        let holding: Vec<&str> = AppointmentStatus::SLOT_HOLDING
            .iter()
            .map(AppointmentStatus::as_str)
            .collect();
        query_parts.push(format!("status=in.({})", holding.join(",")));
    }

    format!("/rest/v1/appointments?{}&order=start_at.asc", query_parts.join("&"))
}

fn blocks_path(query: &BlockQuery) -> String {
    let mut query_parts = vec![
        format!("tenant_id=eq.{}", query.tenant_id),
        format!("start_at=lt.{}", timestamp(query.window.end)),
        format!("end_at=gt.{}", timestamp(query.window.start)),
    ];

    let mut scopes = Vec::new();
    if let Some(location_id) = query.location_id {
        scopes.push(format!("or(location_id.is.null,location_id.eq.{})", location_id));
    }
    if let Some(provider_id) = query.provider_id {
        scopes.push(format!("or(provider_id.is.null,provider_id.eq.{})", provider_id));
    }
    if !scopes.is_empty() {
        query_parts.push(format!("and=({})", scopes.join(",")));
    }

    format!("/rest/v1/availability_blocks?{}&order=start_at.asc", query_parts.join("&"))
}

#[async_trait]
impl BookingStore for SupabaseBookingStore {
    async fn get_location_by_id(&self, tenant_id: Uuid, location_id: Uuid) -> Result<Option<Location>, StoreError> {
        self.fetch_one(&format!(
            "/rest/v1/locations?tenant_id=eq.{}&id=eq.{}&limit=1",
            tenant_id, location_id
        ))
        .await
    }

    async fn first_location(&self, tenant_id: Uuid) -> Result<Option<Location>, StoreError> {
        self.fetch_one(&format!(
            "/rest/v1/locations?tenant_id=eq.{}&order=name.asc,id.asc&limit=1",
            tenant_id
        ))
        .await
    }

    async fn get_provider_by_id(&self, tenant_id: Uuid, provider_id: Uuid) -> Result<Option<Provider>, StoreError> {
        self.fetch_one(&format!(
            "/rest/v1/providers?tenant_id=eq.{}&id=eq.{}&limit=1",
            tenant_id, provider_id
        ))
        .await
    }

    async fn first_active_provider(&self, tenant_id: Uuid) -> Result<Option<Provider>, StoreError> {
        self.fetch_one(&format!(
            "/rest/v1/providers?tenant_id=eq.{}&active=is.true&order=name.asc,id.asc&limit=1",
            tenant_id
        ))
        .await
    }

    async fn get_service_by_id(&self, tenant_id: Uuid, service_id: Uuid) -> Result<Option<Service>, StoreError> {
        self.fetch_one(&format!(
            "/rest/v1/services?tenant_id=eq.{}&id=eq.{}&limit=1",
            tenant_id, service_id
        ))
        .await
    }

    async fn find_patient_by_phone(&self, tenant_id: Uuid, phone: &str) -> Result<Option<Patient>, StoreError> {
        self.fetch_one(&format!(
            "/rest/v1/patients?tenant_id=eq.{}&phone=eq.{}&limit=1",
            tenant_id,
            urlencoding::encode(phone)
        ))
        .await
    }

    async fn upsert_patient(&self, patient: PatientUpsert) -> Result<Patient, StoreError> {
        debug!("Upserting patient {} for tenant {}", patient.phone, patient.tenant_id);

        let now = Utc::now().to_rfc3339();
        let mut body = json!({
            "tenant_id": patient.tenant_id,
            "phone": patient.phone,
            "name": patient.name,
            "updated_at": now,
        });
        // Omitted columns are left untouched by the merge.
        if let Some(email) = &patient.email {
            body["email"] = json!(email);
        }

        self.write_one(
            Method::POST,
            "/rest/v1/patients?on_conflict=tenant_id,phone",
            body,
            merge_duplicates(),
        )
        .await?
        .ok_or_else(|| StoreError::Unavailable("patient upsert returned no row".to_string()))
    }

    async fn query_appointments(&self, query: &AppointmentQuery) -> Result<Vec<Appointment>, StoreError> {
        self.fetch_rows(&appointments_path(query)).await
    }

    async fn query_blocks(&self, query: &BlockQuery) -> Result<Vec<AvailabilityBlock>, StoreError> {
        self.fetch_rows(&blocks_path(query)).await
    }

    async fn insert_appointment(&self, appointment: NewAppointment) -> Result<Appointment, StoreError> {
        let body = serde_json::to_value(&appointment)?;

        let created = self
            .write_one(Method::POST, "/rest/v1/appointments", body, return_representation())
            .await;

        match created {
            Ok(Some(appointment)) => Ok(appointment),
            Ok(None) => Err(StoreError::Unavailable("appointment insert returned no row".to_string())),
            Err(StoreError::OverlapViolation) => {
                warn!(
                    "Exclusion constraint rejected appointment at location {} from {} to {}",
                    appointment.location_id, appointment.start_at, appointment.end_at
                );
                Err(StoreError::OverlapViolation)
            }
            Err(other) => Err(other),
        }
    }

    async fn get_appointment(&self, tenant_id: Uuid, appointment_id: Uuid) -> Result<Option<Appointment>, StoreError> {
        self.fetch_one(&format!(
            "/rest/v1/appointments?tenant_id=eq.{}&id=eq.{}&limit=1",
            tenant_id, appointment_id
        ))
        .await
    }

    async fn update_appointment_status(
        &self,
        tenant_id: Uuid,
        appointment_id: Uuid,
        expected: AppointmentStatus,
        status: AppointmentStatus,
    ) -> Result<Appointment, StoreError> {
        let path = format!(
            "/rest/v1/appointments?tenant_id=eq.{}&id=eq.{}&status=eq.{}",
            tenant_id, appointment_id, expected
        );

        // No row back means it is gone or no longer in `expected`.
        self.write_one(Method::PATCH, &path, json!({ "status": status }), return_representation())
            .await?
            .ok_or_else(|| StoreError::StatusChanged(format!("appointment {}", appointment_id)))
    }

    async fn insert_block(&self, block: NewBlock) -> Result<AvailabilityBlock, StoreError> {
        let body = serde_json::to_value(&block)?;

        self.write_one(Method::POST, "/rest/v1/availability_blocks", body, return_representation())
            .await?
            .ok_or_else(|| StoreError::Unavailable("block insert returned no row".to_string()))
    }

    async fn delete_block(&self, tenant_id: Uuid, block_id: Uuid) -> Result<bool, StoreError> {
        let path = format!(
            "/rest/v1/availability_blocks?tenant_id=eq.{}&id=eq.{}",
            tenant_id, block_id
        );

        let deleted: Vec<Value> = self
            .supabase
            .request_with_headers(Method::DELETE, &path, None, Some(return_representation()))
            .await
            .map_err(map_store_error)?;

        Ok(!deleted.is_empty())
    }
}
