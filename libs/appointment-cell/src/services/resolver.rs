// libs/appointment-cell/src/services/resolver.rs
//
// Optional service/provider/location references resolved as ordered steps,
// each returning the chosen entity or a typed error.

use std::sync::Arc;

use tracing::{debug, info};
use uuid::Uuid;

use availability_cell::{SlotEnumerator, DEFAULT_DURATION_MINUTES};
use shared_database::BookingStore;
use shared_models::{Location, Patient, PatientUpsert, Provider, Service};

use crate::models::BookingError;

/// Where a booking's location came from, in fallback order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocationSource {
    Explicit,
    ProviderDefault,
    TenantFirst,
}

impl LocationSource {
    pub const ORDER: [LocationSource; 3] = [
        LocationSource::Explicit,
        LocationSource::ProviderDefault,
        LocationSource::TenantFirst,
    ];
}

/// Provider chosen for a booking. Only a `requested` provider narrows
/// schedule and conflict scope; an auto-assigned one is attribution only.
#[derive(Debug, Clone)]
pub struct ProviderChoice {
    pub provider: Option<Provider>,
    pub requested: bool,
}

impl ProviderChoice {
    pub fn requested_provider(&self) -> Option<&Provider> {
        if self.requested {
            self.provider.as_ref()
        } else {
            None
        }
    }

    pub fn provider_id(&self) -> Option<Uuid> {
        self.provider.as_ref().map(|p| p.id)
    }
}

pub struct EntityResolver {
    store: Arc<dyn BookingStore>,
}

impl EntityResolver {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    pub async fn resolve_service(
        &self,
        tenant_id: Uuid,
        service_id: Option<Uuid>,
    ) -> Result<Option<Service>, BookingError> {
        let Some(service_id) = service_id else {
            return Ok(None);
        };

        let service = self
            .store
            .get_service_by_id(tenant_id, service_id)
            .await?
            .ok_or(BookingError::InvalidService)?;

        if !service.active {
            return Err(BookingError::PausedService);
        }
        Ok(Some(service))
    }

    /// Explicit override, else the service default, else 30; never below 5.
    pub fn resolve_duration(explicit: Option<i64>, service: Option<&Service>) -> i64 {
        let minutes = explicit
            .or_else(|| service.and_then(|s| s.duration_minutes).map(i64::from))
            .unwrap_or(DEFAULT_DURATION_MINUTES);
        SlotEnumerator::effective_duration(minutes)
    }

    /// A requested provider must exist and be active. Without one, the tenant's
    /// first active provider (by name) is attached when there is any.
    pub async fn resolve_provider(
        &self,
        tenant_id: Uuid,
        provider_id: Option<Uuid>,
    ) -> Result<ProviderChoice, BookingError> {
        match provider_id {
            Some(provider_id) => {
                let provider = self
                    .store
                    .get_provider_by_id(tenant_id, provider_id)
                    .await?
                    .ok_or(BookingError::InvalidProvider)?;
                if !provider.active {
                    return Err(BookingError::PausedProvider);
                }
                Ok(ProviderChoice {
                    provider: Some(provider),
                    requested: true,
                })
            }
            None => {
                let provider = self.store.first_active_provider(tenant_id).await?;
                if let Some(p) = &provider {
                    debug!("Auto-assigned provider {} for tenant {}", p.id, tenant_id);
                }
                Ok(ProviderChoice {
                    provider,
                    requested: false,
                })
            }
        }
    }

    /// Walks [`LocationSource::ORDER`]. An explicit id that does not resolve is an
    /// error; a dangling provider default just falls through.
    pub async fn resolve_location(
        &self,
        tenant_id: Uuid,
        explicit: Option<Uuid>,
        provider: Option<&Provider>,
    ) -> Result<(Location, LocationSource), BookingError> {
        for source in LocationSource::ORDER {
            let candidate = match source {
                LocationSource::Explicit => match explicit {
                    Some(location_id) => Some(
                        self.store
                            .get_location_by_id(tenant_id, location_id)
                            .await?
                            .ok_or(BookingError::LocationNotFound)?,
                    ),
                    None => None,
                },
                LocationSource::ProviderDefault => match provider.and_then(|p| p.default_location_id) {
                    Some(location_id) => self.store.get_location_by_id(tenant_id, location_id).await?,
                    None => None,
                },
                LocationSource::TenantFirst => self.store.first_location(tenant_id).await?,
            };

            if let Some(location) = candidate {
                info!("Resolved location {} for tenant {} via {:?}", location.id, tenant_id, source);
                return Ok((location, source));
            }
        }

        Err(BookingError::NoLocationConfigured)
    }

    /// Last write wins on name; email is only overwritten when supplied.
    pub async fn find_or_create_patient(
        &self,
        tenant_id: Uuid,
        phone: &str,
        name: &str,
        email: Option<&str>,
    ) -> Result<Patient, BookingError> {
        let existing = self.store.find_patient_by_phone(tenant_id, phone).await?;

        let patient = self
            .store
            .upsert_patient(PatientUpsert {
                tenant_id,
                phone: phone.to_string(),
                name: name.trim().to_string(),
                email: email.map(str::to_string),
            })
            .await?;

        match existing {
            Some(_) => debug!("Updated patient {} for tenant {}", patient.id, tenant_id),
            None => info!("Registered patient {} for tenant {}", patient.id, tenant_id),
        }
        Ok(patient)
    }
}
