// libs/appointment-cell/src/services/blocks.rs
use std::sync::Arc;

use tracing::info;
use uuid::Uuid;

use shared_database::BookingStore;
use shared_models::{AvailabilityBlock, NewBlock};

use crate::models::{BookingError, CreateBlockRequest};

/// Staff-managed closures. Blocks may overlap each other freely.
pub struct AvailabilityBlockService {
    store: Arc<dyn BookingStore>,
}

impl AvailabilityBlockService {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    pub async fn create_block(
        &self,
        tenant_id: Uuid,
        request: CreateBlockRequest,
    ) -> Result<AvailabilityBlock, BookingError> {
        if request.start_at >= request.end_at {
            return Err(BookingError::InvalidWindow(format!(
                "block must start before it ends ({} - {})",
                request.start_at, request.end_at
            )));
        }

        if let Some(location_id) = request.location_id {
            self.store
                .get_location_by_id(tenant_id, location_id)
                .await?
                .ok_or(BookingError::LocationNotFound)?;
        }
        if let Some(provider_id) = request.provider_id {
            self.store
                .get_provider_by_id(tenant_id, provider_id)
                .await?
                .ok_or(BookingError::InvalidProvider)?;
        }

        let block = self
            .store
            .insert_block(NewBlock {
                tenant_id,
                location_id: request.location_id,
                provider_id: request.provider_id,
                start_at: request.start_at,
                end_at: request.end_at,
                reason: request.reason,
            })
            .await?;

        info!(
            "Created availability block {} for tenant {} ({} - {})",
            block.id, tenant_id, block.start_at, block.end_at
        );
        Ok(block)
    }

    pub async fn delete_block(&self, tenant_id: Uuid, block_id: Uuid) -> Result<(), BookingError> {
        if !self.store.delete_block(tenant_id, block_id).await? {
            return Err(BookingError::BlockNotFound);
        }

        info!("Deleted availability block {} for tenant {}", block_id, tenant_id);
        Ok(())
    }
}
