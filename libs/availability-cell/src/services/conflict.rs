// libs/availability-cell/src/services/conflict.rs
use std::sync::Arc;

use tracing::debug;
use uuid::Uuid;

use shared_database::{AppointmentQuery, BlockQuery, BookingStore, StoreError};
use shared_models::{Appointment, AvailabilityBlock, TimeWindow};

use crate::models::{ConflictData, ConflictReason};

/// Loads the rows that may collide with candidates inside a time range.
#[derive(Clone)]
pub struct ConflictDataProvider {
    store: Arc<dyn BookingStore>,
}

impl ConflictDataProvider {
    pub fn new(store: Arc<dyn BookingStore>) -> Self {
        Self { store }
    }

    /// Slot-holding appointments at `location_id` and the blocks that could apply there
    /// (location-less blocks included). Provider scoping is left to [`ConflictScope`].
    pub async fn fetch(
        &self,
        tenant_id: Uuid,
        window: TimeWindow,
        location_id: Uuid,
    ) -> Result<ConflictData, StoreError> {
        let appointment_query = AppointmentQuery::active_in(tenant_id, window).at_location(location_id);
        let block_query = BlockQuery {
            tenant_id,
            window,
            location_id: Some(location_id),
            provider_id: None,
        };

        let (appointments, blocks) = futures::try_join!(
            self.store.query_appointments(&appointment_query),
            self.store.query_blocks(&block_query)
        )?;

        debug!(
            "Conflict data for location {} in {} - {}: {} appointments, {} blocks",
            location_id,
            window.start,
            window.end,
            appointments.len(),
            blocks.len()
        );

        Ok(ConflictData { appointments, blocks })
    }
}

/// Which rows count as conflicts for a target location and (optional) provider.
///
/// Used unchanged by slot listing and by the booking-time conflict check.
#[derive(Debug, Clone, Copy)]
pub struct ConflictScope {
    pub location_id: Uuid,
    /// `None` means "any provider".
    pub provider_id: Option<Uuid>,
    pub buffer_minutes: i64,
}

impl ConflictScope {
    pub fn new(location_id: Uuid, provider_id: Option<Uuid>, buffer_minutes: i64) -> Self {
        Self {
            location_id,
            provider_id,
            buffer_minutes,
        }
    }

    /// Whole-room appointments block everyone; with no provider pinned, every
    /// appointment in the location blocks.
    pub fn appointment_blocks(&self, appointment: &Appointment, candidate: &TimeWindow) -> bool {
        if appointment.location_id != self.location_id || !appointment.status.holds_slot() {
            return false;
        }

        let same_resource = match (self.provider_id, appointment.provider_id) {
            (None, _) | (_, None) => true,
            (Some(wanted), Some(holder)) => wanted == holder,
        };

        same_resource && appointment.window().padded(self.buffer_minutes).overlaps(candidate)
    }

    /// Block windows are never padded. A provider-specific block still applies
    /// when the caller asked for any provider.
    pub fn block_applies(&self, block: &AvailabilityBlock, candidate: &TimeWindow) -> bool {
        let location_matches = block.location_id.map_or(true, |id| id == self.location_id);
        let provider_matches = match (self.provider_id, block.provider_id) {
            (None, _) | (_, None) => true,
            (Some(wanted), Some(blocked)) => wanted == blocked,
        };

        location_matches && provider_matches && block.window().overlaps(candidate)
    }

    pub fn first_conflict(&self, data: &ConflictData, candidate: &TimeWindow) -> Option<ConflictReason> {
        if let Some(block) = data.blocks.iter().find(|b| self.block_applies(b, candidate)) {
            return Some(ConflictReason::Block(block.id));
        }

        data.appointments
            .iter()
            .find(|a| self.appointment_blocks(a, candidate))
            .map(|a| ConflictReason::Appointment(a.id))
    }
}
