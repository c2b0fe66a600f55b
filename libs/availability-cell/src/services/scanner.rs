// libs/availability-cell/src/services/scanner.rs
use chrono::{DateTime, Days, NaiveDate, Utc};
use tracing::{debug, warn};
use uuid::Uuid;

use shared_config::AppConfig;

use crate::models::{DatePreview, ResolvedSchedule};
use crate::services::conflict::{ConflictDataProvider, ConflictScope};
use crate::services::slots::SlotEnumerator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    pub horizon_days: u32,
    pub chunk_days: u32,
    pub target_dates: usize,
    pub preview_slots: usize,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            horizon_days: 14,
            chunk_days: 7,
            target_dates: 5,
            preview_slots: 6,
        }
    }
}

impl From<&AppConfig> for ScanOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            horizon_days: config.scan_horizon_days,
            chunk_days: config.scan_chunk_days.max(1),
            target_dates: config.scan_target_dates,
            preview_slots: config.preview_slots,
        }
    }
}

/// Walks forward day by day, one conflict fetch per chunk, collecting open dates.
pub struct MultiDayScanner {
    conflicts: ConflictDataProvider,
    options: ScanOptions,
}

impl MultiDayScanner {
    pub fn new(conflicts: ConflictDataProvider, options: ScanOptions) -> Self {
        Self { conflicts, options }
    }

    /// `resolved` is used for every day of the scan. A chunk whose conflict data
    /// cannot be loaded is skipped, not fatal.
    pub async fn scan(
        &self,
        tenant_id: Uuid,
        from: NaiveDate,
        resolved: &ResolvedSchedule,
        duration_minutes: i64,
        scope: &ConflictScope,
        now: DateTime<Utc>,
    ) -> Vec<DatePreview> {
        let mut found = Vec::new();
        if self.options.target_dates == 0 {
            return found;
        }

        let horizon = u64::from(self.options.horizon_days);
        let chunk = u64::from(self.options.chunk_days.max(1));
        let mut offset = 0;

        while offset < horizon && found.len() < self.options.target_dates {
            let span = chunk.min(horizon - offset);
            // Past the end of the calendar nothing more can be scanned.
            let Some((first, last, window)) = from.checked_add_days(Days::new(offset)).and_then(|first| {
                let last = first.checked_add_days(Days::new(span - 1))?;
                Some((first, last, SlotEnumerator::fetch_window(first, last, resolved)?))
            }) else {
                warn!("Scan from {} ran off the calendar at offset {}", from, offset);
                break;
            };
            offset += span;

            let data = match self.conflicts.fetch(tenant_id, window, scope.location_id).await {
                Ok(data) => data,
                Err(e) => {
                    warn!("Skipping {} - {} for location {}: {}", first, last, scope.location_id, e);
                    continue;
                }
            };

            for date in first.iter_days().take(span as usize) {
                let slots = SlotEnumerator::enumerate(date, resolved, duration_minutes, &data, scope, now);
                if slots.is_empty() {
                    continue;
                }

                found.push(DatePreview {
                    date,
                    slots: slots.into_iter().take(self.options.preview_slots).collect(),
                });
                if found.len() >= self.options.target_dates {
                    break;
                }
            }
        }

        debug!(
            "Scan from {} found {} open dates for location {}",
            from,
            found.len(),
            scope.location_id
        );
        found
    }
}
