// libs/appointment-cell/src/services/notifications.rs
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_config::AppConfig;
use shared_models::Appointment;

use crate::models::AppointmentCreatedNotice;

/// Tells the patient their appointment exists (WhatsApp, SMS, ...).
#[async_trait]
pub trait AppointmentNotifier: Send + Sync {
    async fn appointment_created(&self, notice: &AppointmentCreatedNotice) -> Result<()>;
}

/// Mirrors a booking into the provider's external calendar.
#[async_trait]
pub trait CalendarSync: Send + Sync {
    async fn sync_appointment(&self, appointment: &Appointment, provider_id: Option<Uuid>) -> Result<()>;
}

// ==============================================================================
// WEBHOOK IMPLEMENTATIONS
// ==============================================================================

pub struct WebhookNotifier {
    client: Client,
    url: String,
}

impl WebhookNotifier {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl AppointmentNotifier for WebhookNotifier {
    async fn appointment_created(&self, notice: &AppointmentCreatedNotice) -> Result<()> {
        debug!("Posting appointment notice {} to {}", notice.appointment_id, self.url);

        let response = self
            .client
            .post(&self.url)
            .json(&json!({
                "event": "appointment.created",
                "data": notice
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Notification webhook returned {}: {}", status, body));
        }

        info!("Notified patient of appointment {}", notice.appointment_id);
        Ok(())
    }
}

pub struct WebhookCalendarSync {
    client: Client,
    url: String,
}

impl WebhookCalendarSync {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl CalendarSync for WebhookCalendarSync {
    async fn sync_appointment(&self, appointment: &Appointment, provider_id: Option<Uuid>) -> Result<()> {
        debug!("Syncing appointment {} to {}", appointment.id, self.url);

        let response = self
            .client
            .post(&self.url)
            .json(&json!({
                "event": "calendar.sync",
                "provider_id": provider_id,
                "appointment": appointment
            }))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(anyhow!("Calendar webhook returned {}: {}", status, body));
        }

        Ok(())
    }
}

// ==============================================================================
// DISABLED IMPLEMENTATIONS
// ==============================================================================

pub struct LogOnlyNotifier;

#[async_trait]
impl AppointmentNotifier for LogOnlyNotifier {
    async fn appointment_created(&self, notice: &AppointmentCreatedNotice) -> Result<()> {
        debug!("Notifications disabled, skipping notice for {}", notice.appointment_id);
        Ok(())
    }
}

pub struct LogOnlyCalendarSync;

#[async_trait]
impl CalendarSync for LogOnlyCalendarSync {
    async fn sync_appointment(&self, appointment: &Appointment, _provider_id: Option<Uuid>) -> Result<()> {
        debug!("Calendar sync disabled, skipping {}", appointment.id);
        Ok(())
    }
}

pub fn notifier_from_config(config: &AppConfig) -> Arc<dyn AppointmentNotifier> {
    match &config.notification_webhook_url {
        Some(url) => Arc::new(WebhookNotifier::new(url.clone())),
        None => Arc::new(LogOnlyNotifier),
    }
}

pub fn calendar_from_config(config: &AppConfig) -> Arc<dyn CalendarSync> {
    match &config.calendar_sync_webhook_url {
        Some(url) => Arc::new(WebhookCalendarSync::new(url.clone())),
        None => Arc::new(LogOnlyCalendarSync),
    }
}

// ==============================================================================
// DISPATCH
// ==============================================================================

/// Runs both side effects in the background. Failures are logged and dropped;
/// the handles are returned only so callers may await them.
pub fn dispatch_side_effects(
    notifier: Arc<dyn AppointmentNotifier>,
    calendar: Arc<dyn CalendarSync>,
    notice: AppointmentCreatedNotice,
    appointment: Appointment,
) -> [JoinHandle<()>; 2] {
    let notify = tokio::spawn(async move {
        if let Err(e) = notifier.appointment_created(&notice).await {
            warn!("Failed to notify patient of appointment {}: {}", notice.appointment_id, e);
        }
    });

    let sync = tokio::spawn(async move {
        if let Err(e) = calendar.sync_appointment(&appointment, appointment.provider_id).await {
            warn!("Failed to sync appointment {} to calendar: {}", appointment.id, e);
        }
    });

    [notify, sync]
}
