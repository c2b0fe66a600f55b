pub mod blocks;
pub mod booking;
pub mod lifecycle;
pub mod notifications;
pub mod resolver;

pub use blocks::AvailabilityBlockService;
pub use booking::AppointmentBookingService;
pub use lifecycle::AppointmentLifecycleService;
pub use notifications::{
    calendar_from_config, notifier_from_config, AppointmentNotifier, CalendarSync, LogOnlyCalendarSync,
    LogOnlyNotifier, WebhookCalendarSync, WebhookNotifier,
};
pub use resolver::{EntityResolver, LocationSource, ProviderChoice};
