pub mod availability;
pub mod business_hours;
pub mod conflict;
pub mod scanner;
pub mod schedule;
pub mod slots;

pub use availability::{AvailabilityService, AvailabilityTarget};
pub use business_hours::{fits_business_hours, LocalWindow};
pub use conflict::{ConflictDataProvider, ConflictScope};
pub use scanner::{MultiDayScanner, ScanOptions};
pub use schedule::{parse_timezone, ScheduleResolver};
pub use slots::SlotEnumerator;
