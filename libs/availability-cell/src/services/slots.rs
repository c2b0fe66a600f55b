// libs/availability-cell/src/services/slots.rs
use std::collections::BTreeSet;

use chrono::{DateTime, Duration, NaiveDate, Utc};
use shared_models::TimeWindow;

use crate::models::{ConflictData, ResolvedSchedule, MIN_DURATION_MINUTES, SLOT_GRANULARITY_MINUTES};
use crate::services::business_hours::fits_business_hours;
use crate::services::conflict::ConflictScope;

/// Hours before the target date's UTC midnight covered by the scan (UTC+14 zones).
const SCAN_LEAD_HOURS: i64 = 14;
/// Hours after the next UTC midnight covered by the scan (UTC-12 zones).
const SCAN_TAIL_HOURS: i64 = 12;

/// Produces the bookable local start times for one calendar date.
pub struct SlotEnumerator;

impl SlotEnumerator {
    /// Real-time range holding every instant whose local date is `date` in any
    /// offset from UTC-12:00 to UTC+14:00. `None` at the edges of the calendar.
    pub fn scan_window(date: NaiveDate) -> Option<TimeWindow> {
        let midnight = date.and_hms_opt(0, 0, 0)?.and_utc();
        Some(TimeWindow {
            start: midnight.checked_sub_signed(Duration::hours(SCAN_LEAD_HOURS))?,
            end: midnight.checked_add_signed(Duration::hours(24 + SCAN_TAIL_HOURS))?,
        })
    }

    /// Range to load conflict data for: the scan window of every date in
    /// `first..=last`, widened so padded appointments just outside still count.
    pub fn fetch_window(first: NaiveDate, last: NaiveDate, resolved: &ResolvedSchedule) -> Option<TimeWindow> {
        let window = TimeWindow {
            start: Self::scan_window(first)?.start,
            end: Self::scan_window(last)?.end,
        };
        Some(window.padded(resolved.buffer_minutes))
    }

    pub fn effective_duration(duration_minutes: i64) -> i64 {
        duration_minutes.max(MIN_DURATION_MINUTES)
    }

    /// Ascending, de-duplicated `HH:MM` strings. Candidates must start on `date`
    /// locally, fit business hours, clear `scope`, and start strictly after `now`.
    pub fn enumerate(
        date: NaiveDate,
        resolved: &ResolvedSchedule,
        duration_minutes: i64,
        conflicts: &ConflictData,
        scope: &ConflictScope,
        now: DateTime<Utc>,
    ) -> Vec<String> {
        let duration = Duration::minutes(Self::effective_duration(duration_minutes));
        let step = Duration::minutes(SLOT_GRANULARITY_MINUTES);
        let Some(scan) = Self::scan_window(date) else {
            return Vec::new();
        };

        let mut slots = BTreeSet::new();
        let mut candidate = scan.start;

        while candidate < scan.end {
            let local = candidate.with_timezone(&resolved.timezone);
            let Some(end) = candidate.checked_add_signed(duration) else {
                break;
            };

            if local.date_naive() == date
                && candidate > now
                && fits_business_hours(candidate, end, &resolved.schedule, resolved.timezone)
                && scope.first_conflict(conflicts, &TimeWindow { start: candidate, end }).is_none()
            {
                slots.insert(local.format("%H:%M").to_string());
            }

            candidate += step;
        }

        slots.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Weekday};
    use chrono_tz::Tz;
    use shared_models::WeeklySchedule;
    use shared_utils::test_utils::{schedule_on, WEEKDAYS};
    use uuid::Uuid;

    use crate::models::ScheduleSource;

    fn resolved(timezone: Tz, schedule: WeeklySchedule) -> ResolvedSchedule {
        ResolvedSchedule {
            schedule,
            timezone,
            buffer_minutes: 0,
            source: ScheduleSource::Location,
        }
    }

    fn long_ago() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2000, 1, 1, 0, 0, 0).unwrap()
    }

    #[test]
    fn scan_window_covers_extreme_offsets() {
        let date = NaiveDate::from_ymd_opt(2030, 1, 10).unwrap();
        let scan = SlotEnumerator::scan_window(date).unwrap();

        let kiritimati: Tz = "Pacific/Kiritimati".parse().unwrap();
        let first = kiritimati
            .from_local_datetime(&date.and_hms_opt(0, 0, 0).unwrap())
            .single()
            .unwrap();
        assert!(scan.start <= first.with_timezone(&Utc));

        let baker: Tz = "Etc/GMT+12".parse().unwrap();
        let last = baker
            .from_local_datetime(&date.and_hms_opt(23, 45, 0).unwrap())
            .single()
            .unwrap();
        assert!(last.with_timezone(&Utc) < scan.end);
        assert!(scan.end - scan.start >= Duration::hours(48));
    }

    #[test]
    fn half_hour_offset_zone_keeps_quarter_grid() {
        let kolkata: Tz = "Asia/Kolkata".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2030, 1, 10).unwrap();
        let slots = SlotEnumerator::enumerate(
            date,
            &resolved(kolkata, schedule_on(&WEEKDAYS, "09:00", "10:00")),
            30,
            &ConflictData::default(),
            &ConflictScope::new(Uuid::new_v4(), None, 0),
            long_ago(),
        );

        assert_eq!(slots, vec!["09:00", "09:15", "09:30"]);
    }

    #[test]
    fn past_candidates_are_dropped() {
        let utc: Tz = "UTC".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2030, 1, 10).unwrap();
        let now = Utc.with_ymd_and_hms(2030, 1, 10, 9, 30, 0).unwrap();

        let slots = SlotEnumerator::enumerate(
            date,
            &resolved(utc, schedule_on(&WEEKDAYS, "09:00", "10:30")),
            30,
            &ConflictData::default(),
            &ConflictScope::new(Uuid::new_v4(), None, 0),
            now,
        );

        // 09:30 itself is not strictly after now.
        assert_eq!(slots, vec!["09:45", "10:00"]);
    }

    #[test]
    fn short_durations_are_clamped() {
        let utc: Tz = "UTC".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2030, 1, 10).unwrap();
        let schedule = WeeklySchedule::new().with_range(
            Weekday::Thu,
            shared_models::TimeRange::parse("09:00", "09:20").unwrap(),
        );

        let slots = SlotEnumerator::enumerate(
            date,
            &resolved(utc, schedule),
            1,
            &ConflictData::default(),
            &ConflictScope::new(Uuid::new_v4(), None, 0),
            long_ago(),
        );

        // A 5 minute floor still lets 09:15 fit before 09:20.
        assert_eq!(slots, vec!["09:00", "09:15"]);
    }

    #[test]
    fn fall_back_repeated_hour_is_listed_once() {
        // 2030-11-03 01:00-02:00 occurs twice in New York.
        let new_york: Tz = "America/New_York".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2030, 11, 3).unwrap();
        let schedule = schedule_on(&[Weekday::Sun], "00:00", "03:00");

        let slots = SlotEnumerator::enumerate(
            date,
            &resolved(new_york, schedule),
            30,
            &ConflictData::default(),
            &ConflictScope::new(Uuid::new_v4(), None, 0),
            long_ago(),
        );

        assert_eq!(slots.len(), 11);
        assert_eq!(slots.first().map(String::as_str), Some("00:00"));
        assert_eq!(slots.last().map(String::as_str), Some("02:30"));
        assert!(slots.windows(2).all(|pair| pair[0] < pair[1]));
    }

    #[test]
    fn spring_forward_gap_is_never_listed() {
        // 2030-03-10 02:00-03:00 does not exist in New York.
        let new_york: Tz = "America/New_York".parse().unwrap();
        let date = NaiveDate::from_ymd_opt(2030, 3, 10).unwrap();
        let schedule = schedule_on(&[Weekday::Sun], "01:00", "04:00");

        let slots = SlotEnumerator::enumerate(
            date,
            &resolved(new_york, schedule),
            30,
            &ConflictData::default(),
            &ConflictScope::new(Uuid::new_v4(), None, 0),
            long_ago(),
        );

        assert_eq!(
            slots,
            vec!["01:00", "01:15", "01:30", "01:45", "03:00", "03:15", "03:30"]
        );
    }

    #[test]
    fn calendar_edges_have_no_scan_window() {
        assert!(SlotEnumerator::scan_window(NaiveDate::MAX).is_none());
        assert!(SlotEnumerator::scan_window(NaiveDate::MIN).is_none());

        let utc: Tz = "UTC".parse().unwrap();
        let slots = SlotEnumerator::enumerate(
            NaiveDate::MAX,
            &resolved(utc, schedule_on(&WEEKDAYS, "09:00", "10:00")),
            30,
            &ConflictData::default(),
            &ConflictScope::new(Uuid::new_v4(), None, 0),
            long_ago(),
        );
        assert!(slots.is_empty());
    }
}
