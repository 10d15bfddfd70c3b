//! Shift window resolution and calendar-aware duration allocation.

use chrono::{Days, Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use forgeplan_core::{DomainError, DomainResult};

use crate::shift::ShiftCalendar;

/// How many days ahead the resolver scans before giving up.
///
/// Bounds the search so a calendar with no reachable shift terminates.
pub const SEARCH_HORIZON_DAYS: u64 = 60;

/// A half-open interval `[start, end)` of wall-clock time.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSpan {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl TimeSpan {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Self {
        Self { start, end }
    }

    /// Elapsed wall-clock minutes, including any non-working gaps.
    pub fn elapsed_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }
}

/// Find the earliest working window at or after `reference`.
///
/// The returned window starts at `max(reference, shift start)` and ends at the
/// shift end (rolled into the next day for overnight shifts).
pub fn next_shift_window(calendar: &ShiftCalendar, reference: NaiveDateTime) -> DomainResult<TimeSpan> {
    let first_day = reference.date();
    for offset in 0..SEARCH_HORIZON_DAYS {
        let Some(day) = first_day.checked_add_days(Days::new(offset)) else {
            break;
        };
        for shift in calendar.shifts_starting_on(day) {
            let (shift_start, shift_end) = shift.span_on(day);
            if shift_end <= reference {
                continue;
            }
            return Ok(TimeSpan::new(shift_start.max(reference), shift_end));
        }
    }
    Err(DomainError::capacity_unavailable(format!(
        "calendar '{}' has no shift window within {SEARCH_HORIZON_DAYS} days of {reference}",
        calendar.name()
    )))
}

/// Spread `duration_minutes` of work over consecutive shift windows.
///
/// The span starts at the first window's effective start and ends where the
/// remaining work reaches zero, so it reports wall-clock time (nights,
/// weekends and holidays crossed are included).
pub fn allocate_span(
    calendar: &ShiftCalendar,
    reference: NaiveDateTime,
    duration_minutes: i64,
) -> DomainResult<TimeSpan> {
    if duration_minutes <= 0 {
        return Err(DomainError::validation("duration must be positive"));
    }

    let mut remaining = duration_minutes;
    let mut cursor = reference;
    let mut start: Option<NaiveDateTime> = None;

    loop {
        let window = next_shift_window(calendar, cursor)?;
        cursor = window.start;

        let available = window.elapsed_minutes();
        if available <= 0 {
            cursor = window.end + Duration::minutes(1);
            continue;
        }

        let first = *start.get_or_insert(cursor);
        let take = available.min(remaining);
        cursor += Duration::minutes(take);
        remaining -= take;

        if remaining == 0 {
            return Ok(TimeSpan::new(first, cursor));
        }
        cursor = window.end + Duration::minutes(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shift::Shift;
    use chrono::{Datelike, NaiveDate, NaiveTime};
    use forgeplan_core::CalendarId;
    use proptest::prelude::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn at(date: NaiveDate, h: u32, m: u32) -> NaiveDateTime {
        date.and_time(t(h, m))
    }

    /// 2024-03-04 is a Monday.
    fn monday() -> NaiveDate {
        d(2024, 3, 4)
    }

    fn early_shift_calendar() -> ShiftCalendar {
        let early = Shift::weekdays_only("early", t(6, 0), t(14, 0)).unwrap();
        ShiftCalendar::new(CalendarId::new(), "single shift", vec![early], []).unwrap()
    }

    #[test]
    fn window_starts_at_reference_inside_a_shift() {
        let calendar = early_shift_calendar();
        let window = next_shift_window(&calendar, at(monday(), 9, 30)).unwrap();
        assert_eq!(window, TimeSpan::new(at(monday(), 9, 30), at(monday(), 14, 0)));
    }

    #[test]
    fn window_before_shift_snaps_to_shift_start() {
        let calendar = early_shift_calendar();
        let window = next_shift_window(&calendar, at(monday(), 3, 0)).unwrap();
        assert_eq!(window.start, at(monday(), 6, 0));
    }

    #[test]
    fn window_after_shift_moves_to_next_working_day() {
        let calendar = early_shift_calendar();
        let friday = d(2024, 3, 8);
        let window = next_shift_window(&calendar, at(friday, 15, 0)).unwrap();
        assert_eq!(window.start, at(d(2024, 3, 11), 6, 0));
    }

    #[test]
    fn non_working_day_is_skipped() {
        let mut calendar = early_shift_calendar();
        calendar.add_non_working_day(monday());
        let window = next_shift_window(&calendar, at(monday(), 6, 0)).unwrap();
        assert_eq!(window.start, at(d(2024, 3, 5), 6, 0));
    }

    #[test]
    fn overnight_shift_window_spans_midnight() {
        let night = Shift::new("night", t(22, 0), t(6, 0), 0..=6).unwrap();
        let calendar = ShiftCalendar::new(CalendarId::new(), "nights", vec![night], []).unwrap();
        let window = next_shift_window(&calendar, at(monday(), 23, 0)).unwrap();
        assert_eq!(window, TimeSpan::new(at(monday(), 23, 0), at(d(2024, 3, 5), 6, 0)));
    }

    #[test]
    fn no_window_within_horizon_is_capacity_unavailable() {
        let mut calendar = early_shift_calendar();
        for offset in 0..SEARCH_HORIZON_DAYS {
            calendar.add_non_working_day(monday().checked_add_days(Days::new(offset)).unwrap());
        }
        let err = next_shift_window(&calendar, at(monday(), 6, 0)).unwrap_err();
        assert!(matches!(err, DomainError::CapacityUnavailable(_)));
    }

    #[test]
    fn allocation_within_one_window() {
        let calendar = early_shift_calendar();
        let span = allocate_span(&calendar, at(monday(), 6, 0), 3 * 60).unwrap();
        assert_eq!(span, TimeSpan::new(at(monday(), 6, 0), at(monday(), 9, 0)));
    }

    #[test]
    fn allocation_spills_into_the_next_day() {
        let calendar = early_shift_calendar();
        let span = allocate_span(&calendar, at(monday(), 6, 0), 10 * 60).unwrap();
        assert_eq!(span, TimeSpan::new(at(monday(), 6, 0), at(d(2024, 3, 5), 8, 0)));
        // Wall-clock span is larger than the 10 working hours requested.
        assert!(span.elapsed_minutes() > 10 * 60);
    }

    #[test]
    fn allocation_crosses_the_weekend() {
        let calendar = early_shift_calendar();
        let friday = d(2024, 3, 8);
        let span = allocate_span(&calendar, at(friday, 12, 0), 4 * 60).unwrap();
        assert_eq!(span, TimeSpan::new(at(friday, 12, 0), at(d(2024, 3, 11), 8, 0)));
    }

    #[test]
    fn allocation_uses_the_second_shift_of_the_day() {
        let early = Shift::weekdays_only("early", t(6, 0), t(14, 0)).unwrap();
        let late = Shift::weekdays_only("late", t(14, 0), t(22, 0)).unwrap();
        let calendar =
            ShiftCalendar::new(CalendarId::new(), "two-shift", vec![early, late], []).unwrap();
        let span = allocate_span(&calendar, at(monday(), 12, 0), 4 * 60).unwrap();
        // 2h in the early shift, then the cursor moves one minute past 14:00
        // and the late shift supplies the rest.
        assert_eq!(span.start, at(monday(), 12, 0));
        assert_eq!(span.end, at(monday(), 16, 1));
    }

    #[test]
    fn non_positive_duration_is_rejected() {
        let calendar = early_shift_calendar();
        for minutes in [0, -30] {
            let err = allocate_span(&calendar, at(monday(), 6, 0), minutes).unwrap_err();
            assert!(matches!(err, DomainError::Validation(_)));
        }
    }

    proptest! {
        #![proptest_config(ProptestConfig {
            cases: 256,
            ..ProptestConfig::default()
        })]

        /// Property: a resolved window never lands on a non-working date or on a
        /// weekday no shift covers.
        #[test]
        fn window_never_on_non_working_or_uncovered_day(
            day_offset in 0u64..28,
            hour in 0u32..24,
            holidays in prop::collection::btree_set(0u64..28, 0..10),
        ) {
            let base = monday();
            let early = Shift::weekdays_only("early", t(6, 0), t(14, 0)).unwrap();
            let non_working = holidays
                .iter()
                .map(|o| base.checked_add_days(Days::new(*o)).unwrap());
            let calendar =
                ShiftCalendar::new(CalendarId::new(), "prop", vec![early], non_working).unwrap();

            let reference = at(base.checked_add_days(Days::new(day_offset)).unwrap(), hour, 0);
            let window = next_shift_window(&calendar, reference).unwrap();

            prop_assert!(window.start >= reference);
            prop_assert!(window.end > window.start);
            prop_assert!(!calendar.is_non_working(window.start.date()));
            prop_assert!(window.start.date().weekday().num_days_from_monday() < 5);
        }
    }
}
