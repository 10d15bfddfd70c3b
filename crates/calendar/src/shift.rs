use std::collections::BTreeSet;

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use serde::{Deserialize, Serialize};

use forgeplan_core::{CalendarId, DomainError, DomainResult};

/// A recurring working shift.
///
/// Weekdays are numbered 0 (Monday) through 6 (Sunday). A shift whose end is
/// earlier than its start runs overnight into the following day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ShiftRecord")]
pub struct Shift {
    name: String,
    start: NaiveTime,
    end: NaiveTime,
    weekdays: BTreeSet<u8>,
}

#[derive(Deserialize)]
struct ShiftRecord {
    name: String,
    start: NaiveTime,
    end: NaiveTime,
    weekdays: BTreeSet<u8>,
}

impl TryFrom<ShiftRecord> for Shift {
    type Error = DomainError;

    fn try_from(record: ShiftRecord) -> Result<Self, Self::Error> {
        Shift::new(record.name, record.start, record.end, record.weekdays)
    }
}

impl Shift {
    pub fn new(
        name: impl Into<String>,
        start: NaiveTime,
        end: NaiveTime,
        weekdays: impl IntoIterator<Item = u8>,
    ) -> DomainResult<Self> {
        let name = name.into();
        if start == end {
            return Err(DomainError::validation(format!(
                "shift '{name}' must not start and end at the same time"
            )));
        }
        let weekdays: BTreeSet<u8> = weekdays.into_iter().collect();
        if weekdays.is_empty() {
            return Err(DomainError::validation(format!(
                "shift '{name}' must apply to at least one weekday"
            )));
        }
        if let Some(bad) = weekdays.iter().find(|d| **d > 6) {
            return Err(DomainError::validation(format!(
                "shift '{name}' has weekday {bad}; expected 0 (Monday) through 6 (Sunday)"
            )));
        }
        Ok(Self {
            name,
            start,
            end,
            weekdays,
        })
    }

    /// Monday through Friday.
    pub fn weekdays_only(name: impl Into<String>, start: NaiveTime, end: NaiveTime) -> DomainResult<Self> {
        Self::new(name, start, end, 0..=4)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn start(&self) -> NaiveTime {
        self.start
    }

    pub fn end(&self) -> NaiveTime {
        self.end
    }

    pub fn weekdays(&self) -> &BTreeSet<u8> {
        &self.weekdays
    }

    pub fn is_overnight(&self) -> bool {
        self.end < self.start
    }

    pub fn runs_on(&self, weekday: Weekday) -> bool {
        self.weekdays.contains(&(weekday.num_days_from_monday() as u8))
    }

    /// Absolute start/end of this shift when it begins on `day`.
    pub fn span_on(&self, day: NaiveDate) -> (NaiveDateTime, NaiveDateTime) {
        let start = day.and_time(self.start);
        let mut end = day.and_time(self.end);
        if end <= start {
            end += Duration::days(1);
        }
        (start, end)
    }
}

/// Working-time definition shared by every machine that references it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CalendarRecord")]
pub struct ShiftCalendar {
    id: CalendarId,
    name: String,
    shifts: Vec<Shift>,
    non_working_days: BTreeSet<NaiveDate>,
}

#[derive(Deserialize)]
struct CalendarRecord {
    id: CalendarId,
    name: String,
    shifts: Vec<Shift>,
    #[serde(default)]
    non_working_days: BTreeSet<NaiveDate>,
}

impl TryFrom<CalendarRecord> for ShiftCalendar {
    type Error = DomainError;

    fn try_from(record: CalendarRecord) -> Result<Self, Self::Error> {
        ShiftCalendar::new(record.id, record.name, record.shifts, record.non_working_days)
    }
}

impl ShiftCalendar {
    pub fn new(
        id: CalendarId,
        name: impl Into<String>,
        shifts: Vec<Shift>,
        non_working_days: impl IntoIterator<Item = NaiveDate>,
    ) -> DomainResult<Self> {
        if shifts.is_empty() {
            return Err(DomainError::validation(
                "a shift calendar must contain at least one shift",
            ));
        }
        Ok(Self {
            id,
            name: name.into(),
            shifts,
            non_working_days: non_working_days.into_iter().collect(),
        })
    }

    pub fn id(&self) -> CalendarId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn shifts(&self) -> &[Shift] {
        &self.shifts
    }

    pub fn non_working_days(&self) -> &BTreeSet<NaiveDate> {
        &self.non_working_days
    }

    /// Returns `false` when the day was already marked.
    pub fn add_non_working_day(&mut self, day: NaiveDate) -> bool {
        self.non_working_days.insert(day)
    }

    pub fn is_non_working(&self, day: NaiveDate) -> bool {
        self.non_working_days.contains(&day)
    }

    /// Shifts that begin on `day`, ordered by start time-of-day.
    ///
    /// Shifts with equal start times keep their configured order.
    pub fn shifts_starting_on(&self, day: NaiveDate) -> Vec<&Shift> {
        if self.is_non_working(day) {
            return Vec::new();
        }
        let weekday = day.weekday();
        let mut matching: Vec<&Shift> = self.shifts.iter().filter(|s| s.runs_on(weekday)).collect();
        matching.sort_by_key(|s| s.start());
        matching
    }
}
