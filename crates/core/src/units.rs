//! Hour/minute conversion at the API edge.
//!
//! Planning arithmetic runs on whole minutes so long sessions do not drift;
//! hours only appear in master data and reports.

/// Convert fractional hours to whole minutes (rounded to the nearest minute).
pub fn hours_to_minutes(hours: f64) -> i64 {
    (hours * 60.0).round() as i64
}

pub fn minutes_to_hours(minutes: i64) -> f64 {
    minutes as f64 / 60.0
}
