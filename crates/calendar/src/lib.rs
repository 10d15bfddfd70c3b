//! Shift calendars and calendar-aware time allocation.
//!
//! Pure domain logic: a calendar describes when work may happen, the window
//! functions answer "when is the next working time" and "when does N minutes
//! of work finish if started here".

pub mod shift;
pub mod window;

pub use shift::{Shift, ShiftCalendar};
pub use window::{SEARCH_HORIZON_DAYS, TimeSpan, allocate_span, next_shift_window};
