//! Per-machine booking state for one scheduling session.

use chrono::{Duration, NaiveDateTime};
use serde::{Deserialize, Serialize};

use forgeplan_calendar::{ShiftCalendar, TimeSpan, allocate_span};
use forgeplan_core::units::minutes_to_hours;
use forgeplan_core::{DomainError, DomainResult, MachineId, OperationId, ProductionOrderId};
use forgeplan_production::{Machine, Operation, OrderPriority};

/// One booking of an operation on a machine.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledOperation {
    pub order_id: ProductionOrderId,
    pub operation_id: OperationId,
    pub machine_id: MachineId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    /// Working minutes booked (duration plus factored setup).
    pub working_minutes: i64,
    pub exceeds_capacity: bool,
    pub order_priority: OrderPriority,
}

/// Running cursor and cumulative load of a single machine.
#[derive(Debug, Clone, PartialEq)]
pub struct MachineSchedule {
    machine_id: MachineId,
    capacity_minutes: i64,
    calendar: Option<ShiftCalendar>,
    next_available: NaiveDateTime,
    allocated_minutes: i64,
    operations: Vec<ScheduledOperation>,
}

impl MachineSchedule {
    pub fn new(machine: &Machine, calendar: Option<ShiftCalendar>, start: NaiveDateTime) -> Self {
        Self {
            machine_id: machine.id(),
            capacity_minutes: machine.capacity_minutes(),
            calendar,
            next_available: start,
            allocated_minutes: 0,
            operations: Vec::new(),
        }
    }

    pub fn machine_id(&self) -> MachineId {
        self.machine_id
    }

    pub fn calendar(&self) -> Option<&ShiftCalendar> {
        self.calendar.as_ref()
    }

    pub fn next_available(&self) -> NaiveDateTime {
        self.next_available
    }

    pub fn allocated_minutes(&self) -> i64 {
        self.allocated_minutes
    }

    pub fn allocated_hours(&self) -> f64 {
        minutes_to_hours(self.allocated_minutes)
    }

    pub fn capacity_minutes(&self) -> i64 {
        self.capacity_minutes
    }

    pub fn is_over_capacity(&self) -> bool {
        self.allocated_minutes > self.capacity_minutes
    }

    /// Hours booked beyond the weekly capacity, `0.0` when within it.
    pub fn overload_hours(&self) -> f64 {
        minutes_to_hours((self.allocated_minutes - self.capacity_minutes).max(0))
    }

    pub fn operations(&self) -> &[ScheduledOperation] {
        &self.operations
    }

    /// Replace the calendar snapshot (e.g. after a non-working day was added).
    pub fn set_calendar(&mut self, calendar: Option<ShiftCalendar>) {
        self.calendar = calendar;
    }

    /// Book `operation` no earlier than `earliest_start`.
    ///
    /// The cursor moves to the booking's end plus `gap_minutes`. Bookings are
    /// never refused for capacity reasons; `exceeds_capacity` flags them instead.
    pub fn allocate(
        &mut self,
        order_id: ProductionOrderId,
        order_priority: OrderPriority,
        operation: &Operation,
        earliest_start: NaiveDateTime,
        setup_time_factor: f64,
        gap_minutes: u32,
    ) -> DomainResult<ScheduledOperation> {
        let candidate = self.next_available.max(earliest_start);
        let working_minutes = operation.effective_minutes(setup_time_factor);
        if working_minutes <= 0 {
            return Err(DomainError::validation(format!(
                "operation '{}' has no working time to schedule",
                operation.name
            )));
        }

        // The wall-clock end is never earlier than the continuous end.
        let Some(continuous_end) = Duration::try_minutes(working_minutes)
            .and_then(|d| candidate.checked_add_signed(d))
        else {
            return Err(DomainError::validation(format!(
                "operation '{}' runs past the supported date range",
                operation.name
            )));
        };

        let span = match &self.calendar {
            Some(calendar) => allocate_span(calendar, candidate, working_minutes)?,
            None => TimeSpan::new(candidate, continuous_end),
        };

        let Some(next_available) = span
            .end
            .checked_add_signed(Duration::minutes(i64::from(gap_minutes)))
        else {
            return Err(DomainError::validation(format!(
                "operation '{}' runs past the supported date range",
                operation.name
            )));
        };

        self.next_available = next_available;
        self.allocated_minutes = self.allocated_minutes.saturating_add(working_minutes);

        let scheduled = ScheduledOperation {
            order_id,
            operation_id: operation.id,
            machine_id: self.machine_id,
            start: span.start,
            end: span.end,
            working_minutes,
            exceeds_capacity: self.is_over_capacity(),
            order_priority,
        };
        self.operations.push(scheduled);
        Ok(scheduled)
    }
}
