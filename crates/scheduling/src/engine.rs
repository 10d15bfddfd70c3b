//! Scheduling engine: books an order's operations onto machines in sequence.

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use forgeplan_calendar::ShiftCalendar;
use forgeplan_core::units::minutes_to_hours;
use forgeplan_core::{Aggregate, CalendarId, DomainError, DomainResult, MachineId, ProductionOrderId};
use forgeplan_production::{
    ChangeStatus, Machine, OperationAssignment, OrderStatus, ProductionOrder,
    ProductionOrderCommand, RecordSchedule,
};

use crate::backlog::{BacklogCriteria, prioritize};
use crate::machine_schedule::{MachineSchedule, ScheduledOperation};
use crate::options::PlanningOptions;
use crate::selector::{eligible_machines, least_loaded};

/// Read access to the master data the engine plans against.
pub trait PlanningCatalog {
    /// Every registered machine, in registration order.
    fn machines(&self) -> Vec<Machine>;

    fn calendar(&self, calendar_id: CalendarId) -> Option<ShiftCalendar>;
}

/// Result of scheduling a single order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleSummary {
    pub order_id: ProductionOrderId,
    pub scheduled_operations: Vec<ScheduledOperation>,
    /// Cumulative session load in hours of every machine this order touched.
    pub machine_loads: BTreeMap<MachineId, f64>,
    /// Hours above weekly capacity, only for touched machines that exceed it.
    pub overloaded_machines: BTreeMap<MachineId, f64>,
}

impl ScheduleSummary {
    /// Working hours booked for this order.
    pub fn total_hours(&self) -> f64 {
        minutes_to_hours(self.scheduled_operations.iter().map(|s| s.working_minutes).sum())
    }

    pub fn has_overload(&self) -> bool {
        !self.overloaded_machines.is_empty()
    }
}

/// A summary plus the order snapshot carrying the recorded schedule.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleOutcome {
    pub summary: ScheduleSummary,
    pub order: ProductionOrder,
}

/// Parameters of one backlog run.
#[derive(Debug, Clone, PartialEq)]
pub struct BacklogRequest {
    pub start_reference: NaiveDateTime,
    /// Overrides `PlanningOptions::horizon_days` when set.
    pub horizon_days: Option<u32>,
    /// Overrides `PlanningOptions::max_orders_per_cycle` when set.
    pub max_orders: Option<usize>,
    pub today: NaiveDate,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BacklogFailure {
    pub order_id: ProductionOrderId,
    pub reference: String,
    pub error: DomainError,
}

/// Outcome of a backlog run, in processing order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BacklogReport {
    pub outcomes: Vec<ScheduleOutcome>,
    pub failures: Vec<BacklogFailure>,
}

impl BacklogReport {
    pub fn summary(&self, order_id: ProductionOrderId) -> Option<&ScheduleSummary> {
        self.outcomes
            .iter()
            .map(|o| &o.summary)
            .find(|s| s.order_id == order_id)
    }

    pub fn summaries(&self) -> impl Iterator<Item = &ScheduleSummary> {
        self.outcomes.iter().map(|o| &o.summary)
    }

    pub fn scheduled_order_ids(&self) -> Vec<ProductionOrderId> {
        self.summaries().map(|s| s.order_id).collect()
    }

    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Holds machine schedule state across a planning session.
#[derive(Debug, Clone, Default)]
pub struct SchedulingEngine {
    options: PlanningOptions,
    schedules: HashMap<MachineId, MachineSchedule>,
}

impl SchedulingEngine {
    pub fn new(options: PlanningOptions) -> Self {
        Self {
            options: options.normalized(),
            schedules: HashMap::new(),
        }
    }

    pub fn options(&self) -> &PlanningOptions {
        &self.options
    }

    /// Replace the options and start a fresh session.
    pub fn set_options(&mut self, options: PlanningOptions) {
        self.options = options.normalized();
        self.reset();
    }

    /// Drop all machine schedule state.
    pub fn reset(&mut self) {
        self.schedules.clear();
    }

    pub fn schedule(&self, machine_id: MachineId) -> Option<&MachineSchedule> {
        self.schedules.get(&machine_id)
    }

    /// `start_reference` at the configured default start time of `day`.
    pub fn default_start_on(&self, day: NaiveDate) -> NaiveDateTime {
        day.and_time(self.options.default_start_time)
    }

    /// Push an updated calendar into every live schedule that uses it.
    pub fn refresh_calendar(&mut self, calendar: &ShiftCalendar) {
        for schedule in self.schedules.values_mut() {
            if schedule.calendar().is_some_and(|c| c.id() == calendar.id()) {
                schedule.set_calendar(Some(calendar.clone()));
            }
        }
    }

    /// Rebind a live machine schedule to another calendar (or none).
    pub fn assign_calendar(&mut self, machine_id: MachineId, calendar: Option<ShiftCalendar>) {
        if let Some(schedule) = self.schedules.get_mut(&machine_id) {
            schedule.set_calendar(calendar);
        }
    }

    /// Schedule every operation of `order`, in sequence, from `start_reference`.
    ///
    /// All-or-nothing: on failure every machine schedule is restored to its
    /// state before the call and the caller's order is left untouched.
    pub fn schedule_order<C: PlanningCatalog + ?Sized>(
        &mut self,
        catalog: &C,
        order: &ProductionOrder,
        start_reference: NaiveDateTime,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<ScheduleOutcome> {
        if !order.is_created() {
            return Err(DomainError::not_found(format!("production order {}", order.id_typed())));
        }
        if order.status().is_terminal() {
            return Err(DomainError::validation(format!(
                "production order {} is {} and cannot be scheduled",
                order.reference(),
                order.status()
            )));
        }

        let snapshot = self.schedules.clone();
        match self.try_schedule_order(catalog, order, start_reference, occurred_at) {
            Ok(outcome) => {
                tracing::info!(
                    order = %order.reference(),
                    operations = outcome.summary.scheduled_operations.len(),
                    overloaded = outcome.summary.overloaded_machines.len(),
                    "order scheduled"
                );
                Ok(outcome)
            }
            Err(err) => {
                self.schedules = snapshot;
                tracing::warn!(order = %order.reference(), error = %err, "order scheduling failed");
                Err(err)
            }
        }
    }

    fn try_schedule_order<C: PlanningCatalog + ?Sized>(
        &mut self,
        catalog: &C,
        order: &ProductionOrder,
        start_reference: NaiveDateTime,
        occurred_at: DateTime<Utc>,
    ) -> DomainResult<ScheduleOutcome> {
        let machines = catalog.machines();
        let setup_factor = self.options.setup_time_factor;
        let gap_minutes = self.options.gap_between_operations_minutes;

        let mut earliest_start = start_reference;
        let mut scheduled_operations = Vec::with_capacity(order.operations().len());

        for plan in order.operations() {
            let operation = plan.operation();
            let candidates = eligible_machines(&machines, operation.process)?;

            for machine in &candidates {
                self.schedules.entry(machine.id()).or_insert_with(|| {
                    let calendar = machine.calendar_id().and_then(|id| catalog.calendar(id));
                    MachineSchedule::new(machine, calendar, start_reference)
                });
            }

            let schedules = &self.schedules;
            let chosen = least_loaded(&candidates, |id| {
                schedules.get(&id).map_or(0, MachineSchedule::allocated_minutes)
            })
            .ok_or_else(|| {
                DomainError::capacity_unavailable(format!(
                    "no machine available for process {}",
                    operation.process
                ))
            })?;

            let schedule = self.schedules.get_mut(&chosen.id()).ok_or_else(|| {
                DomainError::invariant(format!("machine schedule for {} missing", chosen.name()))
            })?;
            let scheduled = schedule.allocate(
                order.id_typed(),
                order.priority(),
                operation,
                earliest_start,
                setup_factor,
                gap_minutes,
            )?;

            tracing::debug!(
                order = %order.reference(),
                operation = %operation.name,
                machine = %chosen.name(),
                start = %scheduled.start,
                end = %scheduled.end,
                "operation allocated"
            );

            earliest_start = scheduled.end + Duration::minutes(i64::from(gap_minutes));
            scheduled_operations.push(scheduled);
        }

        let mut updated = order.clone();
        let assignments = scheduled_operations
            .iter()
            .map(|s| OperationAssignment {
                operation_id: s.operation_id,
                machine_id: s.machine_id,
                start: s.start,
                end: s.end,
            })
            .collect();
        updated.execute(&ProductionOrderCommand::RecordSchedule(RecordSchedule {
            order_id: order.id_typed(),
            assignments,
            occurred_at,
        }))?;

        if self.options.auto_release_orders && updated.status() == OrderStatus::Planned {
            updated.execute(&ProductionOrderCommand::ChangeStatus(ChangeStatus {
                order_id: order.id_typed(),
                status: OrderStatus::Released,
                occurred_at,
            }))?;
        }

        let summary = self.summarize(order.id_typed(), scheduled_operations);
        Ok(ScheduleOutcome {
            summary,
            order: updated,
        })
    }

    fn summarize(
        &self,
        order_id: ProductionOrderId,
        scheduled_operations: Vec<ScheduledOperation>,
    ) -> ScheduleSummary {
        let mut machine_loads = BTreeMap::new();
        let mut overloaded_machines = BTreeMap::new();

        for machine_id in scheduled_operations.iter().map(|s| s.machine_id) {
            let Some(schedule) = self.schedules.get(&machine_id) else {
                continue;
            };
            machine_loads.insert(machine_id, schedule.allocated_hours());
            if schedule.is_over_capacity() {
                overloaded_machines.insert(machine_id, schedule.overload_hours());
            }
        }

        ScheduleSummary {
            order_id,
            scheduled_operations,
            machine_loads,
            overloaded_machines,
        }
    }

    /// Reset the session, then schedule the prioritized backlog in order.
    ///
    /// Later orders see the load booked by earlier ones. A failing order is
    /// recorded in the report and the run continues with the next order.
    pub fn schedule_backlog<C: PlanningCatalog + ?Sized>(
        &mut self,
        catalog: &C,
        orders: &[ProductionOrder],
        request: &BacklogRequest,
    ) -> BacklogReport {
        self.reset();

        let criteria = BacklogCriteria::from_options(
            &self.options,
            request.horizon_days,
            request.max_orders,
            request.today,
        );
        let backlog = prioritize(orders, &criteria);

        let mut report = BacklogReport::default();
        for order in backlog {
            match self.schedule_order(catalog, order, request.start_reference, request.occurred_at) {
                Ok(outcome) => report.outcomes.push(outcome),
                Err(error) => report.failures.push(BacklogFailure {
                    order_id: order.id_typed(),
                    reference: order.reference().to_string(),
                    error,
                }),
            }
        }

        tracing::info!(
            scheduled = report.outcomes.len(),
            failed = report.failures.len(),
            "backlog run finished"
        );
        report
    }

    /// Every planned operation across `orders`, earliest start first.
    ///
    /// `limit == 0` returns all of them. Capacity flags are not recomputed
    /// here and always read `false`.
    pub fn upcoming_operations<'a>(
        &self,
        orders: impl IntoIterator<Item = &'a ProductionOrder>,
        limit: usize,
    ) -> Vec<ScheduledOperation> {
        let mut operations: Vec<ScheduledOperation> = orders
            .into_iter()
            .flat_map(|order| {
                order.operations().iter().filter_map(move |plan| {
                    plan.assignment().map(|a| ScheduledOperation {
                        order_id: order.id_typed(),
                        operation_id: a.operation_id,
                        machine_id: a.machine_id,
                        start: a.start,
                        end: a.end,
                        working_minutes: plan
                            .operation()
                            .effective_minutes(self.options.setup_time_factor),
                        exceeds_capacity: false,
                        order_priority: order.priority(),
                    })
                })
            })
            .collect();

        operations.sort_by_key(|s| s.start);
        if limit > 0 {
            operations.truncate(limit);
        }
        operations
    }
}
