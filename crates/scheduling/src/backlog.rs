//! Backlog selection and ordering for a planning cycle.

use std::cmp::Ordering;

use chrono::{Datelike, Days, NaiveDate};

use forgeplan_production::ProductionOrder;

use crate::options::{MIN_PRIORITY_WEIGHT, PlanningOptions};

/// Inputs of one prioritization pass.
#[derive(Debug, Clone, PartialEq)]
pub struct BacklogCriteria {
    pub priority_weight: f64,
    pub due_date_weight: f64,
    /// `0` keeps every open order regardless of due date.
    pub horizon_days: u32,
    /// `0` keeps every selected order.
    pub max_orders: usize,
    pub today: NaiveDate,
}

impl BacklogCriteria {
    /// Criteria from planning options, with optional per-run overrides.
    pub fn from_options(
        options: &PlanningOptions,
        horizon_days: Option<u32>,
        max_orders: Option<usize>,
        today: NaiveDate,
    ) -> Self {
        Self {
            priority_weight: options.priority_weight.max(MIN_PRIORITY_WEIGHT),
            due_date_weight: options.due_date_weight.max(0.0),
            horizon_days: horizon_days.unwrap_or(options.horizon_days),
            max_orders: max_orders.unwrap_or(options.max_orders_per_cycle),
            today,
        }
    }

    fn horizon_date(&self) -> Option<NaiveDate> {
        if self.horizon_days == 0 {
            return None;
        }
        Some(
            self.today
                .checked_add_days(Days::new(u64::from(self.horizon_days)))
                .unwrap_or(NaiveDate::MAX),
        )
    }

    fn priority_score(&self, order: &ProductionOrder) -> f64 {
        -f64::from(order.priority().ordinal()) * self.priority_weight
    }

    fn due_date_score(&self, order: &ProductionOrder) -> f64 {
        f64::from(order.due_date().num_days_from_ce()) * self.due_date_weight
    }

    fn compare(&self, a: &ProductionOrder, b: &ProductionOrder) -> Ordering {
        self.priority_score(a)
            .total_cmp(&self.priority_score(b))
            .then_with(|| self.due_date_score(a).total_cmp(&self.due_date_score(b)))
            .then_with(|| a.created_at().cmp(&b.created_at()))
    }
}

/// Open orders in the sequence they should be scheduled.
///
/// Terminal orders are dropped. With a horizon, orders due after it are
/// dropped unless they are High or Critical. Orders sort by weighted
/// priority (highest first), then weighted due date, then creation time.
pub fn prioritize<'a>(
    orders: impl IntoIterator<Item = &'a ProductionOrder>,
    criteria: &BacklogCriteria,
) -> Vec<&'a ProductionOrder> {
    let horizon = criteria.horizon_date();
    let mut backlog: Vec<&ProductionOrder> = orders
        .into_iter()
        .filter(|o| !o.status().is_terminal())
        .filter(|o| match horizon {
            Some(limit) => o.due_date() <= limit || o.priority().is_urgent(),
            None => true,
        })
        .collect();

    backlog.sort_by(|a, b| criteria.compare(a, b));
    if criteria.max_orders > 0 {
        backlog.truncate(criteria.max_orders);
    }
    backlog
}
