//! Request payloads accepted by `PlanningService`.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use forgeplan_core::{CalendarId, CustomerId, ItemId};
use forgeplan_inventory::StockPolicy;
use forgeplan_production::{Operation, OrderPriority, Process};
use forgeplan_suppliers::ContactInfo;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMachine {
    pub name: String,
    pub processes: Vec<Process>,
    pub capacity_hours_per_week: f64,
    pub calendar_id: Option<CalendarId>,
    pub location: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInventoryItem {
    pub name: String,
    pub unit_of_measure: String,
    pub on_hand: f64,
    pub policy: StockPolicy,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    pub contact: Option<ContactInfo>,
    pub processes: Vec<Process>,
    pub material_item_ids: Vec<ItemId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewEvaluation {
    pub quality_score: f64,
    pub delivery_reliability_score: f64,
    pub communication_score: f64,
    /// Defaults to today.
    pub evaluated_on: Option<NaiveDate>,
    pub notes: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProductionOrder {
    pub customer_id: CustomerId,
    pub reference: String,
    pub due_date: NaiveDate,
    pub priority: OrderPriority,
    pub operations: Vec<Operation>,
    pub remarks: Option<String>,
}

/// Overrides for one backlog run; `None` falls back to the planning options.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BacklogRun {
    /// Defaults to today at the configured start time.
    pub start_reference: Option<NaiveDateTime>,
    pub horizon_days: Option<u32>,
    pub max_orders: Option<usize>,
}
