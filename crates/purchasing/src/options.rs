use serde::{Deserialize, Serialize};

/// Purchasing tunables.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcurementOptions {
    /// Scales the reorder recommendation.
    pub reorder_multiplier: f64,
    /// Count the gap below safety stock as a shortage.
    pub include_safety_stock_gap: bool,
    /// Days taken off the lead time for High and Critical orders.
    pub expedite_high_priority_days: u32,
    /// Lead time for items that have none of their own.
    pub default_lead_time_days: u32,
    /// Commit planned purchases to the purchase-order store.
    pub auto_create_orders: bool,
}

impl Default for ProcurementOptions {
    fn default() -> Self {
        Self {
            reorder_multiplier: 1.0,
            include_safety_stock_gap: true,
            expedite_high_priority_days: 0,
            default_lead_time_days: 0,
            auto_create_orders: false,
        }
    }
}

/// Per-call replacements for individual option values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProcurementOverrides {
    pub auto_create: Option<bool>,
    pub reorder_multiplier: Option<f64>,
    pub include_safety_stock: Option<bool>,
    pub expedite_days: Option<u32>,
}

impl ProcurementOptions {
    /// Clamp the multiplier to `>= 0`.
    pub fn normalized(mut self) -> Self {
        self.reorder_multiplier = if self.reorder_multiplier.is_finite() {
            self.reorder_multiplier.max(0.0)
        } else {
            0.0
        };
        self
    }

    /// These options with `overrides` applied, normalized.
    pub fn with_overrides(&self, overrides: &ProcurementOverrides) -> Self {
        Self {
            reorder_multiplier: overrides.reorder_multiplier.unwrap_or(self.reorder_multiplier),
            include_safety_stock_gap: overrides
                .include_safety_stock
                .unwrap_or(self.include_safety_stock_gap),
            expedite_high_priority_days: overrides
                .expedite_days
                .unwrap_or(self.expedite_high_priority_days),
            default_lead_time_days: self.default_lead_time_days,
            auto_create_orders: overrides.auto_create.unwrap_or(self.auto_create_orders),
        }
        .normalized()
    }
}
