use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use forgeplan_core::{ItemId, PurchaseOrderId, SupplierId};

/// Purchase order status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PurchaseOrderStatus {
    /// Computed draft, not committed.
    Planned,
    /// Committed to the purchase-order store.
    Open,
}

impl PurchaseOrderStatus {
    pub fn label(self) -> &'static str {
        match self {
            PurchaseOrderStatus::Planned => "Planned",
            PurchaseOrderStatus::Open => "Open",
        }
    }
}

impl core::fmt::Display for PurchaseOrderStatus {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.label())
    }
}

/// A single-line purchase of one material from one supplier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOrder {
    pub id: PurchaseOrderId,
    pub supplier_id: SupplierId,
    pub supplier_name: String,
    pub item_id: ItemId,
    pub quantity: f64,
    pub expected_receipt: NaiveDate,
    pub status: PurchaseOrderStatus,
    pub created_at: DateTime<Utc>,
    pub notes: String,
}

impl PurchaseOrder {
    pub fn is_committed(&self) -> bool {
        self.status == PurchaseOrderStatus::Open
    }
}
