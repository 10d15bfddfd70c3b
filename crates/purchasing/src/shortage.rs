//! Material shortage analysis for a production order.

use serde::{Deserialize, Serialize};

use forgeplan_core::{ItemId, SupplierId};
use forgeplan_inventory::InventoryItem;
use forgeplan_production::ProductionOrder;
use forgeplan_suppliers::{Supplier, recommend_for_item};

use crate::options::ProcurementOptions;

/// Name reported for requirements whose item is not in inventory.
pub const UNKNOWN_ITEM_NAME: &str = "unknown";

/// Read access to inventory and supplier master data.
pub trait MaterialCatalog {
    fn item(&self, item_id: ItemId) -> Option<InventoryItem>;

    fn supplier(&self, supplier_id: SupplierId) -> Option<Supplier>;

    /// Every registered supplier, in registration order.
    fn suppliers(&self) -> Vec<Supplier>;

    /// Highest-rated supplier linked to `item_id`.
    fn recommend_supplier(&self, item_id: ItemId) -> Option<Supplier> {
        let suppliers = self.suppliers();
        recommend_for_item(&suppliers, item_id).cloned()
    }
}

/// Purchasing action needed for one material of an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialShortage {
    pub item_id: ItemId,
    pub name: String,
    pub required_quantity: f64,
    /// On-hand stock after the order consumes its requirement.
    pub projected_on_hand: f64,
    pub shortage: f64,
    pub reorder_recommendation: f64,
    pub recommended_supplier_id: Option<SupplierId>,
    pub recommended_supplier_name: String,
    /// `false` when the requirement references an item missing from inventory.
    pub in_inventory: bool,
}

impl MaterialShortage {
    /// Whether the item is missing from inventory altogether.
    pub fn is_unknown_item(&self) -> bool {
        !self.in_inventory
    }

    fn unknown(item_id: ItemId, required: f64) -> Self {
        Self {
            item_id,
            name: UNKNOWN_ITEM_NAME.to_string(),
            required_quantity: required,
            projected_on_hand: -required,
            shortage: required,
            reorder_recommendation: required,
            recommended_supplier_id: None,
            recommended_supplier_name: String::new(),
            in_inventory: false,
        }
    }
}

/// Total required quantity per item, in order of first appearance.
pub fn aggregate_requirements(order: &ProductionOrder) -> Vec<(ItemId, f64)> {
    let mut totals: Vec<(ItemId, f64)> = Vec::new();
    for requirement in order.material_requirements() {
        match totals.iter_mut().find(|(id, _)| *id == requirement.item_id) {
            Some((_, total)) => *total += requirement.quantity,
            None => totals.push((requirement.item_id, requirement.quantity)),
        }
    }
    totals
}

/// Materials of `order` that fall below safety stock or reorder point.
///
/// Items missing from inventory are reported with the [`UNKNOWN_ITEM_NAME`]
/// sentinel and their full requirement as shortage.
pub fn analyze_shortages<C: MaterialCatalog + ?Sized>(
    catalog: &C,
    order: &ProductionOrder,
    options: &ProcurementOptions,
) -> Vec<MaterialShortage> {
    let multiplier = options.reorder_multiplier.max(0.0);
    let mut shortages = Vec::new();

    for (item_id, required) in aggregate_requirements(order) {
        let Some(item) = catalog.item(item_id) else {
            tracing::debug!(item = %item_id, required, "requirement references unknown item");
            shortages.push(MaterialShortage::unknown(item_id, required));
            continue;
        };

        let projected = item.on_hand() - required;
        let safety_gap = if options.include_safety_stock_gap {
            item.safety_stock() - projected
        } else {
            0.0
        };
        let shortage = safety_gap.max(0.0);
        let reorder_trigger = item.reorder_point() - projected;
        let reorder_recommendation = shortage.max(reorder_trigger).max(0.0) * multiplier;

        if shortage > 0.0 || projected < item.reorder_point() {
            let supplier = catalog.recommend_supplier(item_id);
            shortages.push(MaterialShortage {
                item_id,
                name: item.name().to_string(),
                required_quantity: required,
                projected_on_hand: projected,
                shortage,
                reorder_recommendation,
                recommended_supplier_id: supplier.as_ref().map(Supplier::id_typed),
                recommended_supplier_name: supplier
                    .map(|s| s.name().to_string())
                    .unwrap_or_default(),
                in_inventory: true,
            });
        }
    }

    shortages
}
