//! Fixtures shared by the purchasing unit tests.

use chrono::{NaiveDate, TimeZone, Utc};

use forgeplan_core::{
    Aggregate, CustomerId, EvaluationId, ItemId, OperationId, ProductionOrderId, SupplierId,
};
use forgeplan_inventory::{InventoryItem, RegisterItem, StockPolicy};
use forgeplan_production::{CreateProductionOrder, Operation, OrderPriority, Process, ProductionOrder};
use forgeplan_suppliers::{RecordEvaluation, RegisterSupplier, Supplier, SupplierCommand};

use crate::shortage::MaterialCatalog;

pub struct Catalog {
    items: Vec<InventoryItem>,
    suppliers: Vec<Supplier>,
}

impl Catalog {
    pub fn new(items: Vec<InventoryItem>, suppliers: Vec<Supplier>) -> Self {
        Self { items, suppliers }
    }
}

impl MaterialCatalog for Catalog {
    fn item(&self, item_id: ItemId) -> Option<InventoryItem> {
        self.items.iter().find(|i| i.id_typed() == item_id).cloned()
    }

    fn supplier(&self, supplier_id: SupplierId) -> Option<Supplier> {
        self.suppliers.iter().find(|s| s.id_typed() == supplier_id).cloned()
    }

    fn suppliers(&self) -> Vec<Supplier> {
        self.suppliers.clone()
    }
}

pub fn item(name: &str, on_hand: f64, safety_stock: f64, reorder_point: f64, lead_time_days: u32) -> InventoryItem {
    InventoryItem::register(RegisterItem {
        item_id: ItemId::new(),
        name: name.to_string(),
        unit_of_measure: "kg".to_string(),
        on_hand,
        policy: StockPolicy {
            safety_stock,
            reorder_point,
            lead_time_days,
        },
        occurred_at: Utc::now(),
    })
    .unwrap()
}

pub fn supplier(name: &str, items: &[ItemId], score: f64) -> Supplier {
    let supplier_id = SupplierId::new();
    let mut supplier = Supplier::register(RegisterSupplier {
        supplier_id,
        name: name.to_string(),
        contact: None,
        processes: vec![],
        material_item_ids: items.to_vec(),
        occurred_at: Utc::now(),
    })
    .unwrap();
    supplier
        .execute(&SupplierCommand::RecordEvaluation(RecordEvaluation {
            supplier_id,
            evaluation_id: EvaluationId::new(),
            quality_score: score,
            delivery_reliability_score: score,
            communication_score: score,
            evaluated_on: NaiveDate::from_ymd_opt(2024, 2, 1).unwrap(),
            notes: String::new(),
            occurred_at: Utc::now(),
        }))
        .unwrap();
    supplier
}

/// A one-operation order consuming `requirements`.
pub fn order_requiring(priority: OrderPriority, requirements: &[(ItemId, f64)]) -> ProductionOrder {
    let operation = requirements.iter().fold(
        Operation::new(OperationId::new(), "cut blanks", Process::Sawing, 1.0, 0.0).unwrap(),
        |op, (item_id, quantity)| op.with_material(*item_id, *quantity),
    );
    ProductionOrder::create(CreateProductionOrder {
        order_id: ProductionOrderId::new(),
        customer_id: CustomerId::new(),
        reference: "FA-2024-017".to_string(),
        due_date: NaiveDate::from_ymd_opt(2024, 3, 29).unwrap(),
        priority,
        operations: vec![operation],
        remarks: None,
        occurred_at: Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap(),
    })
    .unwrap()
}
