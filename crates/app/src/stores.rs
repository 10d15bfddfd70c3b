use std::sync::Arc;

use forgeplan_calendar::ShiftCalendar;
use forgeplan_core::{
    CalendarId, EvaluationId, ItemId, MachineId, ProductionOrderId, PurchaseOrderId, SupplierId,
};
use forgeplan_infra::{InMemoryStore, KeyedStore};
use forgeplan_inventory::InventoryItem;
use forgeplan_production::{Machine, ProductionOrder};
use forgeplan_purchasing::PurchaseOrder;
use forgeplan_suppliers::{Supplier, SupplierEvaluation};

/// The record stores the service reads and writes.
#[derive(Clone)]
pub struct Stores {
    pub orders: Arc<dyn KeyedStore<ProductionOrderId, ProductionOrder>>,
    pub machines: Arc<dyn KeyedStore<MachineId, Machine>>,
    pub calendars: Arc<dyn KeyedStore<CalendarId, ShiftCalendar>>,
    pub inventory: Arc<dyn KeyedStore<ItemId, InventoryItem>>,
    pub suppliers: Arc<dyn KeyedStore<SupplierId, Supplier>>,
    pub evaluations: Arc<dyn KeyedStore<EvaluationId, SupplierEvaluation>>,
    pub purchase_orders: Arc<dyn KeyedStore<PurchaseOrderId, PurchaseOrder>>,
}

impl Stores {
    pub fn in_memory() -> Self {
        Self {
            orders: Arc::new(InMemoryStore::new()),
            machines: Arc::new(InMemoryStore::new()),
            calendars: Arc::new(InMemoryStore::new()),
            inventory: Arc::new(InMemoryStore::new()),
            suppliers: Arc::new(InMemoryStore::new()),
            evaluations: Arc::new(InMemoryStore::new()),
            purchase_orders: Arc::new(InMemoryStore::new()),
        }
    }
}

impl Default for Stores {
    fn default() -> Self {
        Self::in_memory()
    }
}
