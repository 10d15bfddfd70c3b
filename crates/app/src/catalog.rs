//! Store-backed views handed to the engine and the purchasing planner.

use forgeplan_calendar::ShiftCalendar;
use forgeplan_core::{CalendarId, ItemId, SupplierId};
use forgeplan_inventory::InventoryItem;
use forgeplan_production::Machine;
use forgeplan_purchasing::MaterialCatalog;
use forgeplan_scheduling::PlanningCatalog;
use forgeplan_suppliers::Supplier;

use crate::stores::Stores;

pub struct StoreCatalog<'a> {
    stores: &'a Stores,
}

impl<'a> StoreCatalog<'a> {
    pub fn new(stores: &'a Stores) -> Self {
        Self { stores }
    }
}

impl PlanningCatalog for StoreCatalog<'_> {
    fn machines(&self) -> Vec<Machine> {
        self.stores.machines.list()
    }

    fn calendar(&self, calendar_id: CalendarId) -> Option<ShiftCalendar> {
        self.stores.calendars.get(&calendar_id).ok()
    }
}

impl MaterialCatalog for StoreCatalog<'_> {
    fn item(&self, item_id: ItemId) -> Option<InventoryItem> {
        self.stores.inventory.get(&item_id).ok()
    }

    fn supplier(&self, supplier_id: SupplierId) -> Option<Supplier> {
        self.stores.suppliers.get(&supplier_id).ok()
    }

    fn suppliers(&self) -> Vec<Supplier> {
        self.stores.suppliers.list()
    }
}
