//! `PlanningService`: master-data glue plus scheduling and purchasing use-cases.

use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use chrono::{NaiveDate, NaiveDateTime};

use forgeplan_calendar::{Shift, ShiftCalendar};
use forgeplan_core::{
    Aggregate, CalendarId, Clock, DomainError, DomainResult, EvaluationId, IdGenerator, ItemId,
    MachineId, OperationId, ProductionOrderId, SupplierId, SystemClock, UuidV7Generator,
};
use forgeplan_infra::ForgeplanConfig;
use forgeplan_inventory::{AdjustStock, InventoryCommand, InventoryItem, RegisterItem};
use forgeplan_production::{
    AddOperation, ChangeStatus, CreateProductionOrder, Machine, Operation, OrderStatus, Process,
    ProductionOrder, ProductionOrderCommand,
};
use forgeplan_purchasing::{
    MaterialCatalog, MaterialShortage, ProcurementOptions, ProcurementOverrides, PurchaseOrder,
    aggregate_requirements, analyze_shortages, plan_purchases,
};
use forgeplan_scheduling::{
    BacklogReport, BacklogRequest, PlanningOptions, ScheduleSummary, ScheduledOperation,
    SchedulingEngine,
};
use forgeplan_suppliers::{
    LinkMaterial, RecordEvaluation, RegisterSupplier, Supplier, SupplierCommand,
    SupplierEvaluation, SupplierEvent,
};

use crate::catalog::StoreCatalog;
use crate::inputs::{
    BacklogRun, NewEvaluation, NewInventoryItem, NewMachine, NewProductionOrder, NewSupplier,
};
use crate::stores::Stores;

/// Facade over the stores, the scheduling engine and the purchasing planner.
///
/// Machine schedule state lives behind a mutex, so a backlog run (reset plus
/// scheduling) is never observed half-done by a concurrent caller.
pub struct PlanningService {
    stores: Stores,
    engine: Mutex<SchedulingEngine>,
    procurement: RwLock<ProcurementOptions>,
    clock: Arc<dyn Clock>,
    ids: Arc<dyn IdGenerator>,
}

impl PlanningService {
    pub fn new(
        stores: Stores,
        config: ForgeplanConfig,
        clock: Arc<dyn Clock>,
        ids: Arc<dyn IdGenerator>,
    ) -> Self {
        let config = config.normalized();
        Self {
            stores,
            engine: Mutex::new(SchedulingEngine::new(config.planning)),
            procurement: RwLock::new(config.procurement),
            clock,
            ids,
        }
    }

    /// In-memory stores, the system clock and UUIDv7 ids.
    pub fn in_memory(config: ForgeplanConfig) -> Self {
        Self::new(
            Stores::in_memory(),
            config,
            Arc::new(SystemClock),
            Arc::new(UuidV7Generator),
        )
    }

    pub fn stores(&self) -> &Stores {
        &self.stores
    }

    fn engine(&self) -> DomainResult<MutexGuard<'_, SchedulingEngine>> {
        self.engine
            .lock()
            .map_err(|_| DomainError::invariant("scheduling engine unavailable"))
    }

    fn catalog(&self) -> StoreCatalog<'_> {
        StoreCatalog::new(&self.stores)
    }

    // ------------------------------------------------------------------
    // Options
    // ------------------------------------------------------------------

    pub fn planning_options(&self) -> DomainResult<PlanningOptions> {
        Ok(self.engine()?.options().clone())
    }

    pub fn procurement_options(&self) -> DomainResult<ProcurementOptions> {
        self.procurement
            .read()
            .map(|o| o.clone())
            .map_err(|_| DomainError::invariant("procurement options unavailable"))
    }

    /// Replace the planning options (normalized) and reset machine schedules.
    pub fn update_planning_options(&self, options: PlanningOptions) -> DomainResult<PlanningOptions> {
        let mut engine = self.engine()?;
        engine.set_options(options);
        let options = engine.options().clone();
        tracing::info!(
            priority_weight = options.priority_weight,
            due_date_weight = options.due_date_weight,
            horizon_days = options.horizon_days,
            max_orders = options.max_orders_per_cycle,
            "planning options updated"
        );
        Ok(options)
    }

    pub fn update_procurement_options(
        &self,
        options: ProcurementOptions,
    ) -> DomainResult<ProcurementOptions> {
        let mut current = self
            .procurement
            .write()
            .map_err(|_| DomainError::invariant("procurement options unavailable"))?;
        *current = options.normalized();
        tracing::info!(
            reorder_multiplier = current.reorder_multiplier,
            auto_create = current.auto_create_orders,
            "procurement options updated"
        );
        Ok(current.clone())
    }

    pub fn reset_machine_schedules(&self) -> DomainResult<()> {
        self.engine()?.reset();
        Ok(())
    }

    // ------------------------------------------------------------------
    // Shift calendars and machines
    // ------------------------------------------------------------------

    pub fn create_shift_calendar(
        &self,
        name: &str,
        shifts: Vec<Shift>,
        non_working_days: Vec<NaiveDate>,
    ) -> DomainResult<ShiftCalendar> {
        let calendar = ShiftCalendar::new(
            CalendarId::from_uuid(self.ids.next_uuid()),
            name,
            shifts,
            non_working_days,
        )?;
        self.stores.calendars.add(calendar.id(), calendar.clone())?;
        Ok(calendar)
    }

    pub fn calendar(&self, calendar_id: CalendarId) -> DomainResult<ShiftCalendar> {
        Ok(self.stores.calendars.get(&calendar_id)?)
    }

    /// Mark `day` as non-working and push the change into live machine schedules.
    pub fn add_non_working_day(
        &self,
        calendar_id: CalendarId,
        day: NaiveDate,
    ) -> DomainResult<ShiftCalendar> {
        let mut calendar = self.stores.calendars.get(&calendar_id)?;
        if calendar.add_non_working_day(day) {
            self.stores.calendars.upsert(calendar_id, calendar.clone())?;
            self.engine()?.refresh_calendar(&calendar);
        }
        Ok(calendar)
    }

    pub fn register_machine(&self, input: NewMachine) -> DomainResult<Machine> {
        if let Some(calendar_id) = input.calendar_id {
            if !self.stores.calendars.contains(&calendar_id) {
                return Err(DomainError::not_found(format!("shift calendar {calendar_id}")));
            }
        }

        let mut machine = Machine::new(
            MachineId::from_uuid(self.ids.next_uuid()),
            input.name,
            input.processes,
            input.capacity_hours_per_week,
        )?;
        if let Some(calendar_id) = input.calendar_id {
            machine = machine.with_calendar(calendar_id);
        }
        if let Some(location) = input.location {
            machine = machine.with_location(location);
        }

        self.stores.machines.add(machine.id(), machine.clone())?;
        Ok(machine)
    }

    pub fn machine(&self, machine_id: MachineId) -> DomainResult<Machine> {
        Ok(self.stores.machines.get(&machine_id)?)
    }

    /// Bind a machine to a calendar (or unbind with `None`).
    pub fn assign_shift_calendar(
        &self,
        machine_id: MachineId,
        calendar_id: Option<CalendarId>,
    ) -> DomainResult<Machine> {
        let mut machine = self.stores.machines.get(&machine_id)?;
        let calendar = match calendar_id {
            Some(id) => Some(self.stores.calendars.get(&id)?),
            None => None,
        };

        machine.assign_calendar(calendar_id);
        self.stores.machines.upsert(machine_id, machine.clone())?;
        self.engine()?.assign_calendar(machine_id, calendar);
        Ok(machine)
    }

    // ------------------------------------------------------------------
    // Inventory and suppliers
    // ------------------------------------------------------------------

    pub fn register_inventory_item(&self, input: NewInventoryItem) -> DomainResult<InventoryItem> {
        let item = InventoryItem::register(RegisterItem {
            item_id: ItemId::from_uuid(self.ids.next_uuid()),
            name: input.name,
            unit_of_measure: input.unit_of_measure,
            on_hand: input.on_hand,
            policy: input.policy,
            occurred_at: self.clock.now(),
        })?;
        self.stores.inventory.add(item.id_typed(), item.clone())?;
        Ok(item)
    }

    pub fn inventory_item(&self, item_id: ItemId) -> DomainResult<InventoryItem> {
        Ok(self.stores.inventory.get(&item_id)?)
    }

    pub fn register_supplier(&self, input: NewSupplier) -> DomainResult<Supplier> {
        let supplier = Supplier::register(RegisterSupplier {
            supplier_id: SupplierId::from_uuid(self.ids.next_uuid()),
            name: input.name,
            contact: input.contact,
            processes: input.processes,
            material_item_ids: input.material_item_ids,
            occurred_at: self.clock.now(),
        })?;
        self.stores.suppliers.add(supplier.id_typed(), supplier.clone())?;
        Ok(supplier)
    }

    pub fn supplier(&self, supplier_id: SupplierId) -> DomainResult<Supplier> {
        Ok(self.stores.suppliers.get(&supplier_id)?)
    }

    /// Idempotent; the item must exist in inventory.
    pub fn link_supplier_to_material(
        &self,
        supplier_id: SupplierId,
        item_id: ItemId,
    ) -> DomainResult<Supplier> {
        if !self.stores.inventory.contains(&item_id) {
            return Err(DomainError::not_found(format!("inventory item {item_id}")));
        }
        let mut supplier = self.stores.suppliers.get(&supplier_id)?;
        let events = supplier.execute(&SupplierCommand::LinkMaterial(LinkMaterial {
            supplier_id,
            item_id,
            occurred_at: self.clock.now(),
        }))?;
        if !events.is_empty() {
            self.stores.suppliers.upsert(supplier_id, supplier.clone())?;
        }
        Ok(supplier)
    }

    /// Store the evaluation and fold it into the supplier's running rating.
    pub fn record_supplier_evaluation(
        &self,
        supplier_id: SupplierId,
        input: NewEvaluation,
    ) -> DomainResult<SupplierEvaluation> {
        let mut supplier = self.stores.suppliers.get(&supplier_id)?;
        let events = supplier.execute(&SupplierCommand::RecordEvaluation(RecordEvaluation {
            supplier_id,
            evaluation_id: EvaluationId::from_uuid(self.ids.next_uuid()),
            quality_score: input.quality_score,
            delivery_reliability_score: input.delivery_reliability_score,
            communication_score: input.communication_score,
            evaluated_on: input.evaluated_on.unwrap_or_else(|| self.clock.today()),
            notes: input.notes,
            occurred_at: self.clock.now(),
        }))?;

        let evaluation = events
            .iter()
            .find_map(|e| match e {
                SupplierEvent::SupplierEvaluated(e) => Some(SupplierEvaluation::from(e)),
                _ => None,
            })
            .ok_or_else(|| DomainError::invariant("evaluation produced no event"))?;

        self.stores.evaluations.add(evaluation.id, evaluation.clone())?;
        self.stores.suppliers.upsert(supplier_id, supplier)?;
        Ok(evaluation)
    }

    pub fn evaluations_for(&self, supplier_id: SupplierId) -> Vec<SupplierEvaluation> {
        self.stores
            .evaluations
            .list()
            .into_iter()
            .filter(|e| e.supplier_id == supplier_id)
            .collect()
    }

    pub fn recommend_supplier_for_item(&self, item_id: ItemId) -> Option<Supplier> {
        self.catalog().recommend_supplier(item_id)
    }

    // ------------------------------------------------------------------
    // Production orders
    // ------------------------------------------------------------------

    /// A new operation with a generated id.
    pub fn build_operation(
        &self,
        name: &str,
        process: Process,
        duration_hours: f64,
        setup_time_hours: f64,
    ) -> DomainResult<Operation> {
        Operation::new(
            OperationId::from_uuid(self.ids.next_uuid()),
            name,
            process,
            duration_hours,
            setup_time_hours,
        )
    }

    pub fn create_production_order(&self, input: NewProductionOrder) -> DomainResult<ProductionOrder> {
        let order = ProductionOrder::create(CreateProductionOrder {
            order_id: ProductionOrderId::from_uuid(self.ids.next_uuid()),
            customer_id: input.customer_id,
            reference: input.reference,
            due_date: input.due_date,
            priority: input.priority,
            operations: input.operations,
            remarks: input.remarks,
            occurred_at: self.clock.now(),
        })?;
        self.stores.orders.add(order.id_typed(), order.clone())?;
        Ok(order)
    }

    pub fn order(&self, order_id: ProductionOrderId) -> DomainResult<ProductionOrder> {
        Ok(self.stores.orders.get(&order_id)?)
    }

    pub fn add_operation_to_order(
        &self,
        order_id: ProductionOrderId,
        operation: Operation,
    ) -> DomainResult<ProductionOrder> {
        self.execute_on_order(
            order_id,
            ProductionOrderCommand::AddOperation(AddOperation {
                order_id,
                operation,
                occurred_at: self.clock.now(),
            }),
        )
    }

    pub fn update_order_status(
        &self,
        order_id: ProductionOrderId,
        status: OrderStatus,
    ) -> DomainResult<ProductionOrder> {
        self.execute_on_order(
            order_id,
            ProductionOrderCommand::ChangeStatus(ChangeStatus {
                order_id,
                status,
                occurred_at: self.clock.now(),
            }),
        )
    }

    fn execute_on_order(
        &self,
        order_id: ProductionOrderId,
        command: ProductionOrderCommand,
    ) -> DomainResult<ProductionOrder> {
        let mut order = self.stores.orders.get(&order_id)?;
        order.execute(&command)?;
        self.stores.orders.upsert(order_id, order.clone())?;
        Ok(order)
    }

    // ------------------------------------------------------------------
    // Scheduling
    // ------------------------------------------------------------------

    /// Schedule one order; `start_reference` defaults to today at the
    /// configured start time.
    pub fn schedule_order(
        &self,
        order_id: ProductionOrderId,
        start_reference: Option<NaiveDateTime>,
    ) -> DomainResult<ScheduleSummary> {
        let order = self.stores.orders.get(&order_id)?;
        let mut engine = self.engine()?;
        let start = start_reference.unwrap_or_else(|| engine.default_start_on(self.clock.today()));

        let outcome = engine.schedule_order(&self.catalog(), &order, start, self.clock.now())?;
        self.stores.orders.upsert(order_id, outcome.order)?;
        Ok(outcome.summary)
    }

    /// Reset machine schedules and schedule the prioritized backlog.
    pub fn schedule_backlog(&self, run: BacklogRun) -> DomainResult<BacklogReport> {
        let mut engine = self.engine()?;
        let today = self.clock.today();
        let request = BacklogRequest {
            start_reference: run
                .start_reference
                .unwrap_or_else(|| engine.default_start_on(today)),
            horizon_days: run.horizon_days,
            max_orders: run.max_orders,
            today,
            occurred_at: self.clock.now(),
        };

        let orders = self.stores.orders.list();
        let report = engine.schedule_backlog(&self.catalog(), &orders, &request);
        for outcome in &report.outcomes {
            self.stores
                .orders
                .upsert(outcome.order.id_typed(), outcome.order.clone())?;
        }
        Ok(report)
    }

    /// Planned operations across all orders, earliest first; `0` = no limit.
    pub fn upcoming_operations(&self, limit: usize) -> DomainResult<Vec<ScheduledOperation>> {
        let orders = self.stores.orders.list();
        Ok(self.engine()?.upcoming_operations(&orders, limit))
    }

    // ------------------------------------------------------------------
    // Materials and purchasing
    // ------------------------------------------------------------------

    pub fn material_shortage_report(
        &self,
        order_id: ProductionOrderId,
        include_safety_stock: Option<bool>,
        reorder_multiplier: Option<f64>,
    ) -> DomainResult<Vec<MaterialShortage>> {
        let order = self.stores.orders.get(&order_id)?;
        let options = self.procurement_options()?.with_overrides(&ProcurementOverrides {
            include_safety_stock,
            reorder_multiplier,
            ..ProcurementOverrides::default()
        });
        Ok(analyze_shortages(&self.catalog(), &order, &options))
    }

    /// Plan purchases for an order's shortages.
    ///
    /// Drafts are always returned; only `Open` ones (auto-create) are stored.
    pub fn plan_material_purchases(
        &self,
        order_id: ProductionOrderId,
        overrides: &ProcurementOverrides,
    ) -> DomainResult<Vec<PurchaseOrder>> {
        let order = self.stores.orders.get(&order_id)?;
        let options = self.procurement_options()?.with_overrides(overrides);
        let drafts = plan_purchases(
            &self.catalog(),
            &*self.ids,
            &*self.clock,
            &order,
            &options,
        );

        let mut committed = 0;
        for draft in drafts.iter().filter(|d| d.is_committed()) {
            self.stores.purchase_orders.add(draft.id, draft.clone())?;
            committed += 1;
        }
        tracing::info!(
            order = %order.reference(),
            planned = drafts.len(),
            committed,
            "material purchases planned"
        );
        Ok(drafts)
    }

    pub fn purchase_orders(&self) -> Vec<PurchaseOrder> {
        self.stores.purchase_orders.list()
    }

    /// Book the order's material requirements out of inventory.
    ///
    /// Every item is checked before any stock changes, so a missing item or
    /// insufficient stock leaves inventory untouched.
    pub fn consume_materials(&self, order_id: ProductionOrderId) -> DomainResult<()> {
        let order = self.stores.orders.get(&order_id)?;
        let occurred_at = self.clock.now();

        let mut updated = Vec::new();
        for (item_id, quantity) in aggregate_requirements(&order) {
            let mut item = self.stores.inventory.get(&item_id).map_err(|_| {
                DomainError::not_found(format!("material {item_id} is not present in inventory"))
            })?;
            item.execute(&InventoryCommand::AdjustStock(AdjustStock {
                item_id,
                delta: -quantity,
                occurred_at,
            }))?;
            updated.push(item);
        }

        for item in updated {
            self.stores.inventory.upsert(item.id_typed(), item)?;
        }
        Ok(())
    }
}
