use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};

use forgeplan_core::{
    Aggregate, AggregateRoot, CustomerId, DomainError, MachineId, OperationId, ProductionOrderId,
};
use forgeplan_events::Event;

use crate::operation::{MaterialRequirement, Operation};
use crate::process::{OrderPriority, OrderStatus};

/// Scheduling outcome for one operation of an order.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OperationAssignment {
    pub operation_id: OperationId,
    pub machine_id: MachineId,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

/// An operation together with where and when it is planned to run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationPlan {
    operation: Operation,
    assignment: Option<OperationAssignment>,
}

impl OperationPlan {
    pub fn new(operation: Operation) -> Self {
        Self {
            operation,
            assignment: None,
        }
    }

    pub fn operation(&self) -> &Operation {
        &self.operation
    }

    pub fn assignment(&self) -> Option<&OperationAssignment> {
        self.assignment.as_ref()
    }

    pub fn assigned_machine_id(&self) -> Option<MachineId> {
        self.assignment.map(|a| a.machine_id)
    }

    pub fn scheduled_start(&self) -> Option<NaiveDateTime> {
        self.assignment.map(|a| a.start)
    }

    pub fn scheduled_end(&self) -> Option<NaiveDateTime> {
        self.assignment.map(|a| a.end)
    }
}

/// Aggregate root: ProductionOrder.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductionOrder {
    id: ProductionOrderId,
    customer_id: Option<CustomerId>,
    reference: String,
    due_date: NaiveDate,
    status: OrderStatus,
    priority: OrderPriority,
    operations: Vec<OperationPlan>,
    remarks: String,
    created_at: DateTime<Utc>,
    version: u64,
    created: bool,
}

impl ProductionOrder {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: ProductionOrderId) -> Self {
        Self {
            id,
            customer_id: None,
            reference: String::new(),
            due_date: NaiveDate::MIN,
            status: OrderStatus::Planned,
            priority: OrderPriority::Normal,
            operations: Vec::new(),
            remarks: String::new(),
            created_at: DateTime::<Utc>::MIN_UTC,
            version: 0,
            created: false,
        }
    }

    /// Run `CreateProductionOrder` against a fresh aggregate.
    pub fn create(cmd: CreateProductionOrder) -> Result<Self, DomainError> {
        let mut order = Self::empty(cmd.order_id);
        order.execute(&ProductionOrderCommand::CreateProductionOrder(cmd))?;
        Ok(order)
    }

    pub fn id_typed(&self) -> ProductionOrderId {
        self.id
    }

    pub fn customer_id(&self) -> Option<CustomerId> {
        self.customer_id
    }

    pub fn reference(&self) -> &str {
        &self.reference
    }

    pub fn due_date(&self) -> NaiveDate {
        self.due_date
    }

    pub fn status(&self) -> OrderStatus {
        self.status
    }

    pub fn priority(&self) -> OrderPriority {
        self.priority
    }

    pub fn operations(&self) -> &[OperationPlan] {
        &self.operations
    }

    pub fn remarks(&self) -> &str {
        &self.remarks
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Every material requirement across all operations, in operation order.
    pub fn material_requirements(&self) -> impl Iterator<Item = &MaterialRequirement> {
        self.operations.iter().flat_map(|p| p.operation.materials.iter())
    }

    pub fn is_fully_scheduled(&self) -> bool {
        self.operations.iter().all(|p| p.assignment.is_some())
    }
}

impl AggregateRoot for ProductionOrder {
    type Id = ProductionOrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: CreateProductionOrder.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateProductionOrder {
    pub order_id: ProductionOrderId,
    pub customer_id: CustomerId,
    pub reference: String,
    pub due_date: NaiveDate,
    pub priority: OrderPriority,
    pub operations: Vec<Operation>,
    pub remarks: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddOperation (appended to the end of the sequence).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AddOperation {
    pub order_id: ProductionOrderId,
    pub operation: Operation,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordSchedule (issued by the scheduling engine).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordSchedule {
    pub order_id: ProductionOrderId,
    pub assignments: Vec<OperationAssignment>,
    pub occurred_at: DateTime<Utc>,
}

/// Command: ChangeStatus.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeStatus {
    pub order_id: ProductionOrderId,
    pub status: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProductionOrderCommand {
    CreateProductionOrder(CreateProductionOrder),
    AddOperation(AddOperation),
    RecordSchedule(RecordSchedule),
    ChangeStatus(ChangeStatus),
}

/// Event: ProductionOrderCreated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductionOrderCreated {
    pub order_id: ProductionOrderId,
    pub customer_id: CustomerId,
    pub reference: String,
    pub due_date: NaiveDate,
    pub priority: OrderPriority,
    pub operations: Vec<Operation>,
    pub remarks: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OperationAdded.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationAdded {
    pub order_id: ProductionOrderId,
    pub operation: Operation,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OperationsScheduled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationsScheduled {
    pub order_id: ProductionOrderId,
    pub assignments: Vec<OperationAssignment>,
    pub occurred_at: DateTime<Utc>,
}

/// Event: OrderStatusChanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusChanged {
    pub order_id: ProductionOrderId,
    pub from: OrderStatus,
    pub to: OrderStatus,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ProductionOrderEvent {
    ProductionOrderCreated(ProductionOrderCreated),
    OperationAdded(OperationAdded),
    OperationsScheduled(OperationsScheduled),
    OrderStatusChanged(OrderStatusChanged),
}

impl Event for ProductionOrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            ProductionOrderEvent::ProductionOrderCreated(_) => "production.order.created",
            ProductionOrderEvent::OperationAdded(_) => "production.order.operation_added",
            ProductionOrderEvent::OperationsScheduled(_) => "production.order.scheduled",
            ProductionOrderEvent::OrderStatusChanged(_) => "production.order.status_changed",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            ProductionOrderEvent::ProductionOrderCreated(e) => e.occurred_at,
            ProductionOrderEvent::OperationAdded(e) => e.occurred_at,
            ProductionOrderEvent::OperationsScheduled(e) => e.occurred_at,
            ProductionOrderEvent::OrderStatusChanged(e) => e.occurred_at,
        }
    }
}

impl Aggregate for ProductionOrder {
    type Command = ProductionOrderCommand;
    type Event = ProductionOrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            ProductionOrderEvent::ProductionOrderCreated(e) => {
                self.id = e.order_id;
                self.customer_id = Some(e.customer_id);
                self.reference = e.reference.clone();
                self.due_date = e.due_date;
                self.priority = e.priority;
                self.status = OrderStatus::Planned;
                self.operations = e.operations.iter().cloned().map(OperationPlan::new).collect();
                self.remarks = e.remarks.clone();
                self.created_at = e.occurred_at;
                self.created = true;
            }
            ProductionOrderEvent::OperationAdded(e) => {
                self.operations.push(OperationPlan::new(e.operation.clone()));
            }
            ProductionOrderEvent::OperationsScheduled(e) => {
                for assignment in &e.assignments {
                    if let Some(plan) = self
                        .operations
                        .iter_mut()
                        .find(|p| p.operation.id == assignment.operation_id)
                    {
                        plan.assignment = Some(*assignment);
                    }
                }
            }
            ProductionOrderEvent::OrderStatusChanged(e) => {
                self.status = e.to;
            }
        }

        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            ProductionOrderCommand::CreateProductionOrder(cmd) => self.handle_create(cmd),
            ProductionOrderCommand::AddOperation(cmd) => self.handle_add_operation(cmd),
            ProductionOrderCommand::RecordSchedule(cmd) => self.handle_record_schedule(cmd),
            ProductionOrderCommand::ChangeStatus(cmd) => self.handle_change_status(cmd),
        }
    }
}

impl ProductionOrder {
    fn ensure_order_id(&self, order_id: ProductionOrderId) -> Result<(), DomainError> {
        if self.id != order_id {
            return Err(DomainError::invariant("order_id mismatch"));
        }
        Ok(())
    }

    fn ensure_open(&self) -> Result<(), DomainError> {
        if !self.created {
            return Err(DomainError::not_found(format!("production order {}", self.id)));
        }
        if self.status.is_terminal() {
            return Err(DomainError::invariant(format!(
                "production order {} is {} and can no longer change",
                self.reference, self.status
            )));
        }
        Ok(())
    }

    fn ensure_unique_operation(&self, operation: &Operation) -> Result<(), DomainError> {
        if self.operations.iter().any(|p| p.operation.id == operation.id) {
            return Err(DomainError::duplicate(format!(
                "operation {} already belongs to order {}",
                operation.id, self.reference
            )));
        }
        Ok(())
    }

    fn handle_create(
        &self,
        cmd: &CreateProductionOrder,
    ) -> Result<Vec<ProductionOrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::duplicate(format!(
                "production order {} already exists",
                cmd.order_id
            )));
        }
        if cmd.operations.is_empty() {
            return Err(DomainError::validation(
                "production orders must contain at least one operation",
            ));
        }
        for (idx, operation) in cmd.operations.iter().enumerate() {
            operation.validate()?;
            if cmd.operations[..idx].iter().any(|o| o.id == operation.id) {
                return Err(DomainError::validation(format!(
                    "operation {} is listed twice",
                    operation.id
                )));
            }
        }

        Ok(vec![ProductionOrderEvent::ProductionOrderCreated(
            ProductionOrderCreated {
                order_id: cmd.order_id,
                customer_id: cmd.customer_id,
                reference: cmd.reference.clone(),
                due_date: cmd.due_date,
                priority: cmd.priority,
                operations: cmd.operations.clone(),
                remarks: cmd.remarks.clone().unwrap_or_default(),
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_add_operation(
        &self,
        cmd: &AddOperation,
    ) -> Result<Vec<ProductionOrderEvent>, DomainError> {
        self.ensure_open()?;
        self.ensure_order_id(cmd.order_id)?;
        cmd.operation.validate()?;
        self.ensure_unique_operation(&cmd.operation)?;

        Ok(vec![ProductionOrderEvent::OperationAdded(OperationAdded {
            order_id: cmd.order_id,
            operation: cmd.operation.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_record_schedule(
        &self,
        cmd: &RecordSchedule,
    ) -> Result<Vec<ProductionOrderEvent>, DomainError> {
        self.ensure_open()?;
        self.ensure_order_id(cmd.order_id)?;

        if cmd.assignments.is_empty() {
            return Err(DomainError::validation("schedule contains no assignments"));
        }
        for assignment in &cmd.assignments {
            if !self
                .operations
                .iter()
                .any(|p| p.operation.id == assignment.operation_id)
            {
                return Err(DomainError::invariant(format!(
                    "operation {} does not belong to order {}",
                    assignment.operation_id, self.reference
                )));
            }
            if assignment.end < assignment.start {
                return Err(DomainError::validation(format!(
                    "operation {} ends before it starts",
                    assignment.operation_id
                )));
            }
        }

        Ok(vec![ProductionOrderEvent::OperationsScheduled(
            OperationsScheduled {
                order_id: cmd.order_id,
                assignments: cmd.assignments.clone(),
                occurred_at: cmd.occurred_at,
            },
        )])
    }

    fn handle_change_status(
        &self,
        cmd: &ChangeStatus,
    ) -> Result<Vec<ProductionOrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found(format!("production order {}", self.id)));
        }
        self.ensure_order_id(cmd.order_id)?;

        if !self.status.can_transition_to(cmd.status) {
            return Err(DomainError::invariant(format!(
                "cannot move order {} from {} to {}",
                self.reference, self.status, cmd.status
            )));
        }

        Ok(vec![ProductionOrderEvent::OrderStatusChanged(
            OrderStatusChanged {
                order_id: cmd.order_id,
                from: self.status,
                to: cmd.status,
                occurred_at: cmd.occurred_at,
            },
        )])
    }
}
