//! Production domain module: processes, machines, operations and production orders.
//!
//! This crate contains business rules only (no IO, no storage). Scheduling
//! outcomes enter a [`ProductionOrder`] exclusively through its
//! `RecordSchedule` command.

pub mod machine;
pub mod operation;
pub mod order;
pub mod process;

pub use machine::Machine;
pub use operation::{MaterialRequirement, Operation};
pub use order::{
    AddOperation, ChangeStatus, CreateProductionOrder, OperationAdded, OperationAssignment,
    OperationPlan, OperationsScheduled, OrderStatusChanged, ProductionOrder, ProductionOrderCommand,
    ProductionOrderCreated, ProductionOrderEvent, RecordSchedule,
};
pub use process::{OrderPriority, OrderStatus, Process};
