//! Application layer: the `PlanningService` facade over stores, the
//! scheduling engine and the purchasing planner.

pub mod catalog;
pub mod inputs;
pub mod service;
pub mod stores;

pub use inputs::{
    BacklogRun, NewEvaluation, NewInventoryItem, NewMachine, NewProductionOrder, NewSupplier,
};
pub use service::PlanningService;
pub use stores::Stores;
