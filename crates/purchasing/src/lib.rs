//! Purchasing domain module: material shortages and purchase planning.
//!
//! Deterministic domain logic only (no IO, no storage). The planner returns
//! drafts; persisting them is the caller's decision.

pub mod options;
pub mod order;
pub mod planner;
pub mod shortage;

pub use options::{ProcurementOptions, ProcurementOverrides};
pub use order::{PurchaseOrder, PurchaseOrderStatus};
pub use planner::plan_purchases;
pub use shortage::{MaterialCatalog, MaterialShortage, UNKNOWN_ITEM_NAME, aggregate_requirements, analyze_shortages};

#[cfg(test)]
mod test_support;
