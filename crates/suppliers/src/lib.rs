//! Supplier domain module: supplier master data, evaluations and sourcing recommendations.
//!
//! Deterministic domain logic only (no IO, no storage).

pub mod evaluation;
pub mod rating;
pub mod supplier;

pub use evaluation::{SupplierEvaluation, overall_score};
pub use rating::recommend_for_item;
pub use supplier::{
    ContactInfo, LinkMaterial, MaterialLinked, RecordEvaluation, RegisterSupplier, Supplier,
    SupplierCommand, SupplierEvaluated, SupplierEvent, SupplierRegistered,
};
