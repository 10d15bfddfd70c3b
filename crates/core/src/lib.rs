//! `forgeplan-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod clock;
pub mod error;
pub mod id;
pub mod units;

pub use aggregate::{Aggregate, AggregateRoot};
pub use clock::{Clock, FixedClock, SystemClock};
pub use error::{DomainError, DomainResult};
pub use id::{
    CalendarId, CustomerId, EvaluationId, IdGenerator, ItemId, MachineId, OperationId,
    ProductionOrderId, PurchaseOrderId, SequentialIdGenerator, SupplierId, UuidV7Generator,
};
