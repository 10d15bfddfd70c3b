//! Finite-capacity production scheduling.
//!
//! `SchedulingEngine` walks an order's operation sequence, picks the least
//! loaded eligible machine for each step and books it on that machine's
//! calendar. Loads are soft: exceeding a machine's weekly capacity is
//! reported, never blocked.

pub mod backlog;
pub mod engine;
pub mod machine_schedule;
pub mod options;
pub mod selector;

pub use backlog::{BacklogCriteria, prioritize};
pub use engine::{
    BacklogFailure, BacklogReport, BacklogRequest, PlanningCatalog, ScheduleOutcome,
    ScheduleSummary, SchedulingEngine,
};
pub use machine_schedule::{MachineSchedule, ScheduledOperation};
pub use options::PlanningOptions;
pub use selector::{eligible_machines, least_loaded};
