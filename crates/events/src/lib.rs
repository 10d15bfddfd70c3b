//! Domain events emitted by the planning aggregates.

pub mod event;

pub use event::Event;
