use chrono::{DateTime, Utc};

/// A domain-agnostic event.
///
/// Events are immutable facts describing a state change of an aggregate
/// (an order being scheduled, a supplier being evaluated, stock moving).
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "production.order.scheduled").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the event occurred (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
