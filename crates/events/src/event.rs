use chrono::{DateTime, Utc};

/// A domain-agnostic event.
///
/// Events are facts: once published they are never edited. Subscribers
/// (displays, loggers) may see the same fact more than once and must
/// tolerate that.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name (e.g. "billing.cart.item_scanned").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the event occurred (wall-clock, for display and audit).
    fn occurred_at(&self) -> DateTime<Utc>;
}
