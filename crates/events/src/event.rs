use chrono::{DateTime, Utc};

/// An outbound fact published by the ledger.
///
/// Events are immutable and versioned; consumers key on `event_type`.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name/type identifier (e.g. "stock.low_stock").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the fact was observed (business time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
