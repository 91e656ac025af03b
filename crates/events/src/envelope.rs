use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use stockledger_core::ProductId;

use crate::event::Event;

/// Envelope for an outbound event, carrying product-scoped delivery metadata.
///
/// Notes:
/// - `record_version` is the stock record revision that produced the event, so
///   consumers can discard stale or duplicated deliveries per product.
/// - `payload` is the typed event (or raw JSON on the consuming side).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    event_id: Uuid,
    product_id: ProductId,
    event_type: String,
    event_version: u32,
    record_version: u64,
    occurred_at: DateTime<Utc>,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        event_id: Uuid,
        product_id: ProductId,
        event_type: impl Into<String>,
        event_version: u32,
        record_version: u64,
        occurred_at: DateTime<Utc>,
        payload: E,
    ) -> Self {
        Self {
            event_id,
            product_id,
            event_type: event_type.into(),
            event_version,
            record_version,
            occurred_at,
            payload,
        }
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn product_id(&self) -> ProductId {
        self.product_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn event_version(&self) -> u32 {
        self.event_version
    }

    pub fn record_version(&self) -> u64 {
        self.record_version
    }

    pub fn occurred_at(&self) -> DateTime<Utc> {
        self.occurred_at
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}

impl<E: Event> EventEnvelope<E> {
    /// Wrap a typed event with a fresh time-ordered id, copying its metadata.
    pub fn wrap(product_id: ProductId, record_version: u64, event: E) -> Self {
        Self::new(
            Uuid::now_v7(),
            product_id,
            event.event_type(),
            event.version(),
            record_version,
            event.occurred_at(),
            event,
        )
    }
}
