use std::sync::Arc;

use chrono::Utc;
use thiserror::Error;

use stockledger_events::{EventBus, EventEnvelope, LowStockSignal};
use stockledger_inventory::StockRecord;

use crate::catalog::ProductCatalog;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EmitError {
    #[error("low stock signal publication failed: {0}")]
    Publish(String),
}

/// Outbound side channel for low-stock records.
///
/// Called from inside the product's exclusive-access scope, so implementations
/// should hand off quickly and must not call back into the ledger.
pub trait LowStockEmitter: Send + Sync {
    fn emit(&self, record: &StockRecord) -> Result<(), EmitError>;
}

impl<E> LowStockEmitter for Arc<E>
where
    E: LowStockEmitter + ?Sized,
{
    fn emit(&self, record: &StockRecord) -> Result<(), EmitError> {
        (**self).emit(record)
    }
}

/// Emitter that enriches the record with catalog context and publishes a
/// [`LowStockSignal`] envelope on an event bus.
#[derive(Debug)]
pub struct BusSignalEmitter<B, C> {
    bus: B,
    catalog: C,
}

impl<B, C> BusSignalEmitter<B, C> {
    pub fn new(bus: B, catalog: C) -> Self {
        Self { bus, catalog }
    }

    pub fn bus(&self) -> &B {
        &self.bus
    }
}

impl<B, C> BusSignalEmitter<B, C>
where
    C: ProductCatalog,
{
    pub fn build_signal(&self, record: &StockRecord) -> LowStockSignal {
        let context = self.catalog.describe(record.product_id());

        LowStockSignal {
            product_id: record.product_id(),
            product_name: context.as_ref().map(|c| c.name.clone()).unwrap_or_default(),
            seller_id: context.and_then(|c| c.seller_id),
            current_stock: record.available_quantity(),
            threshold: record.low_stock_threshold(),
            occurred_at: Utc::now(),
        }
    }
}

impl<B, C> LowStockEmitter for BusSignalEmitter<B, C>
where
    B: EventBus<EventEnvelope<LowStockSignal>>,
    C: ProductCatalog,
{
    fn emit(&self, record: &StockRecord) -> Result<(), EmitError> {
        let signal = self.build_signal(record);
        let envelope = EventEnvelope::wrap(record.product_id(), record.version(), signal);

        self.bus
            .publish(envelope)
            .map_err(|e| EmitError::Publish(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::mpsc;

    use stockledger_core::{ProductId, SellerId};
    use stockledger_events::{InMemoryBusError, InMemoryEventBus, Subscription};

    use super::*;
    use crate::catalog::{InMemoryCatalog, ProductContext};

    fn low_record() -> StockRecord {
        StockRecord::create(ProductId::new(1), 70, 10, Utc::now())
            .unwrap()
            .reserve(65, Utc::now())
            .unwrap()
    }

    #[test]
    fn emits_enriched_envelope() {
        let bus: Arc<InMemoryEventBus<EventEnvelope<LowStockSignal>>> = Arc::new(InMemoryEventBus::new());
        let catalog = Arc::new(InMemoryCatalog::new());
        catalog.upsert(
            ProductId::new(1),
            ProductContext {
                name: "Desk lamp".to_string(),
                seller_id: Some(SellerId::new(3)),
            },
        );
        let sub = bus.subscribe();
        let emitter = BusSignalEmitter::new(bus.clone(), catalog);

        let record = low_record();
        emitter.emit(&record).unwrap();

        let env = sub.try_recv().unwrap();
        assert_eq!(env.product_id(), ProductId::new(1));
        assert_eq!(env.record_version(), record.version());
        let signal = env.payload();
        assert_eq!(signal.product_name, "Desk lamp");
        assert_eq!(signal.seller_id, Some(SellerId::new(3)));
        assert_eq!(signal.current_stock, 5);
        assert_eq!(signal.threshold, 10);
    }

    #[test]
    fn unknown_product_gets_empty_context() {
        let emitter = BusSignalEmitter::new(
            InMemoryEventBus::<EventEnvelope<LowStockSignal>>::new(),
            InMemoryCatalog::new(),
        );
        let signal = emitter.build_signal(&low_record());
        assert_eq!(signal.product_name, "");
        assert_eq!(signal.seller_id, None);
    }

    struct PoisonedBus;

    impl EventBus<EventEnvelope<LowStockSignal>> for PoisonedBus {
        type Error = InMemoryBusError;

        fn publish(&self, _message: EventEnvelope<LowStockSignal>) -> Result<(), Self::Error> {
            Err(InMemoryBusError::Poisoned)
        }

        fn subscribe(&self) -> Subscription<EventEnvelope<LowStockSignal>> {
            Subscription::new(mpsc::channel().1)
        }
    }

    #[test]
    fn publish_failure_carries_transport_message() {
        let emitter = BusSignalEmitter::new(PoisonedBus, InMemoryCatalog::new());
        let err = emitter.emit(&low_record()).unwrap_err();
        assert_eq!(err, EmitError::Publish("in-memory bus lock poisoned".to_string()));
        assert_eq!(
            err.to_string(),
            "low stock signal publication failed: in-memory bus lock poisoned"
        );
    }
}
