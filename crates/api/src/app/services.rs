use std::sync::Arc;
use std::thread;

use stockledger_events::{EventBus, EventEnvelope, InMemoryEventBus, LowStockSignal, Subscription};
use stockledger_infra::{
    BusSignalEmitter, InMemoryCatalog, InMemoryStockStore, LedgerConfig, LowStockEmitter,
    ReservationEngine,
};

#[cfg(feature = "redis")]
use stockledger_infra::event_bus::RedisPubSubEventBus;

/// Engine as wired by the API: in-memory records, any signal transport.
pub type LedgerEngine = ReservationEngine<InMemoryStockStore, Arc<dyn LowStockEmitter>>;

type SignalBus = InMemoryEventBus<EventEnvelope<LowStockSignal>>;

pub struct AppServices {
    engine: Arc<LedgerEngine>,
    catalog: Arc<InMemoryCatalog>,
    transport: &'static str,
}

impl AppServices {
    pub fn engine(&self) -> &LedgerEngine {
        &self.engine
    }

    pub fn engine_handle(&self) -> Arc<LedgerEngine> {
        self.engine.clone()
    }

    pub fn catalog(&self) -> &InMemoryCatalog {
        &self.catalog
    }

    pub fn catalog_handle(&self) -> Arc<InMemoryCatalog> {
        self.catalog.clone()
    }

    /// Which bus carries low-stock signals ("in_memory" or "redis").
    pub fn transport(&self) -> &'static str {
        self.transport
    }
}

/// Wire the engine against the configured signal transport.
///
/// A Redis URL selects the Redis pub/sub bus when the `redis` feature is
/// compiled in; otherwise signals stay in-process and a background
/// subscriber logs them.
pub fn build_services(config: &LedgerConfig) -> anyhow::Result<AppServices> {
    let catalog = Arc::new(InMemoryCatalog::new());

    let (emitter, transport): (Arc<dyn LowStockEmitter>, &'static str) = match &config.redis_url {
        #[cfg(feature = "redis")]
        Some(url) => {
            let bus = RedisPubSubEventBus::new(url, config.low_stock_channel.clone())
                .map_err(|e| anyhow::anyhow!("low stock bus unavailable: {e}"))?;
            tracing::info!(channel = %config.low_stock_channel, "publishing low stock signals to redis");
            let emitter: Arc<dyn LowStockEmitter> = Arc::new(BusSignalEmitter::new(bus, catalog.clone()));
            (emitter, "redis")
        }
        #[cfg(not(feature = "redis"))]
        Some(_) => {
            tracing::warn!("LOW_STOCK_REDIS_URL set but built without the redis feature; using in-memory bus");
            (in_memory_emitter(catalog.clone()), "in_memory")
        }
        None => (in_memory_emitter(catalog.clone()), "in_memory"),
    };

    let engine = ReservationEngine::configured(InMemoryStockStore::new(), emitter, config);

    Ok(AppServices {
        engine: Arc::new(engine),
        catalog,
        transport,
    })
}

fn in_memory_emitter(catalog: Arc<InMemoryCatalog>) -> Arc<dyn LowStockEmitter> {
    let bus: Arc<SignalBus> = Arc::new(InMemoryEventBus::new());
    spawn_signal_logger(bus.subscribe());
    Arc::new(BusSignalEmitter::new(bus, catalog))
}

/// Stand-in consumer for the notification service when signals stay in-process.
fn spawn_signal_logger(subscription: Subscription<EventEnvelope<LowStockSignal>>) {
    thread::spawn(move || {
        while let Ok(envelope) = subscription.recv() {
            let signal = envelope.payload();
            tracing::info!(
                event_id = %envelope.event_id(),
                product_id = %signal.product_id,
                product_name = %signal.product_name,
                seller_id = ?signal.seller_id.map(|s| s.get()),
                current_stock = signal.current_stock,
                threshold = signal.threshold,
                "low stock notification dispatched"
            );
        }
    });
}
