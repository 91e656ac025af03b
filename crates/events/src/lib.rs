//! Outbound events and the pub/sub mechanics used to deliver them.

pub mod bus;
pub mod envelope;
pub mod event;
pub mod in_memory_bus;
pub mod signal;

pub use bus::{EventBus, Subscription};
pub use envelope::EventEnvelope;
pub use event::Event;
pub use in_memory_bus::{InMemoryBusError, InMemoryEventBus};
pub use signal::{LOW_STOCK_EVENT_TYPE, LowStockSignal};
