//! Infrastructure layer: storage, locking, signal transports, config, and the
//! reservation engine that ties them together.

pub mod catalog;
pub mod concurrency;
pub mod config;
pub mod event_bus;
pub mod reservation_engine;
pub mod signal;
pub mod store;


pub use catalog::{InMemoryCatalog, ProductCatalog, ProductContext};
pub use config::LedgerConfig;
pub use reservation_engine::ReservationEngine;
pub use signal::{BusSignalEmitter, LowStockEmitter, LowStockPolicy};
pub use store::{InMemoryStockStore, StockStore};
