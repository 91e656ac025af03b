//! Stock record persistence boundary.
//!
//! Defines how committed stock records are stored and read back, without
//! making any storage assumptions. Mutual exclusion lives in `concurrency`.

pub mod in_memory;
pub mod r#trait;

pub use in_memory::InMemoryStockStore;
pub use r#trait::{StockStore, StoreError};
