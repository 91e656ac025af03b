//! Inventory domain module (stock ledger).
//!
//! This crate contains the per-product stock record and its transitions,
//! implemented purely as deterministic domain logic (no IO, no locking, no storage).

pub mod availability;
pub mod stock;

pub use availability::Availability;
pub use stock::{DEFAULT_LOW_STOCK_THRESHOLD, StockCommand, StockRecord};
