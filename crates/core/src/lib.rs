//! `stockledger-core`: shared building blocks for the inventory reservation ledger.
//!
//! This crate contains **pure** primitives (no infrastructure concerns).

pub mod error;
pub mod id;

pub use error::{LedgerError, LedgerResult};
pub use id::{ProductId, SellerId};
