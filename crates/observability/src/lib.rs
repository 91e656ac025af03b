//! Process-wide logging setup shared by the ledger binaries and tests.

/// Tracing subscriber configuration (filters, formatting).
pub mod tracing;

pub use crate::tracing::{LogFormat, init, init_for_tests, init_with};
