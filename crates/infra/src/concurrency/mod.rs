//! Concurrency control for stock records.
//!
//! At most one mutator per product runs its read-modify-write at a time;
//! mutators of different products never wait on each other. Locks are
//! pessimistic (no optimistic retry), so a hot product serializes instead of
//! livelocking.

pub mod exclusive;
pub mod keyed_locks;

pub use exclusive::{ExclusiveAccess, StockTransition};
pub use keyed_locks::{KeyedLocks, LockWaitExpired};
