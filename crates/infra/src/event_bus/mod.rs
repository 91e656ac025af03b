//! Infrastructure event bus implementations.
//!
//! The bus abstraction and the in-process bus live in `stockledger-events`.
//! This module adds transports that leave the process (Redis).

#[cfg(feature = "redis")]
pub mod redis_pubsub;

#[cfg(feature = "redis")]
pub use redis_pubsub::{RedisBusError, RedisPubSubEventBus};
