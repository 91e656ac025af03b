//! Redis pub/sub bus for low-stock signal envelopes (optional).
//!
//! Pub/sub is not durable: subscribers that are offline when a signal is
//! published never see it. That matches the signal's best-effort contract.
//!
//! `publish` is called under a product's lock, so it only serializes and
//! enqueues. A dedicated publisher thread owns the Redis connection, connects
//! with a deadline and drops signals (with a warning) while Redis is down.

use std::sync::mpsc::{self, Receiver, SyncSender, TrySendError};
use std::thread;
use std::time::Duration;

use redis::Commands;
use thiserror::Error;

use stockledger_events::{EventBus, EventEnvelope, LowStockSignal, Subscription};

/// Signals waiting for the publisher thread; beyond this, new ones are rejected.
pub const OUTBOX_CAPACITY: usize = 1024;
const CONNECT_TIMEOUT: Duration = Duration::from_millis(500);
const IO_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Error)]
pub enum RedisBusError {
    #[error("redis: {0}")]
    Redis(String),
    #[error("serialize: {0}")]
    Serialize(String),
    #[error("publisher backlog full ({0} pending)")]
    Backlog(usize),
    #[error("publisher thread stopped")]
    PublisherStopped,
}

/// Publishes JSON-encoded [`LowStockSignal`] envelopes on one channel.
#[derive(Debug, Clone)]
pub struct RedisPubSubEventBus {
    client: redis::Client,
    channel: String,
    outbox: SyncSender<String>,
}

impl RedisPubSubEventBus {
    pub fn new(redis_url: impl AsRef<str>, channel: impl Into<String>) -> Result<Self, RedisBusError> {
        let client = redis::Client::open(redis_url.as_ref())
            .map_err(|e| RedisBusError::Redis(e.to_string()))?;
        let channel = channel.into();

        let (outbox, pending) = mpsc::sync_channel(OUTBOX_CAPACITY);
        {
            let client = client.clone();
            let channel = channel.clone();
            thread::Builder::new()
                .name("low-stock-publisher".to_string())
                .spawn(move || run_publisher(client, channel, pending))
                .map_err(|e| RedisBusError::Redis(format!("spawn publisher: {e}")))?;
        }

        Ok(Self {
            client,
            channel,
            outbox,
        })
    }

    pub fn channel(&self) -> &str {
        &self.channel
    }
}

fn connect(client: &redis::Client) -> redis::RedisResult<redis::Connection> {
    let conn = client.get_connection_with_timeout(CONNECT_TIMEOUT)?;
    conn.set_write_timeout(Some(IO_TIMEOUT))?;
    conn.set_read_timeout(Some(IO_TIMEOUT))?;
    Ok(conn)
}

// Exits once every bus handle (and so every sender) is dropped.
fn run_publisher(client: redis::Client, channel: String, pending: Receiver<String>) {
    let mut conn: Option<redis::Connection> = None;

    for payload in pending {
        if conn.is_none() {
            match connect(&client) {
                Ok(c) => conn = Some(c),
                Err(e) => {
                    tracing::warn!(channel = %channel, error = %e, "redis unreachable; low stock signal dropped");
                    continue;
                }
            }
        }

        let Some(c) = conn.as_mut() else { continue };
        let sent: redis::RedisResult<i64> = c.publish(&channel, payload);
        match sent {
            Ok(receivers) => {
                tracing::debug!(channel = %channel, receivers, "low stock signal published");
            }
            Err(e) => {
                tracing::warn!(channel = %channel, error = %e, "redis publish failed; reconnecting on next signal");
                conn = None;
            }
        }
    }
}

impl EventBus<EventEnvelope<LowStockSignal>> for RedisPubSubEventBus {
    type Error = RedisBusError;

    fn publish(&self, message: EventEnvelope<LowStockSignal>) -> Result<(), Self::Error> {
        let payload = serde_json::to_string(&message)
            .map_err(|e| RedisBusError::Serialize(e.to_string()))?;

        self.outbox.try_send(payload).map_err(|e| match e {
            TrySendError::Full(_) => RedisBusError::Backlog(OUTBOX_CAPACITY),
            TrySendError::Disconnected(_) => RedisBusError::PublisherStopped,
        })
    }

    fn subscribe(&self) -> Subscription<EventEnvelope<LowStockSignal>> {
        let (tx, rx) = mpsc::channel();

        let client = self.client.clone();
        let channel = self.channel.clone();

        thread::spawn(move || {
            let mut conn = match client.get_connection_with_timeout(CONNECT_TIMEOUT) {
                Ok(c) => c,
                Err(e) => {
                    tracing::warn!(error = %e, "redis subscriber could not connect");
                    return;
                }
            };

            let mut pubsub = conn.as_pubsub();
            if let Err(e) = pubsub.subscribe(&channel) {
                tracing::warn!(channel = %channel, error = %e, "redis subscribe failed");
                return;
            }

            loop {
                let msg = match pubsub.get_message() {
                    Ok(m) => m,
                    Err(e) => {
                        tracing::warn!(error = %e, "redis subscription closed");
                        return;
                    }
                };

                let payload: String = match msg.get_payload() {
                    Ok(p) => p,
                    Err(_) => continue,
                };

                let envelope: EventEnvelope<LowStockSignal> = match serde_json::from_str(&payload) {
                    Ok(e) => e,
                    Err(e) => {
                        tracing::debug!(error = %e, "skipping malformed signal payload");
                        continue;
                    }
                };

                if tx.send(envelope).is_err() {
                    return;
                }
            }
        });

        Subscription::new(rx)
    }
}
