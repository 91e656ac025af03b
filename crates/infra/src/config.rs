//! Configuration loading and representation.
//!
//! Everything comes from environment variables with dev-friendly defaults.
//! Unparsable values fall back to the default with a warning rather than
//! aborting startup.

use std::time::Duration;

use stockledger_inventory::DEFAULT_LOW_STOCK_THRESHOLD;

use crate::signal::LowStockPolicy;

pub const ENV_LOCK_TIMEOUT_MS: &str = "STOCK_LOCK_TIMEOUT_MS";
pub const ENV_LOW_STOCK_POLICY: &str = "LOW_STOCK_SIGNAL_POLICY";
pub const ENV_DEFAULT_THRESHOLD: &str = "DEFAULT_LOW_STOCK_THRESHOLD";
pub const ENV_REDIS_URL: &str = "LOW_STOCK_REDIS_URL";
pub const ENV_CHANNEL: &str = "LOW_STOCK_CHANNEL";
pub const ENV_BIND_ADDR: &str = "BIND_ADDR";

pub const DEFAULT_CHANNEL: &str = "stock.low_stock";
pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:8080";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerConfig {
    /// `None`: wait for a product's lock indefinitely.
    pub lock_timeout: Option<Duration>,
    pub low_stock_policy: LowStockPolicy,
    pub default_low_stock_threshold: u64,
    /// Redis pub/sub target for low-stock signals (requires the `redis` feature).
    pub redis_url: Option<String>,
    pub low_stock_channel: String,
    pub bind_addr: String,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            lock_timeout: None,
            low_stock_policy: LowStockPolicy::default(),
            default_low_stock_threshold: DEFAULT_LOW_STOCK_THRESHOLD,
            redis_url: None,
            low_stock_channel: DEFAULT_CHANNEL.to_string(),
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
        }
    }
}

impl LedgerConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a map).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let lock_timeout = get(ENV_LOCK_TIMEOUT_MS).and_then(|raw| match raw.trim().parse::<u64>() {
            Ok(0) => None,
            Ok(ms) => Some(Duration::from_millis(ms)),
            Err(e) => {
                tracing::warn!(key = ENV_LOCK_TIMEOUT_MS, value = %raw, error = %e, "ignoring invalid lock timeout");
                None
            }
        });

        let low_stock_policy = get(ENV_LOW_STOCK_POLICY)
            .map(|raw| {
                raw.parse::<LowStockPolicy>().unwrap_or_else(|e| {
                    tracing::warn!(key = ENV_LOW_STOCK_POLICY, error = %e, "using default low stock policy");
                    defaults.low_stock_policy
                })
            })
            .unwrap_or(defaults.low_stock_policy);

        let default_low_stock_threshold = get(ENV_DEFAULT_THRESHOLD)
            .and_then(|raw| match raw.trim().parse::<u64>() {
                Ok(v) if v >= 1 => Some(v),
                _ => {
                    tracing::warn!(key = ENV_DEFAULT_THRESHOLD, value = %raw, "threshold must be an integer >= 1; using default");
                    None
                }
            })
            .unwrap_or(defaults.default_low_stock_threshold);

        Self {
            lock_timeout,
            low_stock_policy,
            default_low_stock_threshold,
            redis_url: get(ENV_REDIS_URL),
            low_stock_channel: get(ENV_CHANNEL).unwrap_or(defaults.low_stock_channel),
            bind_addr: get(ENV_BIND_ADDR).unwrap_or(defaults.bind_addr),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config(pairs: &[(&str, &str)]) -> LedgerConfig {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        LedgerConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn empty_environment_gives_defaults() {
        assert_eq!(config(&[]), LedgerConfig::default());
    }

    #[test]
    fn values_are_read_from_environment() {
        let cfg = config(&[
            (ENV_LOCK_TIMEOUT_MS, "250"),
            (ENV_LOW_STOCK_POLICY, "while_low"),
            (ENV_DEFAULT_THRESHOLD, "3"),
            (ENV_REDIS_URL, "redis://localhost:6379"),
            (ENV_CHANNEL, "alerts"),
            (ENV_BIND_ADDR, "127.0.0.1:9000"),
        ]);

        assert_eq!(cfg.lock_timeout, Some(Duration::from_millis(250)));
        assert_eq!(cfg.low_stock_policy, LowStockPolicy::WhileLow);
        assert_eq!(cfg.default_low_stock_threshold, 3);
        assert_eq!(cfg.redis_url.as_deref(), Some("redis://localhost:6379"));
        assert_eq!(cfg.low_stock_channel, "alerts");
        assert_eq!(cfg.bind_addr, "127.0.0.1:9000");
    }

    #[test]
    fn invalid_values_fall_back_to_defaults() {
        let cfg = config(&[
            (ENV_LOCK_TIMEOUT_MS, "soon"),
            (ENV_LOW_STOCK_POLICY, "always"),
            (ENV_DEFAULT_THRESHOLD, "0"),
            (ENV_REDIS_URL, "  "),
        ]);

        assert_eq!(cfg.lock_timeout, None);
        assert_eq!(cfg.low_stock_policy, LowStockPolicy::OnCrossing);
        assert_eq!(cfg.default_low_stock_threshold, DEFAULT_LOW_STOCK_THRESHOLD);
        assert_eq!(cfg.redis_url, None);
    }

    #[test]
    fn zero_timeout_means_wait_forever() {
        assert_eq!(config(&[(ENV_LOCK_TIMEOUT_MS, "0")]).lock_timeout, None);
    }
}
