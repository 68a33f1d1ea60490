//! Environment-driven configuration.
//!
//! | variable | default |
//! |---|---|
//! | `SHIPSYNC_EVENT_LOG_CAPACITY` | 100 |
//! | `SHIPSYNC_FEED_LIMIT` | 50 |
//! | `SHIPSYNC_LOW_STOCK_THRESHOLD` | 20 |
//! | `SHIPSYNC_REORDER_ENABLED` | false |
//! | `SHIPSYNC_DEFAULT_SUPPLIER` | Supplier A |

use core::str::FromStr;

use shipsync_events::DEFAULT_CAPACITY;
use shipsync_planner::EngineConfig;

pub const DEFAULT_FEED_LIMIT: usize = 50;

#[derive(Debug, Clone, PartialEq)]
pub struct CoreConfig {
    pub event_log_capacity: usize,
    /// `limit` used by `feed` when the caller passes none.
    pub feed_default_limit: usize,
    pub engine: EngineConfig,
}

impl Default for CoreConfig {
    fn default() -> Self {
        Self {
            event_log_capacity: DEFAULT_CAPACITY,
            feed_default_limit: DEFAULT_FEED_LIMIT,
            engine: EngineConfig::default(),
        }
    }
}

fn parsed_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        None => default,
        Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
            tracing::warn!(key, value = %raw, "unparsable config value; using default");
            default
        }),
    }
}

impl CoreConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key/value source (environment, test maps, ...).
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = CoreConfig::default();
        let mut engine = defaults.engine;

        engine.low_stock_threshold =
            parsed_or(&lookup, "SHIPSYNC_LOW_STOCK_THRESHOLD", engine.low_stock_threshold);
        engine.reorder_enabled = parsed_or(&lookup, "SHIPSYNC_REORDER_ENABLED", engine.reorder_enabled);
        if let Some(supplier) = lookup("SHIPSYNC_DEFAULT_SUPPLIER").filter(|s| !s.trim().is_empty()) {
            engine.default_supplier = supplier.trim().to_string();
        }

        Self {
            event_log_capacity: parsed_or(&lookup, "SHIPSYNC_EVENT_LOG_CAPACITY", defaults.event_log_capacity),
            feed_default_limit: parsed_or(&lookup, "SHIPSYNC_FEED_LIMIT", defaults.feed_default_limit),
            engine,
        }
    }
}
