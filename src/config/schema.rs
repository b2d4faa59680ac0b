//! Configuration schema definitions.
//!
//! All types derive Serde traits for deserialization from config files.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Root configuration for the service.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct ServiceConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// Request and shutdown timeouts.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "localhost:8001" or "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "localhost:8001".to_string(),
        }
    }
}

/// Timeout configuration, all values in milliseconds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Time allowed to read a request's headers.
    pub read_ms: u64,

    /// Time allowed for a handler to produce its response.
    pub write_ms: u64,

    /// How long in-flight requests may drain after a shutdown signal.
    pub grace_period_ms: u64,

    /// How long a forced close may take to release every connection.
    pub force_close_ms: u64,
}

impl TimeoutConfig {
    pub fn read_timeout(&self) -> Duration {
        Duration::from_millis(self.read_ms)
    }

    pub fn write_timeout(&self) -> Duration {
        Duration::from_millis(self.write_ms)
    }

    pub fn grace_period(&self) -> Duration {
        Duration::from_millis(self.grace_period_ms)
    }

    pub fn force_close_timeout(&self) -> Duration {
        Duration::from_millis(self.force_close_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            read_ms: 5_000,
            write_ms: 5_000,
            grace_period_ms: 5_000,
            force_close_ms: 1_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error), used when `RUST_LOG` is unset.
    pub log_level: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
        }
    }
}
