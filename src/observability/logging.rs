//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the logging subsystem
//! - Log entry and exit of lifecycle phases on every exit path

use std::time::Instant;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global subscriber. Call once, early in `main`.
pub fn init(config: &ObservabilityConfig) {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

/// Logs `started` when created and `completed` when dropped.
#[must_use = "the phase completes when the guard is dropped"]
pub struct PhaseGuard {
    phase: &'static str,
    started: Instant,
}

impl PhaseGuard {
    pub fn enter(phase: &'static str) -> Self {
        tracing::info!(phase, "started");
        Self {
            phase,
            started: Instant::now(),
        }
    }
}

impl Drop for PhaseGuard {
    fn drop(&mut self) {
        tracing::info!(
            phase = self.phase,
            elapsed_ms = u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX),
            "completed"
        );
    }
}
