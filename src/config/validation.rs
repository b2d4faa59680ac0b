//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, address has a port)
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: ServiceConfig → Result<(), Vec<ValidationError>>

use crate::config::schema::ServiceConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("listener.bind_address must not be empty")]
    EmptyBindAddress,

    #[error("listener.bind_address '{0}' must be in host:port form")]
    MissingPort(String),

    #[error("timeouts.{0} must be greater than zero")]
    ZeroTimeout(&'static str),

    #[error("observability.log_level '{0}' is not a valid filter directive")]
    InvalidLogLevel(String),
}

/// Check a parsed configuration for values serde cannot reject on its own.
pub fn validate_config(config: &ServiceConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    let address = config.listener.bind_address.trim();
    if address.is_empty() {
        errors.push(ValidationError::EmptyBindAddress);
    } else if !has_port(address) {
        errors.push(ValidationError::MissingPort(address.to_string()));
    }

    let timeouts = &config.timeouts;
    for (name, value) in [
        ("read_ms", timeouts.read_ms),
        ("write_ms", timeouts.write_ms),
        ("grace_period_ms", timeouts.grace_period_ms),
        ("force_close_ms", timeouts.force_close_ms),
    ] {
        if value == 0 {
            errors.push(ValidationError::ZeroTimeout(name));
        }
    }

    let level = &config.observability.log_level;
    if tracing_subscriber::EnvFilter::try_new(level).is_err() {
        errors.push(ValidationError::InvalidLogLevel(level.clone()));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn has_port(address: &str) -> bool {
    address
        .rsplit_once(':')
        .map(|(host, port)| !host.is_empty() && port.parse::<u16>().is_ok())
        .unwrap_or(false)
}
