//! Observability subsystem.
//!
//! # Design Decisions
//! - Structured logging through `tracing`; fields over formatted strings
//! - Log level from `RUST_LOG`, falling back to configuration
//! - Request IDs are attached by the HTTP layer (see `http::server`)

pub mod logging;
