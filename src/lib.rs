//! Items API service library.
//!
//! An HTTP service whose lifecycle coordinator races listener failure
//! against operator signals and shuts down with a bounded drain.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod net;
pub mod observability;

pub use config::ServiceConfig;
pub use http::HandlerSet;
pub use lifecycle::{Coordinator, ShutdownReport, SignalWatcher};
pub use net::HttpListener;
