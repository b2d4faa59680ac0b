//! Network layer subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming TCP connection
//!     → listener.rs (accept loop, stop/force signals)
//!     → connection.rs (in-flight tracking, drain wait)
//!     → hyper HTTP/1 connection → HandlerSet (axum Router)
//!
//! Listener lifecycle:
//!     serve → [request_stop → drain] → [force_close] → done
//! ```
//!
//! # Design Decisions
//! - The coordinator only sees the `Listener` trait, so it can be driven
//!   by a fake in tests
//! - Each connection is tracked so drain completion is observable

pub mod connection;
pub mod listener;

use std::net::SocketAddr;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use tokio::sync::oneshot;
use tokio::time::Instant;

pub use connection::{ConnectionGuard, ConnectionId, ConnectionTracker};
pub use listener::{HttpListener, ListenError};

/// The "serve requests" capability the lifecycle coordinator drives.
pub trait Listener: Send + Sync + 'static {
    /// Bind and run the accept loop.
    ///
    /// Sends the bound address on `ready` once connections are being
    /// accepted. Does not return while serving successfully; returns `Ok`
    /// only after a stop was requested.
    fn serve(
        self: Arc<Self>,
        ready: oneshot::Sender<SocketAddr>,
    ) -> BoxFuture<'static, Result<(), ListenError>>;

    /// Stop accepting and wait for in-flight requests until `deadline`.
    ///
    /// Fails with [`ListenError::DrainTimeout`] if requests are still
    /// outstanding at the deadline. Nothing is aborted in that case.
    fn request_stop(&self, deadline: Instant) -> BoxFuture<'_, Result<(), ListenError>>;

    /// Drop every open connection immediately.
    fn force_close(&self) -> BoxFuture<'_, Result<(), ListenError>>;
}
